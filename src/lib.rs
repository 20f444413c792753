pub mod assistant;
pub mod config;
pub mod messages;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use assistant::{AskReply, AssistantError, ContractAssistant, SummaryBody, SummaryReply};
pub use config::PipelineConfig;
pub use pipeline::rag::orchestrator::ContractRagPipeline;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default
/// filter. Later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}
