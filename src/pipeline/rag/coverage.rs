//! Single-shot widened retry for thin focused summaries.

use serde::{Deserialize, Serialize};

use super::retrieval::gather;
use super::types::{CorpusScope, EvidenceItem, EvidenceStore, RetrievalRequest, SummaryMode};
use super::RagError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Fewer surviving document items than this triggers the fallback.
    pub min_document_items: usize,
    pub per_query_k: usize,
    pub max_total: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            min_document_items: 3,
            per_query_k: 6,
            max_total: 22,
        }
    }
}

/// Whether the widened retry should run. Full mode already retrieves broadly.
pub fn needs_fallback(mode: SummaryMode, document_items: usize, config: &CoverageConfig) -> bool {
    mode == SummaryMode::Focused && document_items < config.min_document_items
}

/// Re-run document retrieval with wider limits and no boosting.
///
/// The result replaces the first-pass set wholesale.
pub fn widened_retrieval(
    store: &dyn EvidenceStore,
    document_id: &str,
    queries: &[String],
    config: &CoverageConfig,
) -> Result<Vec<EvidenceItem>, RagError> {
    let request = RetrievalRequest {
        scope: CorpusScope::Document {
            document_id: document_id.to_string(),
        },
        queries: queries.to_vec(),
        per_query_k: config.per_query_k,
        max_total: config.max_total,
        label_filter: None,
    };
    gather(store, &request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_for_thin_focused_results() {
        let config = CoverageConfig::default();
        assert!(needs_fallback(SummaryMode::Focused, 0, &config));
        assert!(needs_fallback(SummaryMode::Focused, 2, &config));
        assert!(!needs_fallback(SummaryMode::Focused, 3, &config));
        assert!(!needs_fallback(SummaryMode::Full, 0, &config));
    }
}
