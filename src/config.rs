use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::rag::coverage::CoverageConfig;
use crate::pipeline::rag::language::PivotPair;
use crate::pipeline::safety::guardrails::GuardrailLimits;

/// Application-level constants
pub const APP_NAME: &str = "ContractRag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const CONFIG_FILE_NAME: &str = "pipeline.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "contract_rag=info,warn"
}

/// Default configuration file location under the user config directory.
/// `None` when the platform exposes no config directory.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("contract-rag").join(CONFIG_FILE_NAME))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Retrieval limits for one evidence set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalLimits {
    pub per_query_k: usize,
    pub max_total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskLimits {
    pub document: RetrievalLimits,
    /// Per-language k for mixed-language documents; the cap stays global.
    pub mixed_document_k: usize,
    pub reference: RetrievalLimits,
}

impl Default for AskLimits {
    fn default() -> Self {
        Self {
            document: RetrievalLimits {
                per_query_k: 12,
                max_total: 12,
            },
            mixed_document_k: 6,
            reference: RetrievalLimits {
                per_query_k: 10,
                max_total: 10,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLimits {
    pub document: RetrievalLimits,
    pub reference: RetrievalLimits,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            document: RetrievalLimits {
                per_query_k: 4,
                max_total: 18,
            },
            reference: RetrievalLimits {
                per_query_k: 2,
                max_total: 10,
            },
        }
    }
}

/// Tuning knobs for the evidence workflow. Every field has a default, so a
/// partial JSON file overrides only what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pivots: PivotPair,
    pub ask: AskLimits,
    pub summary: SummaryLimits,
    pub coverage: CoverageConfig,
    /// Additive score bonus for wanted-label items. Scores sit roughly in [0, 1].
    pub label_boost: f32,
    pub guardrails: GuardrailLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pivots: PivotPair::default(),
            ask: AskLimits::default(),
            summary: SummaryLimits::default(),
            coverage: CoverageConfig::default(),
            label_boost: 0.10,
            guardrails: GuardrailLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), "Pipeline configuration loaded");
        Ok(config)
    }

    /// Load from the default location, or defaults when no file exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pivots.primary == self.pivots.secondary {
            return Err(ConfigError::Invalid(
                "primary and secondary pivot languages must differ".into(),
            ));
        }

        let limits = [
            ("ask.document", self.ask.document),
            ("ask.reference", self.ask.reference),
            ("summary.document", self.summary.document),
            ("summary.reference", self.summary.reference),
            (
                "coverage",
                RetrievalLimits {
                    per_query_k: self.coverage.per_query_k,
                    max_total: self.coverage.max_total,
                },
            ),
        ];
        for (name, limit) in limits {
            if limit.per_query_k == 0 || limit.max_total == 0 {
                return Err(ConfigError::Invalid(format!("{name} limits must be positive")));
            }
        }
        if self.ask.mixed_document_k == 0 {
            return Err(ConfigError::Invalid("ask.mixed_document_k must be positive".into()));
        }

        if !self.label_boost.is_finite() || self.label_boost < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "label_boost must be a finite non-negative number, got {}",
                self.label_boost
            )));
        }

        if self.guardrails.max_question_chars == 0 || self.guardrails.max_topic_chars == 0 {
            return Err(ConfigError::Invalid("guardrail limits must be positive".into()));
        }

        Ok(())
    }
}
