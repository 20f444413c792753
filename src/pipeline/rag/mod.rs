pub mod types;
pub mod language;
pub mod topics;
pub mod fanout;
pub mod retrieval;
pub mod ranking;
pub mod coverage;
pub mod context;
pub mod prompt;
pub mod output;
pub mod workflow;
pub mod orchestrator;
pub mod ollama;

#[cfg(test)]
pub(crate) mod fakes;

use thiserror::Error;

use workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Oracle connection failed: {0}")]
    OracleConnection(String),

    #[error("Oracle returned an error (status {status}): {body}")]
    OracleStatus { status: u16, body: String },

    #[error("Evidence search failed: {0}")]
    EvidenceSearch(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Reference corpus could not be loaded: {0}")]
    ReferenceCorpus(String),

    #[error("Workflow invariant violated: {0}")]
    Workflow(#[from] WorkflowError),
}
