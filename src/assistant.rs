//! Caller-facing boundary: guardrails in, localized replies out.
//!
//! The workflow only ever reports reason codes. This layer rejects bad
//! input before any oracle runs and turns every failure reason into text
//! in the user's language, so raw oracle errors never reach the caller.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::messages::{failure_message, Surface};
use crate::pipeline::rag::language::Language;
use crate::pipeline::rag::orchestrator::ContractRagPipeline;
use crate::pipeline::rag::types::{
    AskRequest, EvidenceStore, LlmGenerate, SummaryContent, SummaryMode, SummaryRequest,
    Translator,
};
use crate::pipeline::rag::workflow::FailureReason;
use crate::pipeline::rag::RagError;
use crate::pipeline::safety::guardrails::{
    sanitize_question, validate_question, validate_topics, GuardrailError,
};

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Request rejected: {0}")]
    Rejected(#[from] GuardrailError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] RagError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AskReply {
    pub request_id: Uuid,
    pub answer: String,
    pub language: Language,
    /// Set when `answer` is a localized failure message.
    pub reason: Option<FailureReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SummaryBody {
    Content(SummaryContent),
    Message { reason: FailureReason, text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReply {
    pub request_id: Uuid,
    pub document_id: String,
    pub summary: SummaryBody,
    pub language: Language,
}

pub struct ContractAssistant<'a, S: EvidenceStore, T: Translator, G: LlmGenerate> {
    pipeline: ContractRagPipeline<'a, S, T, G>,
    config: &'a PipelineConfig,
}

impl<'a, S: EvidenceStore, T: Translator, G: LlmGenerate> ContractAssistant<'a, S, T, G> {
    pub fn new(store: &'a S, translator: &'a T, generator: &'a G, config: &'a PipelineConfig) -> Self {
        Self {
            pipeline: ContractRagPipeline::new(store, translator, generator, config),
            config,
        }
    }

    pub fn ask(&self, request: &AskRequest) -> Result<AskReply, AssistantError> {
        let sanitized = sanitize_question(&request.question);
        if sanitized.was_modified() {
            tracing::debug!(modifications = ?sanitized.modifications, "Question sanitized");
        }
        validate_question(&sanitized.text, &self.config.guardrails)?;

        let request = AskRequest {
            question: sanitized.text,
            ..request.clone()
        };
        let outcome = self.pipeline.run_ask(&request)?;

        let surface = if request.document_id.is_some() {
            Surface::ContractAsk
        } else {
            Surface::GeneralAsk
        };
        let (answer, reason) = match outcome.result {
            Ok(answer) => (answer, None),
            Err(reason) => (
                failure_message(reason, surface, outcome.language).to_string(),
                Some(reason),
            ),
        };

        Ok(AskReply {
            request_id: outcome.state.request_id,
            answer,
            language: outcome.language,
            reason,
        })
    }

    pub fn summarize(&self, request: &SummaryRequest) -> Result<SummaryReply, AssistantError> {
        if request.mode == SummaryMode::Focused {
            if let Some(topics) = &request.topics {
                validate_topics(topics, &self.config.guardrails)?;
            }
        }

        let outcome = self.pipeline.run_summary(request)?;
        let summary = match outcome.result {
            Ok(content) => SummaryBody::Content(content),
            Err(reason) => SummaryBody::Message {
                reason,
                text: failure_message(reason, Surface::Summary, outcome.language).to_string(),
            },
        };

        Ok(SummaryReply {
            request_id: outcome.state.request_id,
            document_id: request.document_id.clone(),
            summary,
            language: outcome.language,
        })
    }
}
