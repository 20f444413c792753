//! Workflow state machine and the per-request state record.
//!
//! Stages advance through an explicit transition table; a halted stage
//! lands in a terminal failed state carrying a closed-set reason. The state
//! record only accumulates: each stage fills the fields it owns and an
//! audit trail entry is appended for every stage that ran.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::language::{DocumentLanguage, Language};
use super::types::{EvidenceBundle, EvidenceItem, SummaryContent};
use crate::pipeline::safety::redact::RedactionStats;

// ═══════════════════════════════════════════
// States, events and reasons
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Prepare,
    Retrieve,
    Coverage,
    Assemble,
    Generate,
    Finalize,
}

/// Machine-readable terminal failure. The boundary maps it to user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    NoTopics,
    NoEvidence,
    BadOutput,
    OracleUnavailable,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::NoTopics => "NO_TOPICS",
            FailureReason::NoEvidence => "NO_EVIDENCE",
            FailureReason::BadOutput => "BAD_OUTPUT",
            FailureReason::OracleUnavailable => "ORACLE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Ask,
    Summary,
}

impl WorkflowKind {
    /// Stage order. Question answering has a single retrieval pass.
    pub fn stages(self) -> &'static [StageName] {
        match self {
            WorkflowKind::Ask => &[
                StageName::Prepare,
                StageName::Retrieve,
                StageName::Assemble,
                StageName::Generate,
                StageName::Finalize,
            ],
            WorkflowKind::Summary => &[
                StageName::Prepare,
                StageName::Retrieve,
                StageName::Coverage,
                StageName::Assemble,
                StageName::Generate,
                StageName::Finalize,
            ],
        }
    }
}

/// What a stage reports when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageEvent {
    Advanced,
    Halted(FailureReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running(StageName),
    Done,
    Failed { at: StageName, reason: FailureReason },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Illegal transition in {kind:?} workflow: {stage:?} on {event:?}")]
    IllegalTransition {
        kind: WorkflowKind,
        stage: StageName,
        event: StageEvent,
    },

    #[error("Stage {stage:?} read `{field}` before any stage set it")]
    MissingField {
        stage: StageName,
        field: &'static str,
    },

    #[error("Workflow already finished")]
    Finished,
}

/// Transition table: (kind, stage, event) -> next status.
///
/// Halting is legal only where the reason can arise: missing topics at
/// prepare (summary only), empty evidence at assemble, unusable output at
/// generate, and oracle failures at any stage that calls an oracle.
pub fn transition(
    kind: WorkflowKind,
    stage: StageName,
    event: StageEvent,
) -> Result<WorkflowStatus, WorkflowError> {
    let stages = kind.stages();
    let illegal = WorkflowError::IllegalTransition { kind, stage, event };

    let Some(position) = stages.iter().position(|s| *s == stage) else {
        return Err(illegal);
    };

    match event {
        StageEvent::Advanced => Ok(match stages.get(position + 1) {
            Some(next) => WorkflowStatus::Running(*next),
            None => WorkflowStatus::Done,
        }),
        StageEvent::Halted(reason) => {
            let allowed = match reason {
                FailureReason::NoTopics => {
                    kind == WorkflowKind::Summary && stage == StageName::Prepare
                }
                FailureReason::NoEvidence => stage == StageName::Assemble,
                FailureReason::BadOutput => stage == StageName::Generate,
                FailureReason::OracleUnavailable => matches!(
                    stage,
                    StageName::Prepare
                        | StageName::Retrieve
                        | StageName::Coverage
                        | StageName::Generate
                ),
            };
            if allowed {
                Ok(WorkflowStatus::Failed { at: stage, reason })
            } else {
                Err(illegal)
            }
        }
    }
}

// ═══════════════════════════════════════════
// State record
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageName,
    pub outcome: StageEvent,
    pub at: DateTime<Utc>,
}

/// Fields written by stages. `None` means no stage has set it yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageData {
    pub user_language: Option<Language>,
    pub document_language: Option<DocumentLanguage>,
    pub pivot: Option<Language>,
    pub retrieval_languages: Option<Vec<Language>>,
    pub topics: Option<Vec<String>>,
    pub queries: Option<Vec<String>>,
    pub wanted_labels: Option<BTreeSet<String>>,
    pub normalized_question: Option<String>,
    pub secondary_pivot_used: bool,
    pub document_evidence: Option<Vec<EvidenceItem>>,
    pub reference_evidence: Option<Vec<EvidenceItem>>,
    pub first_pass_document_count: Option<usize>,
    /// Widened document set from the coverage retry. Takes precedence over
    /// `document_evidence`, which keeps the first pass.
    pub fallback_document_evidence: Option<Vec<EvidenceItem>>,
    pub coverage_fallback_used: bool,
    pub redaction: Option<RedactionStats>,
    pub bundle: Option<EvidenceBundle>,
    pub evidence_block: Option<String>,
    pub raw_output: Option<String>,
    pub answer: Option<String>,
    pub summary: Option<SummaryContent>,
}

/// Per-request workflow record.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub request_id: Uuid,
    pub kind: WorkflowKind,
    pub data: StageData,
    status: WorkflowStatus,
    trail: Vec<StageRecord>,
}

impl WorkflowState {
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            kind,
            data: StageData::default(),
            status: WorkflowStatus::Running(StageName::Prepare),
            trail: Vec::new(),
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn trail(&self) -> &[StageRecord] {
        &self.trail
    }

    pub fn failure(&self) -> Option<FailureReason> {
        match self.status {
            WorkflowStatus::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Stage currently running, or the last one that ran.
    pub fn current_stage(&self) -> StageName {
        match self.status {
            WorkflowStatus::Running(stage) => stage,
            WorkflowStatus::Failed { at, .. } => at,
            WorkflowStatus::Done => StageName::Finalize,
        }
    }

    /// Read a field an earlier stage must have set.
    pub fn require<'v, T>(
        &self,
        value: &'v Option<T>,
        field: &'static str,
    ) -> Result<&'v T, WorkflowError> {
        value.as_ref().ok_or(WorkflowError::MissingField {
            stage: self.current_stage(),
            field,
        })
    }

    /// Record the running stage's outcome and move to the next status.
    pub fn advance(&mut self, event: StageEvent) -> Result<WorkflowStatus, WorkflowError> {
        let WorkflowStatus::Running(stage) = self.status else {
            return Err(WorkflowError::Finished);
        };
        let next = transition(self.kind, stage, event)?;

        self.trail.push(StageRecord {
            stage,
            outcome: event,
            at: Utc::now(),
        });
        self.status = next;

        tracing::debug!(
            request_id = %self.request_id,
            stage = ?stage,
            outcome = ?event,
            "Workflow stage finished"
        );
        Ok(next)
    }
}
