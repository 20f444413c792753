//! Evidence workflow orchestrator for contract questions and summaries.
//!
//! Both workflows share one stage skeleton:
//! prepare → retrieve → [coverage] → assemble → generate → finalize.
//! Each stage reads what earlier stages wrote to the [`WorkflowState`] and
//! reports a [`StageEvent`]; the transition table decides what runs next.

use std::collections::BTreeSet;

use super::context::assemble_evidence;
use super::coverage::{needs_fallback, widened_retrieval};
use super::fanout::{topic_queries, QueryFanout};
use super::language::{detect_user_language, DocumentLanguage, Language};
use super::output::{clean_answer, parse_summary, retain_known_sources};
use super::prompt::{
    ask_system_prompt, build_ask_prompt, build_summary_prompt, summary_system_prompt,
};
use super::ranking::{apply_label_boost, merge_best_survivors};
use super::retrieval::gather;
use super::topics::wanted_labels;
use super::types::{
    AskRequest, CorpusScope, EvidenceBundle, EvidenceItem, EvidenceStore, LlmGenerate,
    RetrievalRequest, SummaryContent, SummaryMode, SummaryRequest, Translator,
};
use super::workflow::{
    FailureReason, StageEvent, StageName, WorkflowKind, WorkflowState, WorkflowStatus,
};
use super::RagError;
use crate::config::{PipelineConfig, RetrievalLimits};
use crate::pipeline::safety::redact::redact_items;

/// Result of a question-answering run.
#[derive(Debug)]
pub struct AskOutcome {
    pub language: Language,
    pub result: Result<String, FailureReason>,
    pub state: WorkflowState,
}

/// Result of a summary run.
#[derive(Debug)]
pub struct SummaryOutcome {
    pub language: Language,
    pub result: Result<SummaryContent, FailureReason>,
    pub state: WorkflowState,
}

/// Composition-root context: the three oracles plus tuning.
///
/// Holds no per-request state, so one pipeline serves any number of
/// sequential requests.
pub struct ContractRagPipeline<'a, S: EvidenceStore, T: Translator, G: LlmGenerate> {
    store: &'a S,
    translator: &'a T,
    generator: &'a G,
    config: &'a PipelineConfig,
}

impl<'a, S: EvidenceStore, T: Translator, G: LlmGenerate> ContractRagPipeline<'a, S, T, G> {
    pub fn new(store: &'a S, translator: &'a T, generator: &'a G, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            translator,
            generator,
            config,
        }
    }

    /// Answer a question from the contract (when given) and the labor law.
    ///
    /// `Err` only for internal invariant breaches; every expected failure is
    /// a [`FailureReason`] in the outcome.
    pub fn run_ask(&self, request: &AskRequest) -> Result<AskOutcome, RagError> {
        let mut state = WorkflowState::new(WorkflowKind::Ask);
        tracing::info!(
            request_id = %state.request_id,
            has_document = request.document_id.is_some(),
            "Ask workflow started"
        );

        self.drive(&mut state, |stage, state| match stage {
            StageName::Prepare => self.ask_prepare(request, state),
            StageName::Retrieve => self.ask_retrieve(request, state),
            StageName::Assemble => self.assemble(state),
            StageName::Generate => self.ask_generate(request, state),
            StageName::Finalize => Ok(StageEvent::Advanced),
            StageName::Coverage => Ok(StageEvent::Advanced),
        })?;

        let language = state
            .data
            .user_language
            .unwrap_or_else(|| detect_user_language(&request.question));
        let result = match state.failure() {
            Some(reason) => Err(reason),
            None => Ok(state.require(&state.data.answer, "answer")?.clone()),
        };

        Ok(AskOutcome {
            language,
            result,
            state,
        })
    }

    /// Produce a structured summary of a contract.
    pub fn run_summary(&self, request: &SummaryRequest) -> Result<SummaryOutcome, RagError> {
        let mut state = WorkflowState::new(WorkflowKind::Summary);
        tracing::info!(
            request_id = %state.request_id,
            document_id = %request.document_id,
            mode = request.mode.as_str(),
            "Summary workflow started"
        );

        self.drive(&mut state, |stage, state| match stage {
            StageName::Prepare => self.summary_prepare(request, state),
            StageName::Retrieve => self.summary_retrieve(request, state),
            StageName::Coverage => self.summary_coverage(request, state),
            StageName::Assemble => self.assemble(state),
            StageName::Generate => self.summary_generate(request, state),
            StageName::Finalize => Ok(StageEvent::Advanced),
        })?;

        let language = state
            .data
            .user_language
            .unwrap_or_else(|| Language::safe(request.language.as_deref()));
        let result = match state.failure() {
            Some(reason) => Err(reason),
            None => Ok(state.require(&state.data.summary, "summary")?.clone()),
        };

        Ok(SummaryOutcome {
            language,
            result,
            state,
        })
    }

    /// Run stages until the workflow is done or failed.
    ///
    /// Oracle errors become `ORACLE_UNAVAILABLE`; workflow invariant breaches
    /// propagate.
    fn drive(
        &self,
        state: &mut WorkflowState,
        mut run_stage: impl FnMut(StageName, &mut WorkflowState) -> Result<StageEvent, RagError>,
    ) -> Result<(), RagError> {
        while let WorkflowStatus::Running(stage) = state.status() {
            let event = match run_stage(stage, state) {
                Ok(event) => event,
                Err(RagError::Workflow(e)) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(
                        request_id = %state.request_id,
                        stage = ?stage,
                        error = %e,
                        "Oracle call failed"
                    );
                    StageEvent::Halted(FailureReason::OracleUnavailable)
                }
            };
            state.advance(event)?;
        }

        match state.status() {
            WorkflowStatus::Failed { at, reason } => tracing::info!(
                request_id = %state.request_id,
                stage = ?at,
                reason = %reason,
                "Workflow halted"
            ),
            _ => tracing::info!(request_id = %state.request_id, "Workflow completed"),
        }
        Ok(())
    }

    // ═══════════════════════════════════════════
    // Ask stages
    // ═══════════════════════════════════════════

    fn ask_prepare(&self, request: &AskRequest, state: &mut WorkflowState) -> Result<StageEvent, RagError> {
        let pivots = &self.config.pivots;
        let user_language = request
            .language
            .unwrap_or_else(|| detect_user_language(&request.question));
        state.data.user_language = Some(user_language);

        let (document_language, pivot, languages) = match &request.document_id {
            Some(document_id) => {
                let document_language = self
                    .store
                    .document_language(document_id)?
                    .unwrap_or(DocumentLanguage::Single(pivots.primary));
                (
                    Some(document_language),
                    pivots.resolve(document_language, user_language),
                    pivots.retrieval_languages(document_language, user_language),
                )
            }
            None => (None, pivots.primary, vec![pivots.primary]),
        };

        tracing::debug!(
            request_id = %state.request_id,
            user_language = %user_language,
            pivot = %pivot,
            "Pivot resolved"
        );

        state.data.document_language = document_language;
        state.data.pivot = Some(pivot);
        state.data.retrieval_languages = Some(languages);
        Ok(StageEvent::Advanced)
    }

    fn ask_retrieve(&self, request: &AskRequest, state: &mut WorkflowState) -> Result<StageEvent, RagError> {
        let user_language = *state.require(&state.data.user_language, "user_language")?;
        let pivot = *state.require(&state.data.pivot, "pivot")?;
        let languages = state
            .require(&state.data.retrieval_languages, "retrieval_languages")?
            .clone();

        let mut fanout = QueryFanout::new(&request.question, user_language);

        let Some(document_id) = &request.document_id else {
            return self.general_retrieve(&mut fanout, state);
        };

        let variants = fanout.variants_for(self.translator, &languages)?;
        let limits = &self.config.ask;

        // Mixed documents: one query per language under the global cap.
        let per_query_k = if variants.len() > 1 {
            limits.mixed_document_k
        } else {
            limits.document.per_query_k
        };
        let document_evidence = gather(
            self.store,
            &RetrievalRequest {
                scope: CorpusScope::Document {
                    document_id: document_id.clone(),
                },
                queries: variants.iter().map(|v| v.text.clone()).collect(),
                per_query_k,
                max_total: limits.document.max_total,
                label_filter: None,
            },
        )?;

        let mut law_lists = Vec::with_capacity(variants.len());
        for variant in &variants {
            law_lists.push(self.gather_reference(
                variant.language,
                vec![variant.text.clone()],
                limits.reference,
            )?);
        }
        let reference_evidence = merge_best_survivors(law_lists, limits.reference.max_total);

        let normalized = fanout.variant(self.translator, pivot)?.text;

        tracing::info!(
            request_id = %state.request_id,
            contract_hits = document_evidence.len(),
            law_hits = reference_evidence.len(),
            languages = variants.len(),
            "Ask evidence retrieved"
        );

        state.data.queries = Some(variants.into_iter().map(|v| v.text).collect());
        state.data.normalized_question = Some(normalized);
        state.data.document_evidence = Some(document_evidence);
        state.data.reference_evidence = Some(reference_evidence);
        Ok(StageEvent::Advanced)
    }

    /// Law-only retrieval: primary pivot first, then one retry in the
    /// secondary pivot when the primary finds nothing.
    fn general_retrieve(
        &self,
        fanout: &mut QueryFanout<'_>,
        state: &mut WorkflowState,
    ) -> Result<StageEvent, RagError> {
        let pivots = self.config.pivots;
        let limits = self.config.ask.reference;

        let mut variant = fanout.variant(self.translator, pivots.primary)?;
        let mut hits = self.gather_reference(pivots.primary, vec![variant.text.clone()], limits)?;

        if hits.is_empty() {
            tracing::debug!(
                request_id = %state.request_id,
                fallback = %pivots.secondary,
                "No law evidence in primary pivot"
            );
            variant = fanout.variant(self.translator, pivots.secondary)?;
            hits = self.gather_reference(pivots.secondary, vec![variant.text.clone()], limits)?;
            state.data.secondary_pivot_used = true;
        }

        tracing::info!(
            request_id = %state.request_id,
            law_hits = hits.len(),
            language = %variant.language,
            "General evidence retrieved"
        );

        state.data.queries = Some(vec![variant.text.clone()]);
        state.data.normalized_question = Some(variant.text);
        state.data.document_evidence = Some(Vec::new());
        state.data.reference_evidence = Some(hits);
        Ok(StageEvent::Advanced)
    }

    fn ask_generate(&self, request: &AskRequest, state: &mut WorkflowState) -> Result<StageEvent, RagError> {
        let user_language = *state.require(&state.data.user_language, "user_language")?;
        let bundle = state.require(&state.data.bundle, "bundle")?;
        let block = state.require(&state.data.evidence_block, "evidence_block")?;
        let normalized = state.require(&state.data.normalized_question, "normalized_question")?;

        let system = ask_system_prompt(
            user_language,
            !bundle.law.is_empty(),
            request.document_id.is_none(),
        );
        let prompt = build_ask_prompt(normalized, block);

        let raw = self.generator.generate(&system, &prompt)?;
        let answer = clean_answer(&raw);
        state.data.raw_output = Some(raw);

        match answer {
            Some(answer) => {
                state.data.answer = Some(answer);
                Ok(StageEvent::Advanced)
            }
            None => {
                tracing::warn!(request_id = %state.request_id, "Generated answer empty after cleanup");
                Ok(StageEvent::Halted(FailureReason::BadOutput))
            }
        }
    }

    // ═══════════════════════════════════════════
    // Summary stages
    // ═══════════════════════════════════════════

    fn summary_prepare(
        &self,
        request: &SummaryRequest,
        state: &mut WorkflowState,
    ) -> Result<StageEvent, RagError> {
        let user_language = Language::safe(request.language.as_deref());
        state.data.user_language = Some(user_language);

        let topics = match request.mode {
            SummaryMode::Focused => request.topics.clone().unwrap_or_default(),
            SummaryMode::Full => Vec::new(),
        };
        // Checked before any oracle call.
        if request.mode == SummaryMode::Focused && topics.is_empty() {
            return Ok(StageEvent::Halted(FailureReason::NoTopics));
        }

        let pivots = &self.config.pivots;
        let document_language = self
            .store
            .document_language(&request.document_id)?
            .unwrap_or(DocumentLanguage::Single(pivots.primary));

        let wanted = match request.mode {
            SummaryMode::Focused => wanted_labels(&topics),
            SummaryMode::Full => BTreeSet::new(),
        };

        state.data.document_language = Some(document_language);
        state.data.pivot = Some(pivots.resolve(document_language, user_language));
        state.data.retrieval_languages =
            Some(pivots.retrieval_languages(document_language, user_language));
        state.data.queries = Some(topic_queries(request.mode, &topics));
        state.data.wanted_labels = Some(wanted);
        state.data.topics = Some(topics);
        Ok(StageEvent::Advanced)
    }

    fn summary_retrieve(
        &self,
        request: &SummaryRequest,
        state: &mut WorkflowState,
    ) -> Result<StageEvent, RagError> {
        let queries = state.require(&state.data.queries, "queries")?.clone();
        let wanted = state.require(&state.data.wanted_labels, "wanted_labels")?.clone();
        let languages = state
            .require(&state.data.retrieval_languages, "retrieval_languages")?
            .clone();
        let limits = &self.config.summary;

        let label_filter = (!wanted.is_empty()).then_some(wanted);
        let retrieval = RetrievalRequest {
            scope: CorpusScope::Document {
                document_id: request.document_id.clone(),
            },
            queries: queries.clone(),
            per_query_k: limits.document.per_query_k,
            max_total: limits.document.max_total,
            label_filter,
        };
        let mut document_evidence = gather(self.store, &retrieval)?;

        let boosted = match &retrieval.label_filter {
            Some(wanted) => apply_label_boost(&mut document_evidence, wanted, self.config.label_boost),
            None => 0,
        };

        let mut law_lists = Vec::with_capacity(languages.len());
        for language in &languages {
            law_lists.push(self.gather_reference(*language, queries.clone(), limits.reference)?);
        }
        let reference_evidence = merge_best_survivors(law_lists, limits.reference.max_total);

        tracing::info!(
            request_id = %state.request_id,
            contract_hits = document_evidence.len(),
            boosted,
            law_hits = reference_evidence.len(),
            "Summary evidence retrieved"
        );

        state.data.first_pass_document_count = Some(document_evidence.len());
        state.data.document_evidence = Some(document_evidence);
        state.data.reference_evidence = Some(reference_evidence);
        Ok(StageEvent::Advanced)
    }

    fn summary_coverage(
        &self,
        request: &SummaryRequest,
        state: &mut WorkflowState,
    ) -> Result<StageEvent, RagError> {
        let first_pass = *state.require(&state.data.first_pass_document_count, "first_pass_document_count")?;
        if !needs_fallback(request.mode, first_pass, &self.config.coverage) {
            return Ok(StageEvent::Advanced);
        }

        let queries = state.require(&state.data.queries, "queries")?.clone();
        let widened = widened_retrieval(
            self.store,
            &request.document_id,
            &queries,
            &self.config.coverage,
        )?;

        tracing::info!(
            request_id = %state.request_id,
            first_pass,
            widened = widened.len(),
            "Coverage fallback retrieval"
        );

        state.data.fallback_document_evidence = Some(widened);
        state.data.coverage_fallback_used = true;
        Ok(StageEvent::Advanced)
    }

    fn summary_generate(
        &self,
        request: &SummaryRequest,
        state: &mut WorkflowState,
    ) -> Result<StageEvent, RagError> {
        let user_language = *state.require(&state.data.user_language, "user_language")?;
        let topics = state.require(&state.data.topics, "topics")?;
        let block = state.require(&state.data.evidence_block, "evidence_block")?;

        let system = summary_system_prompt(request.mode, user_language);
        let prompt = build_summary_prompt(request.mode, topics, block);

        let raw = self.generator.generate(&system, &prompt)?;
        let parsed = parse_summary(&raw, request.mode, user_language.code());
        state.data.raw_output = Some(raw);

        match parsed {
            Ok(mut content) => {
                let bundle = state.require(&state.data.bundle, "bundle")?;
                retain_known_sources(&mut content, bundle);
                state.data.summary = Some(content);
                Ok(StageEvent::Advanced)
            }
            Err(e) => {
                tracing::warn!(request_id = %state.request_id, error = %e, "Summary output unparsable");
                Ok(StageEvent::Halted(FailureReason::BadOutput))
            }
        }
    }

    // ═══════════════════════════════════════════
    // Shared stages
    // ═══════════════════════════════════════════

    /// Redact both evidence sets, then format them. Halts when nothing
    /// survives.
    fn assemble(&self, state: &mut WorkflowState) -> Result<StageEvent, RagError> {
        let contract = match &state.data.fallback_document_evidence {
            Some(widened) => widened.clone(),
            None => state.require(&state.data.document_evidence, "document_evidence")?.clone(),
        };
        let law = state.require(&state.data.reference_evidence, "reference_evidence")?.clone();

        let (contract, mut stats) = redact_items(contract);
        let (law, law_stats) = redact_items(law);
        stats.merge(&law_stats);

        if stats.total() > 0 {
            tracing::info!(
                request_id = %state.request_id,
                redacted = stats.total(),
                "Sensitive entities redacted from evidence"
            );
        }
        state.data.redaction = Some(stats);

        let bundle = EvidenceBundle { contract, law };
        if bundle.is_empty() {
            return Ok(StageEvent::Halted(FailureReason::NoEvidence));
        }

        let assembled = assemble_evidence(&bundle);
        tracing::debug!(
            request_id = %state.request_id,
            contract_items = assembled.contract_items,
            law_items = assembled.law_items,
            "Evidence assembled"
        );
        state.data.evidence_block = Some(assembled.text);
        state.data.bundle = Some(bundle);
        Ok(StageEvent::Advanced)
    }

    fn gather_reference(
        &self,
        language: Language,
        queries: Vec<String>,
        limits: RetrievalLimits,
    ) -> Result<Vec<EvidenceItem>, RagError> {
        gather(
            self.store,
            &RetrievalRequest {
                scope: CorpusScope::Reference { language },
                queries,
                per_query_k: limits.per_query_k,
                max_total: limits.max_total,
                label_filter: None,
            },
        )
    }
}
