//! Query fan-out: per-language query variants for retrieval.

use super::language::Language;
use super::topics::{seed_query, DEFAULT_TOPIC_QUERIES};
use super::types::{SummaryMode, Translator};
use super::RagError;

/// A query text in one retrieval language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    pub language: Language,
    pub text: String,
}

/// Translate only when source and target differ.
///
/// The identity case returns the input byte-for-byte without calling the
/// translator.
pub fn translate_if_needed(
    translator: &dyn Translator,
    text: &str,
    source: Language,
    target: Language,
) -> Result<String, RagError> {
    if source == target || text.is_empty() {
        return Ok(text.to_string());
    }
    translator.translate(text, source, target)
}

/// Per-request memo of question variants, so each target language is
/// translated at most once.
pub struct QueryFanout<'a> {
    question: &'a str,
    user_language: Language,
    variants: Vec<QueryVariant>,
}

impl<'a> QueryFanout<'a> {
    pub fn new(question: &'a str, user_language: Language) -> Self {
        Self {
            question,
            user_language,
            variants: Vec::new(),
        }
    }

    /// The question in `target`, translating on first use.
    pub fn variant(
        &mut self,
        translator: &dyn Translator,
        target: Language,
    ) -> Result<QueryVariant, RagError> {
        if let Some(existing) = self.variants.iter().find(|v| v.language == target) {
            return Ok(existing.clone());
        }

        let text = translate_if_needed(translator, self.question, self.user_language, target)?;
        if self.user_language != target {
            tracing::debug!(
                from = %self.user_language,
                to = %target,
                "Translated question for retrieval"
            );
        }

        let variant = QueryVariant {
            language: target,
            text,
        };
        self.variants.push(variant.clone());
        Ok(variant)
    }

    /// Variants for every language in `targets`, in the given order.
    pub fn variants_for(
        &mut self,
        translator: &dyn Translator,
        targets: &[Language],
    ) -> Result<Vec<QueryVariant>, RagError> {
        targets
            .iter()
            .map(|lang| self.variant(translator, *lang))
            .collect()
    }
}

/// Fixed bilingual seed queries for a summary request. No translation.
pub fn topic_queries(mode: SummaryMode, topics: &[String]) -> Vec<String> {
    match mode {
        SummaryMode::Focused => topics.iter().map(|t| seed_query(t)).collect(),
        SummaryMode::Full => DEFAULT_TOPIC_QUERIES.iter().map(|q| q.to_string()).collect(),
    }
}
