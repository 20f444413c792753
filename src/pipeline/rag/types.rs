use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::language::{DocumentLanguage, Language};
use super::RagError;

/// Which corpus an evidence item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A segment of the uploaded contract.
    Contract,
    /// An article of the reference labor law.
    Law,
}

/// One retrieved unit of evidence.
///
/// Created fresh per retrieval call. Only the ranker (score boost) and the
/// redactor (text rewrite) mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_kind: SourceKind,
    /// Clause id (`A015`) or article reference (`Article 53`). Never redacted.
    pub identifier: String,
    pub text: String,
    pub language: Language,
    /// Opaque similarity; comparable only within one retrieval call.
    pub score: f32,
    pub origin_query: String,
    pub boosted: bool,
    /// Advisory classifier label (contract segments only).
    pub label: Option<String>,
    /// Article title (law items only).
    pub title: Option<String>,
}

/// A caller's retrieval request for one logical evidence set.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    pub scope: CorpusScope,
    pub queries: Vec<String>,
    pub per_query_k: usize,
    pub max_total: usize,
    /// Boost-only: wanted labels never filter.
    pub label_filter: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusScope {
    Document { document_id: String },
    Reference { language: Language },
}

/// Final ordered, deduplicated, redacted evidence per source kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub contract: Vec<EvidenceItem>,
    pub law: Vec<EvidenceItem>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.contract.is_empty() && self.law.is_empty()
    }

    pub fn contains(&self, kind: SourceKind, identifier: &str) -> bool {
        let items = match kind {
            SourceKind::Contract => &self.contract,
            SourceKind::Law => &self.law,
        };
        items.iter().any(|i| i.identifier == identifier)
    }
}

/// One segment produced by the external segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub identifier: String,
    pub text: String,
}

/// Summary scope requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Full,
    Focused,
}

impl SummaryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryMode::Full => "full",
            SummaryMode::Focused => "focused",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub document_id: Option<String>,
    pub question: String,
    /// Overrides script-based detection when set.
    pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub document_id: String,
    pub mode: SummaryMode,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    /// Output language code; unsupported codes fall back to English.
    #[serde(default)]
    pub language: Option<String>,
}

/// Structured summary contract returned by the generation oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryContent {
    pub mode: SummaryMode,
    pub language: String,
    pub overview: Vec<SummaryPoint>,
    pub sections: Vec<SummarySection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPoint {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<SummaryPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub id: String,
}

/// Evidence store oracle: similarity search over both corpora.
///
/// Implementations return at most `k` items, return empty (never an error)
/// on zero matches or an unknown document, and hard-filter reference
/// results by language.
pub trait EvidenceStore {
    fn document_language(&self, document_id: &str) -> Result<Option<DocumentLanguage>, RagError>;

    fn retrieve_document(
        &self,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError>;

    fn retrieve_reference(
        &self,
        query: &str,
        language: Language,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError>;
}

/// Translation oracle. Identity pairs must return the input unchanged.
pub trait Translator {
    fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, RagError>;
}

/// Text generation oracle.
pub trait LlmGenerate {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError>;
}

/// Advisory segment classifier used at ingestion. Labels only ever boost.
pub trait ClauseClassifier {
    fn classify(&self, text: &str, language: Language) -> Option<String>;
}
