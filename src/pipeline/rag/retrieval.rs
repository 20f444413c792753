use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::language::{
    aggregate_document_language, detect_segment_language, DocumentLanguage, Language,
};
use super::ranking::merge_best_survivors;
use super::types::{
    ClauseClassifier, CorpusScope, EvidenceItem, EvidenceStore, RetrievalRequest, Segment,
    SourceKind,
};
use super::RagError;

/// Run every query of a request against its corpus and merge the hit lists.
///
/// Queries run in input order; the best-survivor merge is deterministic for
/// a given order, so the result does not depend on how the store schedules
/// work. Label boosting is applied by the caller.
pub fn gather(
    store: &dyn EvidenceStore,
    request: &RetrievalRequest,
) -> Result<Vec<EvidenceItem>, RagError> {
    let mut hit_lists = Vec::with_capacity(request.queries.len());

    for query in &request.queries {
        let hits = match &request.scope {
            CorpusScope::Document { document_id } => {
                store.retrieve_document(document_id, query, request.per_query_k)?
            }
            CorpusScope::Reference { language } => {
                store.retrieve_reference(query, *language, request.per_query_k)?
            }
        };
        tracing::debug!(hits = hits.len(), k = request.per_query_k, "Retrieval query done");
        hit_lists.push(hits);
    }

    Ok(merge_best_survivors(hit_lists, request.max_total))
}

/// Normalize a clause identifier to the `A###` form (`"clause 7"` -> `A007`).
/// Identifiers without digits are upper-cased and kept.
pub fn normalize_clause_id(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let digits: String = upper
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u64>() {
        Ok(n) => format!("A{n:03}"),
        Err(_) => upper,
    }
}

/// In-memory evidence store: documents written once at ingestion, then
/// read-only. Similarity is a lexical cosine over term frequencies.
#[derive(Default)]
pub struct InMemoryEvidenceStore {
    documents: HashMap<String, StoredDocument>,
    reference: Vec<StoredEntry>,
    primary_language: Option<Language>,
}

struct StoredDocument {
    language: DocumentLanguage,
    segments: Vec<StoredEntry>,
}

struct StoredEntry {
    identifier: String,
    text: String,
    language: Language,
    label: Option<String>,
    title: Option<String>,
    terms: TermVector,
}

/// One article of the reference-law metadata file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceArticle {
    pub article: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    pub language: Language,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Language assumed for empty documents. Defaults to English.
    pub fn with_primary_language(mut self, language: Language) -> Self {
        self.primary_language = Some(language);
        self
    }

    /// Ingest a segmented document, replacing any previous version.
    ///
    /// Returns the detected document language.
    pub fn ingest_document(
        &mut self,
        document_id: &str,
        segments: &[Segment],
        classifier: &dyn ClauseClassifier,
    ) -> DocumentLanguage {
        let mut languages = Vec::with_capacity(segments.len());
        let mut stored = Vec::with_capacity(segments.len());

        for segment in segments {
            let detected = detect_segment_language(&segment.text);
            languages.push(detected);

            let language = match detected {
                DocumentLanguage::Single(lang) => lang,
                DocumentLanguage::Mixed => Language::Ar,
            };
            stored.push(StoredEntry {
                identifier: normalize_clause_id(&segment.identifier),
                label: classifier.classify(&segment.text, language),
                terms: term_frequencies(&segment.text),
                text: segment.text.clone(),
                language,
                title: None,
            });
        }

        let language = aggregate_document_language(
            &languages,
            self.primary_language.unwrap_or(Language::En),
        );
        tracing::info!(
            document_id,
            segments = stored.len(),
            language = %language,
            "Document ingested"
        );

        self.documents.insert(
            document_id.to_string(),
            StoredDocument {
                language,
                segments: stored,
            },
        );
        language
    }

    pub fn add_reference_article(&mut self, article: ReferenceArticle) {
        self.reference.push(StoredEntry {
            identifier: article.article,
            terms: term_frequencies(&article.text),
            text: article.text,
            language: article.language,
            label: None,
            title: article.title,
        });
    }

    /// Load reference articles from a JSON array.
    pub fn load_reference_json(&mut self, json: &str) -> Result<usize, RagError> {
        let articles: Vec<ReferenceArticle> =
            serde_json::from_str(json).map_err(|e| RagError::ReferenceCorpus(e.to_string()))?;
        let count = articles.len();
        for article in articles {
            self.add_reference_article(article);
        }
        Ok(count)
    }

    pub fn load_reference_file(&mut self, path: &Path) -> Result<usize, RagError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RagError::ReferenceCorpus(format!("{}: {e}", path.display()))
        })?;
        self.load_reference_json(&raw)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn document_language(&self, document_id: &str) -> Result<Option<DocumentLanguage>, RagError> {
        Ok(self.documents.get(document_id).map(|d| d.language))
    }

    fn retrieve_document(
        &self,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError> {
        let Some(document) = self.documents.get(document_id) else {
            return Ok(Vec::new());
        };
        Ok(top_k(
            document.segments.iter(),
            query,
            k,
            SourceKind::Contract,
        ))
    }

    fn retrieve_reference(
        &self,
        query: &str,
        language: Language,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError> {
        Ok(top_k(
            self.reference.iter().filter(|a| a.language == language),
            query,
            k,
            SourceKind::Law,
        ))
    }
}

fn top_k<'e>(
    entries: impl Iterator<Item = &'e StoredEntry>,
    query: &str,
    k: usize,
    kind: SourceKind,
) -> Vec<EvidenceItem> {
    let query_terms = term_frequencies(query);

    let mut scored: Vec<(f32, &StoredEntry)> = entries
        .map(|entry| (cosine_similarity(&query_terms, &entry.terms), entry))
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(k)
        .map(|(score, entry)| EvidenceItem {
            source_kind: kind,
            identifier: entry.identifier.clone(),
            text: entry.text.clone(),
            language: entry.language,
            score,
            origin_query: query.to_string(),
            boosted: false,
            label: entry.label.clone(),
            title: entry.title.clone(),
        })
        .collect()
}

/// Term frequencies keyed in sorted order, so float sums over a vector are
/// reproducible across runs.
type TermVector = BTreeMap<String, f32>;

fn term_frequencies(text: &str) -> TermVector {
    let mut terms = TermVector::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn cosine_similarity(a: &TermVector, b: &TermVector) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot: f32 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a: f32 = a.values().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Keyword classifier mapping clause text to topic labels.
pub struct KeywordClassifier;

impl ClauseClassifier for KeywordClassifier {
    fn classify(&self, text: &str, _language: Language) -> Option<String> {
        const RULES: &[(&str, &[&str])] = &[
            ("salary_terms", &["salary", "wage", "allowance", "الراتب", "أجر"]),
            ("probation", &["probation", "تجربة"]),
            ("termination", &["terminat", "notice", "إنهاء", "فسخ"]),
            ("working_hours", &["working hours", "overtime", "ساعات"]),
            ("leave", &["leave", "vacation", "إجازة"]),
            ("benefits", &["housing", "insurance", "transportation", "سكن", "تأمين"]),
            ("penalties", &["penalt", "disciplin", "fine", "جزاء"]),
            ("contract_duration", &["duration", "renewal", "term of", "مدة العقد"]),
            ("non_compete", &["non-compete", "compete", "confidential", "منافسة"]),
        ];

        let lower = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(label, _)| label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn seg(id: &str, text: &str) -> Segment {
        Segment {
            identifier: id.into(),
            text: text.into(),
        }
    }

    fn store_with_contract() -> InMemoryEvidenceStore {
        let mut store = InMemoryEvidenceStore::new();
        store.ingest_document(
            "c1",
            &[
                seg("1", "The probation period is ninety days."),
                seg("2", "Basic salary is 5000 SAR per month plus housing allowance."),
                seg("3", "Either party may terminate with sixty days notice."),
            ],
            &KeywordClassifier,
        );
        store
            .load_reference_json(
                r#"[
                {"article": "Article 53", "title": "Probation", "text": "The probation period shall not exceed ninety days.", "language": "en"},
                {"article": "المادة 53", "title": "التجربة", "text": "لا تزيد مدة التجربة على تسعين يوما", "language": "ar"},
                {"article": "Article 80", "text": "The employer may terminate without notice in listed cases.", "language": "en"}
            ]"#,
            )
            .unwrap();
        store
    }

    #[test]
    fn clause_ids_normalized() {
        assert_eq!(normalize_clause_id("15"), "A015");
        assert_eq!(normalize_clause_id(" clause 7 "), "A007");
        assert_eq!(normalize_clause_id("a1234"), "A1234");
        assert_eq!(normalize_clause_id("preamble"), "PREAMBLE");
    }

    #[test]
    fn document_retrieval_ranks_by_similarity() {
        let store = store_with_contract();
        let hits = store.retrieve_document("c1", "probation period", 2).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].identifier, "A001");
        assert_eq!(hits[0].label.as_deref(), Some("probation"));
        assert_eq!(hits[0].source_kind, SourceKind::Contract);
        assert!(hits[0].score > 0.0 && hits[0].score <= 1.0);
    }

    #[test]
    fn unknown_document_returns_empty() {
        let store = store_with_contract();
        assert!(store.retrieve_document("missing", "salary", 5).unwrap().is_empty());
        assert_eq!(store.document_language("missing").unwrap(), None);
    }

    #[test]
    fn zero_matches_return_empty_not_error() {
        let store = store_with_contract();
        assert!(store.retrieve_document("c1", "xylophone", 5).unwrap().is_empty());
    }

    #[test]
    fn reference_retrieval_filters_language_hard() {
        let store = store_with_contract();
        for lang in Language::ALL {
            let hits = store.retrieve_reference("probation period مدة التجربة", lang, 10).unwrap();
            assert!(hits.iter().all(|h| h.language == lang));
        }
        let ar = store.retrieve_reference("مدة التجربة", Language::Ar, 10).unwrap();
        assert_eq!(ar.len(), 1);
        assert_eq!(ar[0].identifier, "المادة 53");
    }

    #[test]
    fn retrieval_respects_k() {
        let store = store_with_contract();
        let hits = store.retrieve_document("c1", "the period salary notice", 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn mixed_segments_make_mixed_document() {
        let mut store = InMemoryEvidenceStore::new();
        let lang = store.ingest_document(
            "c2",
            &[seg("1", "Salary 5000"), seg("2", "الراتب الأساسي")],
            &KeywordClassifier,
        );
        assert_eq!(lang, DocumentLanguage::Mixed);
        assert_eq!(
            store.document_language("c2").unwrap(),
            Some(DocumentLanguage::Mixed)
        );
    }

    #[test]
    fn gather_merges_queries_under_cap() {
        let store = store_with_contract();
        let request = RetrievalRequest {
            scope: CorpusScope::Document {
                document_id: "c1".into(),
            },
            queries: vec!["probation period".into(), "period salary".into()],
            per_query_k: 3,
            max_total: 2,
            label_filter: None,
        };
        let merged = gather(&store, &request).unwrap();
        assert_eq!(merged.len(), 2);
        let ids: BTreeSet<_> = merged.iter().map(|i| i.identifier.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(merged[0].score >= merged[1].score);
    }

    #[test]
    fn similarity_is_bit_identical_regardless_of_term_order() {
        let query = term_frequencies("annual leave sick leave vacation notice period salary");
        let forward = term_frequencies("salary notice annual leave vacation period days paid");
        let reversed = term_frequencies("paid days period vacation leave annual notice salary");

        let a = cosine_similarity(&query, &forward);
        let b = cosine_similarity(&query, &reversed);
        assert!(a > 0.0);
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(a.to_bits(), cosine_similarity(&query, &forward).to_bits());

        let keys: Vec<_> = forward.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn bad_reference_json_is_an_error() {
        let mut store = InMemoryEvidenceStore::new();
        assert!(matches!(
            store.load_reference_json("{not json"),
            Err(RagError::ReferenceCorpus(_))
        ));
    }

    #[test]
    fn keyword_classifier_labels_clauses() {
        let c = KeywordClassifier;
        assert_eq!(
            c.classify("Annual leave of 21 days", Language::En).as_deref(),
            Some("leave")
        );
        assert_eq!(c.classify("Signed in Riyadh", Language::En), None);
    }
}
