//! Hand-written oracle fakes shared by the pipeline tests.

use std::cell::{Cell, RefCell};

use super::language::{DocumentLanguage, Language};
use super::retrieval::InMemoryEvidenceStore;
use super::types::{EvidenceItem, EvidenceStore, LlmGenerate, Translator};
use super::RagError;

/// Tags text with the language pair instead of translating it.
#[derive(Default)]
pub struct CountingTranslator {
    calls: Cell<usize>,
    pairs: RefCell<Vec<(Language, Language)>>,
    fail: bool,
}

impl CountingTranslator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn pairs(&self) -> Vec<(Language, Language)> {
        self.pairs.borrow().clone()
    }
}

impl Translator for CountingTranslator {
    fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, RagError> {
        self.calls.set(self.calls.get() + 1);
        self.pairs.borrow_mut().push((source, target));
        if self.fail {
            return Err(RagError::Translation("translator offline".into()));
        }
        Ok(format!("[{source}->{target}] {text}"))
    }
}

/// Returns a fixed reply and records every prompt it was given.
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    calls: Cell<usize>,
    prompts: RefCell<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Cell::new(0),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("connection refused".into()),
            calls: Cell::new(0),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Last (system, prompt) pair.
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.prompts.borrow().last().cloned()
    }
}

impl LlmGenerate for ScriptedGenerator {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError> {
        self.calls.set(self.calls.get() + 1);
        self.prompts
            .borrow_mut()
            .push((system.to_string(), prompt.to_string()));
        self.reply.clone().map_err(RagError::OracleConnection)
    }
}

/// Wraps the in-memory store and counts every call by kind.
pub struct RecordingStore {
    pub inner: InMemoryEvidenceStore,
    language_calls: Cell<usize>,
    document_calls: Cell<usize>,
    reference_languages: RefCell<Vec<Language>>,
    fail: bool,
}

impl RecordingStore {
    pub fn new(inner: InMemoryEvidenceStore) -> Self {
        Self {
            inner,
            language_calls: Cell::new(0),
            document_calls: Cell::new(0),
            reference_languages: RefCell::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(inner: InMemoryEvidenceStore) -> Self {
        Self {
            fail: true,
            ..Self::new(inner)
        }
    }

    pub fn total_calls(&self) -> usize {
        self.language_calls.get() + self.document_calls.get() + self.reference_languages.borrow().len()
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.get()
    }

    pub fn reference_languages(&self) -> Vec<Language> {
        self.reference_languages.borrow().clone()
    }

    fn check(&self) -> Result<(), RagError> {
        if self.fail {
            Err(RagError::EvidenceSearch("index unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl EvidenceStore for RecordingStore {
    fn document_language(&self, document_id: &str) -> Result<Option<DocumentLanguage>, RagError> {
        self.language_calls.set(self.language_calls.get() + 1);
        self.check()?;
        self.inner.document_language(document_id)
    }

    fn retrieve_document(
        &self,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError> {
        self.document_calls.set(self.document_calls.get() + 1);
        self.check()?;
        self.inner.retrieve_document(document_id, query, k)
    }

    fn retrieve_reference(
        &self,
        query: &str,
        language: Language,
        k: usize,
    ) -> Result<Vec<EvidenceItem>, RagError> {
        self.reference_languages.borrow_mut().push(language);
        self.check()?;
        self.inner.retrieve_reference(query, language, k)
    }
}
