//! Interaction languages, segment language detection, and pivot resolution.
//!
//! The pivot is the retrieval-time working language. It is chosen from the
//! document language alone: the user's language only decides whether a
//! query variant needs translating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported interaction languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
    Ur,
    Hi,
    /// Tagalog / Filipino.
    Tl,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Ar,
        Language::En,
        Language::Ur,
        Language::Hi,
        Language::Tl,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
            Language::Ur => "ur",
            Language::Hi => "hi",
            Language::Tl => "tl",
        }
    }

    /// English display name, used inside generation instructions.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Ar => "Arabic",
            Language::En => "English",
            Language::Ur => "Urdu",
            Language::Hi => "Hindi",
            Language::Tl => "Filipino",
        }
    }

    /// Parse a caller-supplied code, falling back to English for anything
    /// missing or unsupported.
    pub fn safe(code: Option<&str>) -> Language {
        code.and_then(|c| c.parse().ok()).unwrap_or(Language::En)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language code: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ar" => Ok(Language::Ar),
            "en" => Ok(Language::En),
            "ur" => Ok(Language::Ur),
            "hi" => Ok(Language::Hi),
            "tl" => Ok(Language::Tl),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Declared or detected language of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLanguage {
    Single(Language),
    Mixed,
}

impl DocumentLanguage {
    pub fn is_mixed(self) -> bool {
        matches!(self, DocumentLanguage::Mixed)
    }
}

impl fmt::Display for DocumentLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLanguage::Single(lang) => f.write_str(lang.code()),
            DocumentLanguage::Mixed => f.write_str("mixed"),
        }
    }
}

/// The two retrieval languages the corpora are indexed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotPair {
    pub primary: Language,
    pub secondary: Language,
}

impl Default for PivotPair {
    fn default() -> Self {
        Self {
            primary: Language::En,
            secondary: Language::Ar,
        }
    }
}

impl PivotPair {
    /// Resolve the retrieval pivot for a document.
    ///
    /// Pure: never consults an oracle. A mixed document resolves to the
    /// secondary pivot, but callers must still retrieve in both (see
    /// [`PivotPair::retrieval_languages`]).
    pub fn resolve(&self, document: DocumentLanguage, _user: Language) -> Language {
        match document {
            DocumentLanguage::Single(lang) if lang == self.primary => self.primary,
            _ => self.secondary,
        }
    }

    /// Languages evidence must be retrieved in, pivot first.
    pub fn retrieval_languages(&self, document: DocumentLanguage, user: Language) -> Vec<Language> {
        let pivot = self.resolve(document, user);
        if document.is_mixed() {
            let other = if pivot == self.primary {
                self.secondary
            } else {
                self.primary
            };
            vec![pivot, other]
        } else {
            vec![pivot]
        }
    }
}

fn is_arabic_script(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}')
}

/// Detect the user's language from question text.
///
/// Arabic script means Arabic; everything else is treated as English and
/// normalized later through translation.
pub fn detect_user_language(text: &str) -> Language {
    if text.chars().any(is_arabic_script) {
        Language::Ar
    } else {
        Language::En
    }
}

/// Detect a single segment's language from its script mix.
pub fn detect_segment_language(text: &str) -> DocumentLanguage {
    let has_arabic = text.chars().any(is_arabic_script);
    let has_latin = text.chars().any(|c| c.is_ascii_alphabetic());
    match (has_arabic, has_latin) {
        (true, true) => DocumentLanguage::Mixed,
        (true, false) => DocumentLanguage::Single(Language::Ar),
        _ => DocumentLanguage::Single(Language::En),
    }
}

/// Aggregate segment languages into a document language.
///
/// Any mixed segment, or segments that disagree, make the whole document
/// mixed. An empty document takes `fallback`.
pub fn aggregate_document_language(
    segments: &[DocumentLanguage],
    fallback: Language,
) -> DocumentLanguage {
    let Some(first) = segments.first().copied() else {
        return DocumentLanguage::Single(fallback);
    };
    if segments.iter().any(|l| *l != first) {
        return DocumentLanguage::Mixed;
    }
    first
}
