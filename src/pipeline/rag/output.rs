//! Post-processing of generation oracle output.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::types::{EvidenceBundle, SummaryContent, SummaryMode, SummaryPoint, SummarySection};
use super::RagError;

static INSUFFICIENT_EVIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)insufficient\s+evidence|evidence\s+is\s+insufficient").unwrap()
});

/// Drop lines claiming the evidence is insufficient.
///
/// Returns `None` when nothing is left, which callers treat as unusable
/// output.
pub fn clean_answer(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .lines()
        .filter(|line| !INSUFFICIENT_EVIDENCE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Remove a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Structured summary as the oracle returns it. Mode and language are
/// taken from the request, not the model. Both lists are required: an
/// object missing either is not a summary.
#[derive(Deserialize)]
struct RawSummary {
    overview: Vec<SummaryPoint>,
    sections: Vec<SummarySection>,
}

/// Decode summary output into [`SummaryContent`], stamping mode and language.
pub fn parse_summary(
    raw: &str,
    mode: SummaryMode,
    language: &str,
) -> Result<SummaryContent, RagError> {
    let body = strip_code_fences(raw);
    let parsed: RawSummary =
        serde_json::from_str(body).map_err(|e| RagError::ResponseParsing(e.to_string()))?;

    Ok(SummaryContent {
        mode,
        language: language.to_string(),
        overview: parsed.overview,
        sections: parsed.sections,
    })
}

/// Drop citations that do not name an item of the bundle. Returns how many
/// were dropped.
pub fn retain_known_sources(content: &mut SummaryContent, bundle: &EvidenceBundle) -> usize {
    let mut dropped = 0;
    let points = content
        .overview
        .iter_mut()
        .chain(content.sections.iter_mut().flat_map(|s| s.bullets.iter_mut()));

    for point in points {
        let before = point.sources.len();
        point
            .sources
            .retain(|source| bundle.contains(source.kind, &source.id));
        dropped += before - point.sources.len();
    }

    if dropped > 0 {
        tracing::warn!(dropped, "Summary cited sources outside the evidence bundle");
    }
    dropped
}
