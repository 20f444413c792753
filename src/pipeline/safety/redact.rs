//! Sensitive-entity redaction for evidence text.
//!
//! Patterns run in a fixed order: narrow structured patterns first, the
//! broad card-like digit run last, otherwise it swallows national ids and
//! phone numbers and under-reports them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::rag::types::EvidenceItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Email,
    Iban,
    NationalId,
    Phone,
    Card,
}

impl PiiCategory {
    pub fn placeholder(self) -> &'static str {
        match self {
            PiiCategory::Email => "[EMAIL_REDACTED]",
            PiiCategory::Iban => "[IBAN_REDACTED]",
            PiiCategory::NationalId => "[NATIONAL_ID_REDACTED]",
            PiiCategory::Phone => "[PHONE_REDACTED]",
            PiiCategory::Card => "[CARD_REDACTED]",
        }
    }
}

/// Per-category replacement counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionStats {
    pub counts: BTreeMap<PiiCategory, usize>,
}

impl RedactionStats {
    pub fn get(&self, category: PiiCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    fn add(&mut self, category: PiiCategory, n: usize) {
        if n > 0 {
            *self.counts.entry(category).or_insert(0) += n;
        }
    }

    pub fn merge(&mut self, other: &RedactionStats) {
        for (category, n) in &other.counts {
            self.add(*category, *n);
        }
    }
}

/// A pattern plus whether matches must not touch adjacent digits.
struct PiiRule {
    category: PiiCategory,
    pattern: Regex,
    digit_bounded: bool,
}

fn rule(category: PiiCategory, pattern: &str, digit_bounded: bool) -> PiiRule {
    PiiRule {
        category,
        // Patterns are literals checked by the tests below.
        pattern: Regex::new(pattern).unwrap(),
        digit_bounded,
    }
}

static RULES: LazyLock<Vec<PiiRule>> = LazyLock::new(|| {
    vec![
        rule(
            PiiCategory::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            false,
        ),
        // Saudi IBAN: 22 characters after the country code, 20 tolerated.
        rule(PiiCategory::Iban, r"(?i)\bSA\d{2}[A-Z0-9]{18,20}\b", false),
        // National id / iqama: 10 digits starting with 1 or 2.
        rule(PiiCategory::NationalId, r"[12]\d{9}", true),
        // Local mobile, then generic international.
        rule(PiiCategory::Phone, r"(?:\+?966|0)?5\d{8}", true),
        rule(PiiCategory::Phone, r"\+?\d{10,15}", true),
        rule(PiiCategory::Card, r"(?:\d[ -]*?){13,19}", true),
    ]
});

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d$").unwrap());

/// Same class as `\d` in the rules: any Unicode decimal digit, so
/// Arabic-Indic numerals bound a match just like ASCII ones.
fn is_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Redact every sensitive entity in `text`.
pub fn redact_text(text: &str) -> (String, RedactionStats) {
    let mut stats = RedactionStats::default();
    if text.is_empty() {
        return (String::new(), stats);
    }

    let mut current = text.to_string();
    for rule in RULES.iter() {
        let (next, n) = if rule.digit_bounded {
            replace_digit_bounded(&current, &rule.pattern, rule.category.placeholder())
        } else {
            let n = rule.pattern.find_iter(&current).count();
            let next = rule
                .pattern
                .replace_all(&current, rule.category.placeholder())
                .into_owned();
            (next, n)
        };
        stats.add(rule.category, n);
        current = next;
    }

    (current, stats)
}

/// Replace matches that are not directly preceded or followed by a digit.
///
/// A rejected match restarts the scan one character later, so a valid
/// match beginning inside it is still found.
fn replace_digit_bounded(text: &str, pattern: &Regex, placeholder: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut search_from = 0;
    let mut count = 0;

    while search_from <= text.len() {
        let Some(m) = pattern.find_at(text, search_from) else {
            break;
        };

        let before_ok = !text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(is_digit);
        let after_ok = !text[m.end()..]
            .chars()
            .next()
            .is_some_and(is_digit);

        if before_ok && after_ok && !m.as_str().is_empty() {
            out.push_str(&text[copied_to..m.start()]);
            out.push_str(placeholder);
            copied_to = m.end();
            search_from = m.end();
            count += 1;
        } else {
            let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
            search_from = m.start() + step;
        }
    }

    out.push_str(&text[copied_to..]);
    (out, count)
}

/// Redact the free text of every item. Identifiers are never touched.
pub fn redact_items(items: Vec<EvidenceItem>) -> (Vec<EvidenceItem>, RedactionStats) {
    let mut total = RedactionStats::default();
    let redacted = items
        .into_iter()
        .map(|mut item| {
            let (text, stats) = redact_text(&item.text);
            item.text = text;
            total.merge(&stats);
            item
        })
        .collect();
    (redacted, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rag::language::Language;
    use crate::pipeline::rag::types::SourceKind;

    #[test]
    fn rules_compile() {
        assert_eq!(RULES.len(), 6);
    }

    #[test]
    fn email_phone_and_id_all_redacted() {
        let text = "Contact ahmed.ali@example.com or 0551234567. ID 1098765432.";
        let (out, stats) = redact_text(text);

        assert!(!out.contains("ahmed.ali@example.com"));
        assert!(!out.contains("0551234567"));
        assert!(!out.contains("1098765432"));
        assert_eq!(stats.get(PiiCategory::Email), 1);
        assert_eq!(stats.get(PiiCategory::Phone), 1);
        assert_eq!(stats.get(PiiCategory::NationalId), 1);
        assert_eq!(stats.total(), 3);
        assert!(out.contains("[EMAIL_REDACTED]"));
        assert!(out.contains("[PHONE_REDACTED]"));
        assert!(out.contains("[NATIONAL_ID_REDACTED]"));
    }

    #[test]
    fn iban_redacted_before_digit_rules() {
        let (out, stats) = redact_text("Pay to SA0380000000608010167519 monthly.");
        assert_eq!(out, "Pay to [IBAN_REDACTED] monthly.");
        assert_eq!(stats.get(PiiCategory::Iban), 1);
        assert_eq!(stats.get(PiiCategory::Card), 0);
    }

    #[test]
    fn card_runs_redacted_last() {
        let (out, stats) = redact_text("Card 4111 1111 1111 1111 on file.");
        assert_eq!(out, "Card [CARD_REDACTED] on file.");
        assert_eq!(stats.get(PiiCategory::Card), 1);
    }

    #[test]
    fn national_id_not_counted_as_card_or_phone() {
        let (_, stats) = redact_text("Iqama 2123456789");
        assert_eq!(stats.get(PiiCategory::NationalId), 1);
        assert_eq!(stats.get(PiiCategory::Phone), 0);
        assert_eq!(stats.get(PiiCategory::Card), 0);
    }

    #[test]
    fn longer_digit_runs_are_not_ids() {
        let (_, stats) = redact_text("Ref 12345678901");
        assert_eq!(stats.get(PiiCategory::NationalId), 0);
        assert_eq!(stats.get(PiiCategory::Phone), 1);
    }

    #[test]
    fn international_phone_redacted() {
        let (out, stats) = redact_text("Call +966551234567 today");
        assert_eq!(out, "Call [PHONE_REDACTED] today");
        assert_eq!(stats.get(PiiCategory::Phone), 1);
    }

    #[test]
    fn ordinary_numbers_untouched() {
        let text = "Salary 5000 SAR, probation 90 days, Article 80.";
        let (out, stats) = redact_text(text);
        assert_eq!(out, text);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn arabic_text_redacted() {
        let (out, stats) = redact_text("رقم الجوال 0551234567 للتواصل");
        assert_eq!(out, "رقم الجوال [PHONE_REDACTED] للتواصل");
        assert_eq!(stats.total(), 1);
    }

    #[test]
    fn arabic_indic_card_run_redacted_whole() {
        let (out, stats) = redact_text("البطاقة ٤١١١١١١١١١١١١١١١ مسجلة");
        assert_eq!(out, "البطاقة [CARD_REDACTED] مسجلة");
        assert_eq!(stats.get(PiiCategory::Card), 1);
        assert_eq!(stats.get(PiiCategory::Phone), 0);
    }

    #[test]
    fn arabic_indic_phone_redacted() {
        let (out, stats) = redact_text("الجوال ٠٥٥١٢٣٤٥٦٧ فقط");
        assert_eq!(out, "الجوال [PHONE_REDACTED] فقط");
        assert_eq!(stats.get(PiiCategory::Phone), 1);
    }

    #[test]
    fn digit_boundary_covers_unicode_digits() {
        assert!(is_digit('7'));
        assert!(is_digit('٧'));
        assert!(is_digit('۷'));
        assert!(!is_digit('a'));
        assert!(!is_digit('²'));
    }

    #[test]
    fn identifiers_are_never_redacted() {
        let items = vec![EvidenceItem {
            source_kind: SourceKind::Contract,
            identifier: "1098765432".into(),
            text: "Employee id 1098765432".into(),
            language: Language::En,
            score: 0.5,
            origin_query: "q".into(),
            boosted: false,
            label: None,
            title: None,
        }];
        let (out, stats) = redact_items(items);
        assert_eq!(out[0].identifier, "1098765432");
        assert_eq!(out[0].text, "Employee id [NATIONAL_ID_REDACTED]");
        assert_eq!(stats.total(), 1);
    }
}
