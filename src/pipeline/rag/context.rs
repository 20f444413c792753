//! Evidence assembly: formats the final bundle into the generation input.

use super::types::{EvidenceBundle, EvidenceItem};

pub const CONTRACT_HEADER: &str = "### CONTRACT EVIDENCE";
pub const LAW_HEADER: &str = "### LABOR LAW EVIDENCE";

/// Formatted evidence block plus what went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledEvidence {
    pub text: String,
    pub contract_items: usize,
    pub law_items: usize,
}

/// Render the bundle in rank order, contract evidence first.
///
/// A section is emitted only when it has items, so the generator never sees
/// an empty header it might feel obliged to fill.
pub fn assemble_evidence(bundle: &EvidenceBundle) -> AssembledEvidence {
    let mut lines: Vec<String> = Vec::new();

    if !bundle.contract.is_empty() {
        lines.push(CONTRACT_HEADER.to_string());
        for item in &bundle.contract {
            lines.push(contract_line(item));
            lines.push(item.text.clone());
            lines.push(String::new());
        }
    }

    if !bundle.law.is_empty() {
        lines.push(LAW_HEADER.to_string());
        for item in &bundle.law {
            lines.push(law_line(item));
            lines.push(item.text.clone());
            lines.push(String::new());
        }
    }

    AssembledEvidence {
        text: lines.join("\n"),
        contract_items: bundle.contract.len(),
        law_items: bundle.law.len(),
    }
}

fn contract_line(item: &EvidenceItem) -> String {
    format!(
        "[CONTRACT] clause_id={} | lang={} | score={:.3}",
        item.identifier, item.language, item.score
    )
}

fn law_line(item: &EvidenceItem) -> String {
    format!(
        "[LAW] title={} | article={} | lang={} | score={:.3}",
        item.title.as_deref().unwrap_or("-"),
        item.identifier,
        item.language,
        item.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rag::language::Language;
    use crate::pipeline::rag::types::SourceKind;

    fn contract(id: &str, score: f32) -> EvidenceItem {
        EvidenceItem {
            source_kind: SourceKind::Contract,
            identifier: id.into(),
            text: format!("Clause {id} text."),
            language: Language::En,
            score,
            origin_query: "q".into(),
            boosted: false,
            label: None,
            title: None,
        }
    }

    fn law(article: &str, title: Option<&str>) -> EvidenceItem {
        EvidenceItem {
            source_kind: SourceKind::Law,
            identifier: article.into(),
            text: "المادة نص".into(),
            language: Language::Ar,
            score: 0.25,
            origin_query: "q".into(),
            boosted: false,
            label: None,
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn contract_lines_carry_id_language_and_score() {
        let bundle = EvidenceBundle {
            contract: vec![contract("A015", 0.81234)],
            law: vec![],
        };
        let assembled = assemble_evidence(&bundle);

        assert!(assembled.text.starts_with(CONTRACT_HEADER));
        assert!(assembled
            .text
            .contains("[CONTRACT] clause_id=A015 | lang=en | score=0.812"));
        assert!(assembled.text.contains("Clause A015 text."));
        assert!(!assembled.text.contains(LAW_HEADER));
        assert_eq!(assembled.contract_items, 1);
        assert_eq!(assembled.law_items, 0);
    }

    #[test]
    fn law_lines_follow_contract_section() {
        let bundle = EvidenceBundle {
            contract: vec![contract("A001", 0.5)],
            law: vec![law("Article 53", Some("Probation")), law("Article 80", None)],
        };
        let text = assemble_evidence(&bundle).text;

        let contract_at = text.find(CONTRACT_HEADER).unwrap();
        let law_at = text.find(LAW_HEADER).unwrap();
        assert!(contract_at < law_at);
        assert!(text.contains("[LAW] title=Probation | article=Article 53 | lang=ar | score=0.250"));
        assert!(text.contains("[LAW] title=- | article=Article 80"));
    }

    #[test]
    fn law_only_bundle_has_no_contract_header() {
        let bundle = EvidenceBundle {
            contract: vec![],
            law: vec![law("Article 75", None)],
        };
        let text = assemble_evidence(&bundle).text;
        assert!(text.starts_with(LAW_HEADER));
        assert!(!text.contains(CONTRACT_HEADER));
    }

    #[test]
    fn order_is_preserved() {
        let bundle = EvidenceBundle {
            contract: vec![contract("A009", 0.9), contract("A002", 0.4)],
            law: vec![],
        };
        let text = assemble_evidence(&bundle).text;
        assert!(text.find("A009").unwrap() < text.find("A002").unwrap());
    }
}
