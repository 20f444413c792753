//! Generation instructions and user content for both workflows.

use super::language::Language;
use super::types::SummaryMode;

/// Localized citation labels and section headings for ask answers.
struct UiLabels {
    contract: &'static str,
    law: &'static str,
    heading_contract: &'static str,
    heading_law: &'static str,
}

fn ui_labels(lang: Language) -> UiLabels {
    match lang {
        Language::En => UiLabels {
            contract: "Contract",
            law: "Labor Law",
            heading_contract: "From your contract",
            heading_law: "Saudi Labor Law",
        },
        Language::Ar => UiLabels {
            contract: "العقد",
            law: "نظام العمل",
            heading_contract: "من العقد",
            heading_law: "نظام العمل السعودي",
        },
        Language::Ur => UiLabels {
            contract: "معاہدہ",
            law: "محنت قانون",
            heading_contract: "معاہدے سے",
            heading_law: "سعودی لیبر قانون",
        },
        Language::Hi => UiLabels {
            contract: "कॉन्ट्रैक्ट",
            law: "श्रम कानून",
            heading_contract: "कॉन्ट्रैक्ट से",
            heading_law: "सऊदी श्रम कानून",
        },
        Language::Tl => UiLabels {
            contract: "Kontrata",
            law: "Batas sa Paggawa",
            heading_contract: "Mula sa kontrata",
            heading_law: "Batas sa Paggawa ng Saudi",
        },
    }
}

/// System instructions for a contract question.
///
/// `has_law` false forbids the law section. `general` marks a question asked
/// without an uploaded contract.
pub fn ask_system_prompt(lang: Language, has_law: bool, general: bool) -> String {
    let labels = ui_labels(lang);
    let mut system = format!(
        r#"You are a contract Q&A assistant for Saudi employment contracts.

RULES:
- Answer ONLY using the provided EVIDENCE snippets.
- Do NOT invent missing details.
- Write the entire answer in this language: {code}.
- Do NOT mention contract_id anywhere.
- Do NOT write "insufficient evidence" or any similar sentence.

STRICT OUTPUT FORMAT:
1) Start with ONE short direct answer sentence (no citation).
2) Then output:

## {heading_contract}
- Bullet points ONLY from CONTRACT evidence.
- Every bullet MUST end with: ({contract}: clause_id=<CLAUSE_ID>)

3) Include the LAW section ONLY IF it is clearly relevant to the question AND you will add at least ONE law bullet:

## {heading_law}
- Bullet points ONLY from LAW evidence.
- Every bullet MUST end with: ({law}: Article=<ARTICLE_NUMBER_OR_TITLE>)

4) Do NOT add any extra headings/sections.
5) Do NOT add placeholders like "(Contract: not found)"."#,
        code = lang.code(),
        heading_contract = labels.heading_contract,
        contract = labels.contract,
        heading_law = labels.heading_law,
        law = labels.law,
    );

    if general {
        system.push_str(
            "\nThis is GENERAL Q&A (no uploaded contract). Use only LABOR LAW EVIDENCE.",
        );
    }
    if !has_law {
        system.push_str(
            "\n\nIMPORTANT: There is NO law evidence provided. Do NOT output the law section.",
        );
    }
    system
}

/// User content for a question: the retrieval-normalized question, then evidence.
pub fn build_ask_prompt(normalized_question: &str, evidence_block: &str) -> String {
    format!("USER QUESTION (normalized for retrieval):\n{normalized_question}\n\n{evidence_block}")
}

/// System instructions for a structured summary.
pub fn summary_system_prompt(mode: SummaryMode, lang: Language) -> String {
    format!(
        r#"You are generating a CONTRACT SUMMARY (not Q&A).

STRICT RULES:
- Output MUST be valid JSON only (no markdown, no extra text).
- Write ALL text in language: {code}.
- Use ONLY the provided evidence snippets.
- Mode = {mode}
- FULL mode: include main sections (salary, probation, working hours, leave, termination, obligations, benefits, penalties, duration, governing law if present).
- FOCUSED mode: include ONLY selected topics.
- Every bullet MUST include at least one source:
  - Contract: {{ "type": "contract", "id": "A015" }}
  - Law: {{ "type": "law", "id": "Article 53" }}
- Source ids MUST be copied exactly from the evidence (clause_id or article).

OUTPUT JSON STRUCTURE:
{{
  "mode": "{mode}",
  "language": "{code}",
  "overview": [ {{ "text": "...", "sources": [{{"type":"contract","id":"A015"}}] }} ],
  "sections": [
    {{
      "key": "salary",
      "title": "...",
      "bullets": [ {{ "text": "...", "sources": [{{"type":"law","id":"Article 53"}}] }} ]
    }}
  ]
}}"#,
        code = lang.code(),
        mode = mode.as_str(),
    )
}

/// User content for a summary: mode, selected topics, then evidence.
pub fn build_summary_prompt(mode: SummaryMode, topics: &[String], evidence_block: &str) -> String {
    let topics = if topics.is_empty() {
        "-".to_string()
    } else {
        topics.join(", ")
    };
    format!(
        "MODE: {}\nTOPICS: {}\n\n{}",
        mode.as_str(),
        topics,
        evidence_block
    )
}

/// Instruction for the translation oracle.
pub fn translation_prompt(text: &str, source: Language, target: Language) -> String {
    format!(
        "Translate the following text from {} to {}.\nDo NOT explain. Return only the translation.\n\n{}",
        source.code(),
        target.code(),
        text
    )
}
