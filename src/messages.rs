//! Localized user-facing text for workflow failure reasons.

use crate::pipeline::rag::language::Language;
use crate::pipeline::rag::workflow::FailureReason;

/// Which caller-facing operation failed. Some reasons read differently
/// per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    ContractAsk,
    GeneralAsk,
    Summary,
}

pub fn failure_message(reason: FailureReason, surface: Surface, lang: Language) -> &'static str {
    match (reason, surface) {
        (FailureReason::NoTopics, _) => no_topics(lang),
        (FailureReason::NoEvidence, Surface::Summary) => no_summary_evidence(lang),
        (FailureReason::NoEvidence, Surface::GeneralAsk) => no_law_evidence(lang),
        (FailureReason::NoEvidence, Surface::ContractAsk) => no_contract_evidence(lang),
        (FailureReason::BadOutput, Surface::Summary) => bad_summary(lang),
        (FailureReason::BadOutput, _) => bad_answer(lang),
        (FailureReason::OracleUnavailable, _) => unavailable(lang),
    }
}

fn no_topics(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "اختر موضوعًا واحدًا على الأقل للتلخيص المركز.",
        Language::En => "Please select at least one topic for a focused summary.",
        Language::Ur => "مرکوز خلاصے کے لیے کم از کم ایک موضوع منتخب کریں۔",
        Language::Hi => "फोकस्ड सारांश के लिए कम से कम एक विषय चुनें।",
        Language::Tl => "Pumili ng kahit isang topic para sa focused summary.",
    }
}

fn no_summary_evidence(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "لم يتم العثور على أدلة كافية للتلخيص.",
        Language::En => "Not found in the provided contract/law evidence.",
        Language::Ur => "خلاصہ بنانے کے لیے کافی شواہد نہیں ملے۔",
        Language::Hi => "सारांश के लिए पर्याप्त प्रमाण नहीं मिला।",
        Language::Tl => "Walang sapat na ebidensya para gumawa ng summary.",
    }
}

fn no_law_evidence(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "لم يتم العثور على أدلة كافية في نظام العمل. حاول إعادة صياغة سؤالك.",
        Language::En => "No sufficient evidence found in the Saudi Labor Law. Please rephrase your question.",
        Language::Ur => "محنت قانون میں کافی شواہد نہیں ملے۔ براہِ کرم سوال دوبارہ لکھیں۔",
        Language::Hi => "श्रम कानून में पर्याप्त प्रमाण नहीं मिला। कृपया प्रश्न दोबारा लिखें।",
        Language::Tl => "Walang sapat na ebidensya sa Labor Law. Pakirephrase ang tanong mo.",
    }
}

fn no_contract_evidence(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "لم يتم العثور على ذلك في العقد أو نظام العمل.",
        Language::En => "Not found in the provided contract/law evidence.",
        Language::Ur => "یہ معاہدے یا محنت قانون میں نہیں ملا۔",
        Language::Hi => "यह कॉन्ट्रैक्ट या श्रम कानून में नहीं मिला।",
        Language::Tl => "Hindi ito nakita sa kontrata o sa Labor Law.",
    }
}

fn bad_summary(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "تعذر توليد ملخص منظم. حاول مرة أخرى.",
        Language::En => "Failed to generate a structured summary. Please try again.",
        Language::Ur => "منظم خلاصہ تیار نہیں ہو سکا۔ دوبارہ کوشش کریں۔",
        Language::Hi => "संरचित सारांश नहीं बन पाया। कृपया फिर कोशिश करें।",
        Language::Tl => "Hindi nakagawa ng structured summary. Subukan ulit.",
    }
}

fn bad_answer(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "تعذر توليد إجابة. حاول مرة أخرى.",
        Language::En => "Failed to generate an answer. Please try again.",
        Language::Ur => "جواب تیار نہیں ہو سکا۔ دوبارہ کوشش کریں۔",
        Language::Hi => "उत्तर नहीं बन पाया। कृपया फिर कोशिश करें।",
        Language::Tl => "Hindi nakagawa ng sagot. Subukan ulit.",
    }
}

fn unavailable(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "الخدمة غير متاحة مؤقتًا. حاول لاحقًا.",
        Language::En => "The assistant is temporarily unavailable. Please try again later.",
        Language::Ur => "سروس عارضی طور پر دستیاب نہیں ہے۔ بعد میں کوشش کریں۔",
        Language::Hi => "सेवा अस्थायी रूप से उपलब्ध नहीं है। कृपया बाद में कोशिश करें।",
        Language::Tl => "Pansamantalang hindi available ang serbisyo. Subukan mamaya.",
    }
}
