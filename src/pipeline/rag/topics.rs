//! Summary topic catalogue: bilingual seed queries and classifier labels.

use std::collections::BTreeSet;

/// A UI topic with its fixed retrieval seed and classifier label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub seed: &'static str,
}

pub const TOPICS: &[TopicSpec] = &[
    TopicSpec {
        name: "Salary",
        label: "salary_terms",
        seed: "salary basic wage allowances deductions benefits الراتب البدلات الاستقطاعات",
    },
    TopicSpec {
        name: "Probation",
        label: "probation",
        seed: "probation period تجربة فسخ خلال التجربة",
    },
    TopicSpec {
        name: "Termination",
        label: "termination",
        seed: "termination notice end of contract Article 80 إنهاء إشعار المادة 80",
    },
    TopicSpec {
        name: "Working Hours",
        label: "working_hours",
        seed: "working hours overtime دوام ساعات عمل عمل إضافي",
    },
    TopicSpec {
        name: "Leave",
        label: "leave",
        seed: "annual leave sick leave vacation إجازة سنوية إجازة مرضية",
    },
    TopicSpec {
        name: "Benefits",
        label: "benefits",
        seed: "benefits housing transportation medical insurance مزايا سكن نقل تأمين طبي",
    },
    TopicSpec {
        name: "Penalties",
        label: "penalties",
        seed: "penalties disciplinary fine خصم جزاءات عقوبات",
    },
    TopicSpec {
        name: "Duration",
        label: "contract_duration",
        seed: "contract duration renewal fixed-term مدة العقد تجديد عقد محدد المدة",
    },
    TopicSpec {
        name: "Non-Compete",
        label: "non_compete",
        seed: "non-compete confidentiality عدم منافسة سرية",
    },
];

/// Queries used when the caller asks for a full summary.
pub const DEFAULT_TOPIC_QUERIES: &[&str] = &[
    "probation period",
    "salary and allowances",
    "working hours and overtime",
    "leave and holidays",
    "termination and notice",
    "end of service benefits",
    "penalties and disciplinary actions",
    "non-compete",
    "contract duration / renewal",
];

pub fn find_topic(name: &str) -> Option<&'static TopicSpec> {
    TOPICS.iter().find(|t| t.name == name)
}

/// Seed query for a topic. Unknown topics are their own query.
pub fn seed_query(name: &str) -> String {
    find_topic(name)
        .map(|t| t.seed.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Classifier labels wanted for a topic selection. Unknown topics add none.
pub fn wanted_labels(topics: &[String]) -> BTreeSet<String> {
    topics
        .iter()
        .filter_map(|t| find_topic(t))
        .map(|t| t.label.to_string())
        .collect()
}
