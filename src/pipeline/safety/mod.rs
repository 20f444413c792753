pub mod guardrails;
pub mod redact;
