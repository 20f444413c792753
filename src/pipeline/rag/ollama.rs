//! Local Ollama instance serving as both generation and translation oracle.

use serde::{Deserialize, Serialize};

use super::language::Language;
use super::prompt::translation_prompt;
use super::types::{LlmGenerate, Translator};
use super::RagError;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama HTTP client bound to one model.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, RagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::OracleConnection(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
            temperature: 0.2,
        })
    }

    /// Local instance at localhost:11434 with a 5-minute timeout.
    pub fn default_local(model: &str) -> Result<Self, RagError> {
        Self::new(DEFAULT_BASE_URL, model, DEFAULT_TIMEOUT_SECS)
    }

    /// Sampling temperature for answers and summaries. Translation always
    /// runs at zero.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, system: &str, prompt: &str, temperature: f32) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions { temperature },
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                RagError::OracleConnection(self.base_url.clone())
            } else if e.is_timeout() {
                RagError::OracleConnection(format!(
                    "Request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                RagError::OracleConnection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::OracleStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response.trim().to_string())
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl LlmGenerate for OllamaClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Generating");
        self.request(system, prompt, self.temperature)
    }
}

impl Translator for OllamaClient {
    fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, RagError> {
        if source == target || text.is_empty() {
            return Ok(text.to_string());
        }
        self.request("", &translation_prompt(text, source, target), 0.0)
            .map_err(|e| RagError::Translation(e.to_string()))
    }
}
