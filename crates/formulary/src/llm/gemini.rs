//! Google Gemini API provider implementation.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{FormularyError, Result};

use super::prompts;
use super::provider::{api_key_from_env, http_client, post_json, secret_header, LlmConfig, LlmProvider};

/// Gemini API base URL; the model name and method are appended.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default Gemini model.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini provider.
///
/// Requests JSON output through `responseMimeType`, so the model answers with
/// a bare object rather than fenced prose.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, Self::default_config())
    }

    /// Create a new Gemini provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(Self::default_config())
    }

    /// Create from environment variable with custom configuration.
    pub fn from_env_with_config(config: LlmConfig) -> Result<Self> {
        Self::with_config(api_key_from_env("GOOGLE_API_KEY")?, config)
    }

    /// Default configuration using the Gemini model.
    pub fn default_config() -> LlmConfig {
        LlmConfig::default().with_model(DEFAULT_MODEL)
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", API_BASE, self.config.model)
    }

    fn complete(&self, user_prompt: &str) -> Result<String> {
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": prompts::system_prompt() }]
            },
            "contents": [
                { "role": "user", "parts": [{ "text": user_prompt }] }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "responseMimeType": "application/json"
            }
        });

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", secret_header(&self.api_key)?);

        let reply: GeminiResponse = post_json(request, &body, "Gemini")?;
        reply.text()
    }
}

impl LlmProvider for GeminiProvider {
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value> {
        debug!(provider = "gemini", model = %self.config.model, "requesting suggestions");
        let text = self.complete(&prompts::suggestion_prompt(query, columns))?;
        prompts::parse_json_response(&text)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| FormularyError::Provider("No candidates in Gemini response".to_string()))?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            return Err(FormularyError::Provider("No text in Gemini response".to_string()));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_model() {
        let provider = GeminiProvider::new("key").unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text() {
        let raw = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_empty_response_is_provider_error() {
        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(parsed.text(), Err(FormularyError::Provider(_))));
    }
}
