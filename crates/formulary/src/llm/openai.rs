//! OpenAI chat completions provider.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{FormularyError, Result};

use super::prompts;
use super::provider::{api_key_from_env, http_client, post_json, secret_header, LlmConfig, LlmProvider};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Suggestions from an OpenAI chat model in JSON mode.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, Self::default_config())
    }

    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            config,
        })
    }

    /// Read the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(Self::default_config())
    }

    pub fn from_env_with_config(config: LlmConfig) -> Result<Self> {
        Self::with_config(api_key_from_env("OPENAI_API_KEY")?, config)
    }

    pub fn default_config() -> LlmConfig {
        LlmConfig::default().with_model(DEFAULT_MODEL)
    }

    fn request_body(&self, user_prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": prompts::system_prompt() },
                { "role": "user", "content": user_prompt }
            ]
        })
    }

    fn complete(&self, user_prompt: &str) -> Result<String> {
        let bearer = format!("Bearer {}", self.api_key);
        let request = self
            .client
            .post(COMPLETIONS_URL)
            .header(AUTHORIZATION, secret_header(&bearer)?);

        let reply: CompletionReply = post_json(request, &self.request_body(user_prompt), "OpenAI")?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| FormularyError::Provider("OpenAI reply had no content".to_string()))
    }
}

impl LlmProvider for OpenAIProvider {
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value> {
        debug!(provider = "openai", model = %self.config.model, "requesting suggestions");
        let text = self.complete(&prompts::suggestion_prompt(query, columns))?;
        prompts::parse_json_response(&text)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    // null when the model refuses
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.config().model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_request_uses_json_mode() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        let body = provider.request_body("q");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][1]["content"], "q");
    }

    #[test]
    fn test_refusal_has_no_content() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": null, "refusal": "no"}}]}"#;
        let reply: CompletionReply = serde_json::from_str(raw).unwrap();
        assert!(reply.choices[0].message.content.is_none());
    }
}
