//! Anthropic Claude API provider implementation.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{FormularyError, Result};

use super::prompts;
use super::provider::{api_key_from_env, http_client, post_json, secret_header, LlmConfig, LlmProvider};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Suggestions from Claude via the messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            config,
        })
    }

    /// Read the key from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(LlmConfig::default())
    }

    pub fn from_env_with_config(config: LlmConfig) -> Result<Self> {
        Self::with_config(api_key_from_env("ANTHROPIC_API_KEY")?, config)
    }

    fn request_body(&self, user_prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": [{ "role": "user", "content": user_prompt }]
        })
    }

    fn complete(&self, user_prompt: &str) -> Result<String> {
        let request = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", secret_header(&self.api_key)?)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let reply: MessagesReply = post_json(request, &self.request_body(user_prompt), "Anthropic")?;
        reply.text()
    }
}

impl LlmProvider for AnthropicProvider {
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value> {
        debug!(provider = "anthropic", model = %self.config.model, "requesting suggestions");
        let text = self.complete(&prompts::suggestion_prompt(query, columns))?;
        prompts::parse_json_response(&text)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ReplyBlock>,
}

#[derive(Debug, Deserialize)]
struct ReplyBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesReply {
    /// First text block; tool and thinking blocks are skipped.
    fn text(self) -> Result<String> {
        self.content
            .into_iter()
            .find_map(|block| (block.kind == "text").then_some(block.text))
            .ok_or_else(|| FormularyError::Provider("Anthropic reply had no text block".to_string()))
    }
}
