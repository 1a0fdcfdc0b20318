//! Ollama provider for locally served models.
//!
//! No API key is needed. The server is expected on `localhost:11434` unless
//! `OLLAMA_HOST` points elsewhere (`ollama serve`, then `ollama pull llama3.2`).

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;

use super::prompts;
use super::provider::{http_client, post_json, LlmConfig, LlmProvider};

const DEFAULT_HOST: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: Client,
    chat_url: String,
    config: LlmConfig,
}

impl OllamaProvider {
    pub fn new() -> Result<Self> {
        Self::with_config(Self::default_config())
    }

    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        Self::with_config(Self::default_config().with_model(model))
    }

    pub fn with_config(config: LlmConfig) -> Result<Self> {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Ok(Self {
            client: http_client(&config)?,
            chat_url: chat_url(&host),
            config,
        })
    }

    /// llama3.2 with a 120 second timeout, since local generation is slow.
    pub fn default_config() -> LlmConfig {
        LlmConfig::default()
            .with_model("llama3.2")
            .with_timeout_secs(120)
    }

    fn request_body(&self, user_prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
            "messages": [
                { "role": "system", "content": prompts::system_prompt() },
                { "role": "user", "content": user_prompt }
            ]
        })
    }

    fn complete(&self, user_prompt: &str) -> Result<String> {
        let request = self.client.post(&self.chat_url);
        let reply: ChatReply = post_json(request, &self.request_body(user_prompt), "Ollama")?;
        Ok(reply.message.content)
    }
}

fn chat_url(host: &str) -> String {
    format!("{}/api/chat", host.trim_end_matches('/'))
}

impl LlmProvider for OllamaProvider {
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value> {
        debug!(provider = "ollama", model = %self.config.model, url = %self.chat_url, "requesting suggestions");
        let text = self.complete(&prompts::suggestion_prompt(query, columns))?;
        prompts::parse_json_response(&text)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url() {
        assert_eq!(chat_url("http://gpu-box:11434/"), "http://gpu-box:11434/api/chat");
        assert_eq!(chat_url(DEFAULT_HOST), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_default_config() {
        let config = OllamaProvider::default_config();
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_request_is_not_streamed() {
        let provider = OllamaProvider::with_model("qwen2.5").unwrap();
        let body = provider.request_body("q");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["model"], "qwen2.5");
    }
}
