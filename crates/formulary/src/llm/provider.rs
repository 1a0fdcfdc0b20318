//! LLM provider trait and configuration.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FormularyError, Result};

/// Configuration for LLM providers.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe (Send + Sync) so the server can share a
/// provider across requests.
pub trait LlmProvider: Send + Sync {
    /// Ask for derived columns and flag rules answering `query`.
    ///
    /// # Arguments
    /// * `query` - The user's natural language request
    /// * `columns` - Column names of the loaded table
    ///
    /// # Returns
    /// The raw JSON the model produced. It is untrusted and must go through
    /// [`crate::suggestion::validate`] before use.
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

/// Blocking HTTP client honoring the configured timeout.
pub(crate) fn http_client(config: &LlmConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| FormularyError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Read an API key from the environment.
pub(crate) fn api_key_from_env(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| FormularyError::Config(format!("{} environment variable not set", var)))
}

/// Header value for a credential, marked sensitive so it stays out of debug output.
pub(crate) fn secret_header(secret: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(secret)
        .map_err(|e| FormularyError::Config(format!("Invalid API key: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Send `body` as JSON and decode the reply.
///
/// Transport failures, non-success statuses and undecodable replies all come
/// back as [`FormularyError::Provider`] tagged with `provider`.
pub(crate) fn post_json<T: DeserializeOwned>(
    request: RequestBuilder,
    body: &Value,
    provider: &str,
) -> Result<T> {
    let response = request
        .json(body)
        .send()
        .map_err(|e| FormularyError::Provider(format!("{} request failed: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().unwrap_or_default();
        return Err(FormularyError::Provider(format!(
            "{} returned {}: {}",
            provider, status, detail
        )));
    }

    response
        .json()
        .map_err(|e| FormularyError::Provider(format!("{} sent an unreadable reply: {}", provider, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = LlmConfig::default()
            .with_model("small-model")
            .with_timeout_secs(5);
        assert_eq!(config.model, "small-model");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn test_secret_header_is_sensitive() {
        let value = secret_header("sk-test").unwrap();
        assert!(value.is_sensitive());
        assert!(secret_header("bad\nkey").is_err());
    }

    #[test]
    fn test_missing_env_key_is_config_error() {
        let err = api_key_from_env("FORMULARY_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, FormularyError::Config(_)));
    }
}
