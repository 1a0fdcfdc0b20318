//! Mock LLM provider for testing.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::error::{FormularyError, Result};
use crate::expr::Expr;

use super::provider::{LlmConfig, LlmProvider};

/// Mock LLM provider that returns predictable responses for testing.
///
/// Without a canned response it proposes the product of the first two columns
/// and a positivity flag on the first one, so the output is always evaluable
/// against numeric tables.
pub struct MockProvider {
    config: LlmConfig,
    response: Option<Value>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider.
    pub fn new() -> Self {
        Self::with_config(LlmConfig::default().with_model("mock"))
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Self {
        Self {
            config,
            response: None,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the given raw JSON.
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Always fail with a provider error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    fn column_aware_response(columns: &[String]) -> Value {
        let reference = |name: &String| Expr::Column(name.clone()).to_string();

        let derived_columns = match columns {
            [first, second, ..] => vec![json!({
                "name": format!("{}_x_{}", first, second).replace(' ', "_"),
                "formula": format!("{} * {}", reference(first), reference(second)),
                "description": format!("Product of {} and {}", first, second),
            })],
            _ => Vec::new(),
        };

        let flag_rules = match columns.first() {
            Some(first) => vec![json!({
                "rule": format!("{} > 0", reference(first)),
                "description": format!("{} is positive", first),
            })],
            None => Vec::new(),
        };

        json!({
            "derived_columns": derived_columns,
            "flag_rules": flag_rules,
        })
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for MockProvider {
    fn suggest_operations(&self, query: &str, columns: &[String]) -> Result<Value> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(FormularyError::Provider(message.clone()));
        }

        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| Self::column_aware_response(columns)))
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}
