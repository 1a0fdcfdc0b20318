//! LLM provider integration for formula suggestions.
//!
//! A provider turns a natural-language request plus the table's column names
//! into raw suggestion JSON. That output is untrusted: it always passes through
//! [`crate::suggestion::validate`] and only applied suggestions touch a table.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Gemini** - Google models via API (requires `GOOGLE_API_KEY`)
//! - **Ollama** - Local models, no API key needed (requires Ollama installed)
//! - **Mock** - Deterministic responses for tests and offline use
//!
//! # Example
//!
//! ```no_run
//! use formulary::{LlmProvider, OllamaProvider};
//!
//! let provider = OllamaProvider::new().unwrap();
//! let columns = vec!["Price".to_string(), "Quantity".to_string()];
//! let raw = provider.suggest_operations("flag large orders", &columns).unwrap();
//! let suggestions = formulary::suggestion::validate(&raw).unwrap();
//! ```

mod anthropic;
mod gemini;
mod mock;
mod ollama;
mod openai;
mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use prompts::{suggestion_prompt, system_prompt};
pub use provider::{LlmConfig, LlmProvider};
