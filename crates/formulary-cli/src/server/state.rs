//! Application state for the web server.

use std::sync::Arc;
use tokio::sync::RwLock;

use formulary::{LlmProvider, Session, SuggestionSet};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The session being edited. Mutating handlers hold the write guard.
    pub session: Arc<RwLock<Session>>,
    /// Most recent validated suggestions, addressed by index when applying.
    pub suggestions: Arc<RwLock<SuggestionSet>>,
    /// Optional LLM provider for suggestions.
    /// If None, the suggestions endpoint is disabled.
    pub llm_provider: Option<Arc<dyn LlmProvider>>,
    /// Name of the configured LLM provider (for display).
    pub llm_provider_name: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            suggestions: Arc::new(RwLock::new(SuggestionSet::empty())),
            llm_provider: None,
            llm_provider_name: None,
        }
    }

    /// Create new application state with an LLM provider.
    pub fn with_llm(session: Session, provider: Arc<dyn LlmProvider>) -> Self {
        let name = provider.name().to_string();
        Self {
            llm_provider: Some(provider),
            llm_provider_name: Some(name),
            ..Self::new(session)
        }
    }
}
