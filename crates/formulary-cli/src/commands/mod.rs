//! CLI command implementations.

pub mod columns;
pub mod process;
pub mod serve;
pub mod shell;
pub mod suggest;

use std::path::Path;
use std::sync::Arc;

use formulary::{
    AnthropicProvider, GeminiProvider, LlmConfig, LlmProvider, LoadOptions, MockProvider,
    OllamaProvider, OpenAIProvider, Session, SessionConfig,
};

use crate::cli::LlmProviderChoice;

/// Build the chosen provider, or `None` when suggestions are disabled.
pub fn build_provider(
    choice: &LlmProviderChoice,
    model: Option<String>,
) -> formulary::Result<Option<Arc<dyn LlmProvider>>> {
    let with_model = |config: LlmConfig| match &model {
        Some(m) => config.with_model(m.clone()),
        None => config,
    };

    let provider: Arc<dyn LlmProvider> = match choice {
        LlmProviderChoice::None => return Ok(None),
        LlmProviderChoice::Anthropic => Arc::new(AnthropicProvider::from_env_with_config(
            with_model(LlmConfig::default()),
        )?),
        LlmProviderChoice::OpenAI => Arc::new(OpenAIProvider::from_env_with_config(
            with_model(OpenAIProvider::default_config()),
        )?),
        LlmProviderChoice::Gemini => Arc::new(GeminiProvider::from_env_with_config(
            with_model(GeminiProvider::default_config()),
        )?),
        LlmProviderChoice::Ollama => Arc::new(OllamaProvider::with_config(with_model(
            OllamaProvider::default_config(),
        ))?),
        LlmProviderChoice::Mock => Arc::new(MockProvider::new()),
    };
    Ok(Some(provider))
}

/// Open a session over a file.
pub fn open_session(file: &Path, sheet: Option<String>) -> formulary::Result<Session> {
    let mut load = LoadOptions::default();
    if let Some(sheet) = sheet {
        load = load.with_sheet(sheet);
    }
    let mut session = Session::with_config(SessionConfig::default().with_load_options(load));
    session.load_path(file)?;
    Ok(session)
}
