//! Serve command - JSON API over a data file.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::LlmProviderChoice;
use crate::server::{app, state::AppState};

use super::{build_provider, open_session};

pub fn run(
    file: PathBuf,
    port: u16,
    llm: LlmProviderChoice,
    model: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(&file, None)?;
    let provider = build_provider(&llm, model)?;

    if verbose {
        if let Some(source) = session.source() {
            println!("Loaded {} ({} rows)", source.file, source.row_count);
        }
    }

    let state = match provider {
        Some(provider) => AppState::with_llm(session, provider),
        None => AppState::new(session),
    };

    let url = format!("http://localhost:{}", port);
    println!();
    println!(
        "{} {}",
        "Starting API server at".cyan().bold(),
        url.white().bold()
    );
    println!();
    println!("  File: {}", file.display());
    println!(
        "  LLM:  {}",
        state.llm_provider_name.as_deref().unwrap_or("disabled")
    );
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, port))?;

    Ok(())
}
