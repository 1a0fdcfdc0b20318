//! Suggest command - ask a language model for derived columns and flag rules.

use std::path::PathBuf;

use colored::Colorize;
use formulary::{suggest_with, SuggestionSet};

use crate::cli::LlmProviderChoice;

use super::{build_provider, open_session};

pub fn run(
    file: PathBuf,
    query: String,
    llm: LlmProviderChoice,
    model: Option<String>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = build_provider(&llm, model)?
        .ok_or("No LLM provider selected. Use --llm anthropic, openai, gemini, ollama or mock.")?;
    let session = open_session(&file, None)?;
    let columns = session.column_names()?;

    if verbose {
        eprintln!("Asking {} about {} columns", provider.name(), columns.len());
    }

    // Provider and schema failures fall back to an empty set
    let suggestions = match suggest_with(provider.as_ref(), &query, &columns) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("{} {}", "Warning:".yellow(), e);
            SuggestionSet::empty()
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else {
        print_suggestions(&suggestions);
    }

    Ok(())
}

/// Print a suggestion set with the indices used by `apply-col` and `apply-flag`.
pub fn print_suggestions(suggestions: &SuggestionSet) {
    if suggestions.is_empty() {
        println!("{}", "No suggestions.".yellow());
        return;
    }

    if !suggestions.derived_columns.is_empty() {
        println!("{}", "Derived columns:".cyan().bold());
        for (i, s) in suggestions.derived_columns.iter().enumerate() {
            println!("  [{}] {} = {}", i, s.name.white().bold(), s.formula);
            if let Some(description) = &s.description {
                println!("      {}", description.dimmed());
            }
        }
    }

    if !suggestions.flag_rules.is_empty() {
        println!("{}", "Flag rules:".cyan().bold());
        for (i, s) in suggestions.flag_rules.iter().enumerate() {
            println!("  [{}] {}", i, s.rule.white().bold());
            if let Some(description) = &s.description {
                println!("      {}", description.dimmed());
            }
        }
    }
}
