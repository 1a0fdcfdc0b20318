//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Formulary: formula-driven derived columns and flag rules for spreadsheets
#[derive(Parser)]
#[command(name = "formulary")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the columns of a data file
    Columns {
        /// Path to the data file (CSV/TSV/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Worksheet to read, by name or 0-based index
        #[arg(long)]
        sheet: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Crop, derive and flag in one pass, then export CSV
    Process {
        /// Path to the data file (CSV/TSV/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Worksheet to read, by name or 0-based index
        #[arg(long)]
        sheet: Option<String>,

        /// Keep only rows START:END (inclusive, 0-based)
        #[arg(long, value_name = "START:END")]
        crop: Option<RowRange>,

        /// Add a derived column, applied in order
        #[arg(long = "derive", value_name = "NAME=FORMULA")]
        derive: Vec<Derivation>,

        /// Add a flag rule, applied after all derived columns
        #[arg(long = "flag", value_name = "RULE")]
        flag: Vec<String>,

        /// Output path for the CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask a language model for derived columns and flag rules
    Suggest {
        /// Path to the data file (CSV/TSV/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// What you want to compute or flag
        #[arg(short, long)]
        query: String,

        /// LLM provider to use
        #[arg(long, default_value = "anthropic")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific, e.g., "gpt-4o", "llama3.2")
        #[arg(long)]
        model: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session over a data file
    Shell {
        /// Path to the data file (CSV/TSV/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// LLM provider for the `suggest` command
        #[arg(long, default_value = "none")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific)
        #[arg(long)]
        model: Option<String>,
    },

    /// Serve a JSON API over a data file
    Serve {
        /// Path to the data file (CSV/TSV/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Port for web server
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// LLM provider for the suggestions endpoint
        #[arg(long, default_value = "none")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific)
        #[arg(long)]
        model: Option<String>,
    },
}

/// Inclusive row range given as `START:END`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl std::str::FromStr for RowRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid range '{}'. Use START:END, e.g. 0:99.", s))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid row index '{}' in range '{}'", part, s))
        };
        Ok(RowRange {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

/// A derived column given as `NAME=FORMULA`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    pub name: String,
    pub formula: String,
}

impl std::str::FromStr for Derivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, formula) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid derivation '{}'. Use NAME=FORMULA.", s))?;
        let (name, formula) = (name.trim(), formula.trim());
        if name.is_empty() || formula.is_empty() {
            return Err(format!("Invalid derivation '{}'. Use NAME=FORMULA.", s));
        }
        Ok(Derivation {
            name: name.to_string(),
            formula: formula.to_string(),
        })
    }
}

/// LLM provider choice for suggestions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// No LLM - suggestions disabled
    #[default]
    None,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Google Gemini API (requires GOOGLE_API_KEY)
    Gemini,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider for testing
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "gemini" | "google" => Ok(LlmProviderChoice::Gemini),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, anthropic, openai, gemini, ollama, or mock.",
                s
            )),
        }
    }
}

impl LlmProviderChoice {
    /// Canonical name, as accepted by `--llm`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProviderChoice::None => "none",
            LlmProviderChoice::Anthropic => "anthropic",
            LlmProviderChoice::OpenAI => "openai",
            LlmProviderChoice::Gemini => "gemini",
            LlmProviderChoice::Ollama => "ollama",
            LlmProviderChoice::Mock => "mock",
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
