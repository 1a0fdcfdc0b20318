//! Formulary: formula-driven derived columns and flag rules for tabular data.
//!
//! Formulary loads a spreadsheet or delimited file, lets you add columns computed
//! from safe pandas-style expressions, flags rows with boolean rules, and keeps an
//! ordered history of every change so it can be inspected, undone or replayed.
//!
//! # Core Principles
//!
//! - **Safe expressions**: Formulas are parsed by a restricted grammar; no code runs
//! - **Atomic edits**: Every apply either succeeds completely or changes nothing
//! - **Full provenance**: Each derived column and flag rule is recorded in a ledger
//! - **Untrusted suggestions**: Model output is validated before it can be applied
//!
//! # Example
//!
//! ```no_run
//! use formulary::Session;
//!
//! let mut session = Session::new();
//! session.load_path("orders.csv").unwrap();
//! session.apply_derived_column("Total", "Price * Quantity", None).unwrap();
//! session.apply_flag_rule("Total > 100", None).unwrap();
//!
//! println!("{}", session.export_csv_string().unwrap());
//! ```

pub mod error;
pub mod expr;
pub mod history;
pub mod input;
pub mod llm;
pub mod suggestion;
pub mod table;

mod session;

pub use error::{FormularyError, Result};
pub use expr::{evaluate, Expression, Series};
pub use history::{DerivedColumnRecord, FlagRuleRecord, Ledger, ReplayReport};
pub use input::{LoadOptions, ParserConfig, SourceFormat, SourceMetadata};
pub use llm::{
    AnthropicProvider, GeminiProvider, LlmConfig, LlmProvider, MockProvider, OllamaProvider,
    OpenAIProvider,
};
pub use session::{suggest_with, LoadOutcome, Session, SessionConfig};
pub use suggestion::{validate, SuggestionSet};
pub use table::{Column, ColumnType, Table, Value};
