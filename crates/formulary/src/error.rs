//! Error types for the Formulary library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Formulary operations.
#[derive(Debug, Error)]
pub enum FormularyError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The source could not be turned into a table.
    #[error("Failed to load '{source_name}': {message}")]
    Load {
        source_name: String,
        message: String,
    },

    /// Columns of unequal length or with clashing names.
    #[error("Invalid table shape: {0}")]
    Shape(String),

    /// Crop bounds outside the table or inverted.
    #[error("Invalid row range {start}..={end} for a table with {row_count} rows")]
    Range {
        start: usize,
        end: usize,
        row_count: usize,
    },

    /// Malformed or disallowed expression.
    #[error("Invalid expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    /// Expression references a column that does not exist.
    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    /// Operand types are incompatible with the operator.
    #[error("Type error: {message}")]
    TypeMismatch { message: String },

    /// A column with this name already exists.
    #[error("Column '{name}' already exists")]
    DuplicateName { name: String },

    /// The flag rule is already applied.
    #[error("Flag rule '{rule}' is already applied")]
    DuplicateRule { rule: String },

    /// Column name rejected before evaluation.
    #[error("Invalid column name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Suggestion data does not match the expected shape.
    #[error("Invalid suggestion data: {message}")]
    Schema { message: String },

    /// Index into a suggestion set is out of range.
    #[error("No suggested {kind} at index {index} ({available} available)")]
    SuggestionIndex {
        kind: &'static str,
        index: usize,
        available: usize,
    },

    /// Operation requires a loaded table.
    #[error("No table loaded")]
    NoTableLoaded,

    /// LLM provider request or response failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormularyError {
    /// Build a load failure for a named source.
    pub(crate) fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        FormularyError::Load {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Build a syntax failure carrying the original expression text.
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        FormularyError::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a type failure.
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        FormularyError::TypeMismatch {
            message: message.into(),
        }
    }

    /// Whether this error came from evaluating an expression.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            FormularyError::Syntax { .. }
                | FormularyError::UnknownColumn { .. }
                | FormularyError::TypeMismatch { .. }
        )
    }
}

/// Result type alias for Formulary operations.
pub type Result<T> = std::result::Result<T, FormularyError>;
