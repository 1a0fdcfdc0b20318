//! Prompt templates for suggestion requests.

use serde_json::Value;

use crate::error::{FormularyError, Result};
use crate::suggestion::extract_json;

/// System prompt shared by every provider.
pub fn system_prompt() -> &'static str {
    r#"You are a data analysis expert assistant for Formulary, a spreadsheet formula tool.

Your role is to propose derived columns and boolean flag rules that answer the user's request.

Guidelines:
- Only reference columns that exist in the table
- Write formulas in the restricted formula language described in the request
- Flag rules must evaluate to true or false for every row
- Keep names short and descriptive
- Always respond with valid JSON when requested"#
}

/// Build the suggestion prompt for a query over the given columns.
pub fn suggestion_prompt(query: &str, columns: &[String]) -> String {
    let column_list = if columns.is_empty() {
        "No columns available".to_string()
    } else {
        columns
            .iter()
            .map(|c| format!("  - {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Suggest derived columns and flag rules for a table.

## Columns
{}

## User Request
"{}"

## Formula Language
- Arithmetic: + - * / on numbers; + also joins strings
- Comparison: == != < <= > >= (chains like 0 < x < 10 are allowed)
- Boolean: and, or, not (also &, |, ~)
- Literals: numbers, 'quoted strings', True, False
- Column names are written bare; names with spaces or symbols go in backticks, e.g. `Unit Price`
- Function calls, attribute access, indexing and assignment are NOT allowed

## Task
Respond with a JSON object in exactly this shape:
{{
  "derived_columns": [
    {{"name": "example_name", "formula": "example_formula", "description": "what this does"}}
  ],
  "flag_rules": [
    {{"rule": "example_rule", "description": "what this flags"}}
  ]
}}"#,
        column_list, query
    )
}

/// Parse model output into JSON, handling markdown code blocks.
pub(crate) fn parse_json_response(response: &str) -> Result<Value> {
    serde_json::from_str(extract_json(response)).map_err(|e| FormularyError::Schema {
        message: format!("model response is not valid JSON: {}", e),
    })
}
