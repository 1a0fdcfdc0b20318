//! All-or-nothing validation of suggestion data.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FormularyError, Result};

use super::set::{DerivedColumnSuggestion, FlagRuleSuggestion, SuggestionSet};

const DERIVED_COLUMNS: &str = "derived_columns";
const FLAG_RULES: &str = "flag_rules";

/// Validate parsed suggestion data.
///
/// The top level must be an object with `derived_columns` and `flag_rules`
/// arrays. Each derived entry needs non-empty string `name` and `formula`, each
/// flag entry a non-empty string `rule`; `description` may be a string, null or
/// absent. The first offending entry fails the whole set.
pub fn validate(raw: &Value) -> Result<SuggestionSet> {
    let object = raw
        .as_object()
        .ok_or_else(|| schema(format!("expected an object, got {}", kind(raw))))?;

    let derived_columns = section(object, DERIVED_COLUMNS)?
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<DerivedColumnSuggestion> {
            let entry = entry_object(DERIVED_COLUMNS, index, entry)?;
            Ok(DerivedColumnSuggestion {
                name: required_string(DERIVED_COLUMNS, index, entry, "name")?,
                formula: required_string(DERIVED_COLUMNS, index, entry, "formula")?,
                description: optional_string(DERIVED_COLUMNS, index, entry, "description")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let flag_rules = section(object, FLAG_RULES)?
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<FlagRuleSuggestion> {
            let entry = entry_object(FLAG_RULES, index, entry)?;
            Ok(FlagRuleSuggestion {
                rule: required_string(FLAG_RULES, index, entry, "rule")?,
                description: optional_string(FLAG_RULES, index, entry, "description")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        derived_columns = derived_columns.len(),
        flag_rules = flag_rules.len(),
        "validated suggestions"
    );

    Ok(SuggestionSet {
        derived_columns,
        flag_rules,
    })
}

/// Extract JSON from raw model output and validate it.
pub fn validate_str(text: &str) -> Result<SuggestionSet> {
    let json = extract_json(text);
    let raw: Value = serde_json::from_str(json)
        .map_err(|e| schema(format!("response is not valid JSON: {}", e)))?;
    validate(&raw)
}

/// Pull the JSON payload out of model output, handling markdown code fences.
pub fn extract_json(response: &str) -> &str {
    if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(response)
    } else {
        response.trim()
    }
}

fn section<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>> {
    match object.get(key) {
        Some(Value::Array(entries)) => Ok(entries),
        Some(other) => Err(schema(format!(
            "'{}' must be an array, got {}",
            key,
            kind(other)
        ))),
        None => Err(schema(format!("missing '{}'", key))),
    }
}

fn entry_object<'a>(section: &str, index: usize, entry: &'a Value) -> Result<&'a Map<String, Value>> {
    entry
        .as_object()
        .ok_or_else(|| schema(format!("{}[{}] must be an object, got {}", section, index, kind(entry))))
}

fn required_string(
    section: &str,
    index: usize,
    entry: &Map<String, Value>,
    field: &str,
) -> Result<String> {
    match entry.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(schema(format!(
            "{}[{}].{} is empty",
            section, index, field
        ))),
        Some(other) => Err(schema(format!(
            "{}[{}].{} must be a string, got {}",
            section,
            index,
            field,
            kind(other)
        ))),
        None => Err(schema(format!(
            "{}[{}] is missing '{}'",
            section, index, field
        ))),
    }
}

fn optional_string(
    section: &str,
    index: usize,
    entry: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>> {
    match entry.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(schema(format!(
            "{}[{}].{} must be a string, got {}",
            section,
            index,
            field,
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn schema(message: String) -> FormularyError {
    FormularyError::Schema { message }
}
