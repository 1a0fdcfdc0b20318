//! Cell-level type detection for text sources.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{Column, Value};

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("valid date regex"));

static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}[ T]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?$")
        .expect("valid datetime regex")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Check if a value represents a missing/null value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
}

/// Parse an ISO-style date.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if !DATE_PATTERN.is_match(trimmed) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Parse an ISO-style datetime.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if !DATETIME_PATTERN.is_match(trimmed) {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Detect the typed value of a single text cell.
fn detect_value(raw: &str) -> Value {
    if is_null_value(raw) {
        return Value::Null;
    }
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    // Rust also accepts "inf" and "infinity"; those stay text.
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    if let Some(d) = parse_date(trimmed) {
        return Value::Date(d);
    }
    if let Some(dt) = parse_datetime(trimmed) {
        return Value::DateTime(dt);
    }
    Value::Str(raw.to_string())
}

/// Build a typed column from raw text cells.
///
/// When the detected cell types cannot be unified the column keeps every cell's
/// original text rather than a re-rendered form.
pub(crate) fn typed_column(name: &str, raw: &[String]) -> Column {
    let values: Vec<Value> = raw.iter().map(|s| detect_value(s)).collect();
    let column = Column::new(name, values);

    if column.column_type() == crate::table::ColumnType::String {
        let text = raw
            .iter()
            .map(|s| {
                if is_null_value(s) {
                    Value::Null
                } else {
                    Value::Str(s.clone())
                }
            })
            .collect();
        return Column::new(name, text);
    }
    column
}

/// Make header names unique: empty names become `column_<n>`, repeats get `.1`, `.2`, ...
pub(crate) fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("column_{}", i + 1)
        } else {
            header
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_null_value() {
        assert!(is_null_value(""));
        assert!(is_null_value("NA"));
        assert!(is_null_value("na"));
        assert!(is_null_value("N/A"));
        assert!(is_null_value("null"));
        assert!(is_null_value("NaN"));
        assert!(!is_null_value("value"));
        assert!(!is_null_value("0"));
    }

    #[test]
    fn test_integer_column() {
        let col = typed_column("q", &strings(&["2", "1", ""]));
        assert_eq!(col.column_type(), ColumnType::Integer);
        assert_eq!(col.values()[2], Value::Null);
    }

    #[test]
    fn test_float_column() {
        let col = typed_column("p", &strings(&["10", "2.5"]));
        assert_eq!(col.column_type(), ColumnType::Float);
        assert_eq!(col.values()[0], Value::Float(10.0));
    }

    #[test]
    fn test_boolean_column() {
        let col = typed_column("b", &strings(&["True", "false", "TRUE"]));
        assert_eq!(col.column_type(), ColumnType::Boolean);
    }

    #[test]
    fn test_date_column() {
        let col = typed_column("d", &strings(&["2024-01-01", "2024/02/03"]));
        assert_eq!(col.column_type(), ColumnType::Date);
    }

    #[test]
    fn test_mixed_date_and_datetime() {
        let col = typed_column("d", &strings(&["2024-01-01", "2024-01-02 10:30:00"]));
        assert_eq!(col.column_type(), ColumnType::DateTime);
    }

    #[test]
    fn test_mixed_column_keeps_original_text() {
        let col = typed_column("id", &strings(&["007", "P001"]));
        assert_eq!(col.column_type(), ColumnType::String);
        assert_eq!(col.values()[0], Value::Str("007".into()));
    }

    #[test]
    fn test_inf_stays_text() {
        let col = typed_column("w", &strings(&["inf", "abc"]));
        assert_eq!(col.column_type(), ColumnType::String);
    }

    #[test]
    fn test_dedupe_headers() {
        let headers = dedupe_headers(strings(&["a", "", "a", "a"]));
        assert_eq!(headers, vec!["a", "column_2", "a.1", "a.2"]);
    }
}
