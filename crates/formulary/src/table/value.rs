//! Scalar cell values and column types.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};

/// Data type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers (no decimal point).
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values (true/false).
    Boolean,
    /// Text/string values.
    String,
    /// Date only (no time component).
    Date,
    /// Date and time.
    DateTime,
    /// Every value is null, so no type can be determined.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }

    /// Lowercase name used in messages and listings.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Unknown => "unknown",
        }
    }

    /// The common type two column types can be widened to, if any.
    pub(crate) fn unify(self, other: ColumnType) -> Option<ColumnType> {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Unknown, b) => Some(b),
            (a, Unknown) => Some(a),
            (Integer, Float) | (Float, Integer) => Some(Float),
            (Date, DateTime) | (DateTime, Date) => Some(DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Type of this value, `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Str(_) => Some(ColumnType::String),
            Value::Date(_) => Some(ColumnType::Date),
            Value::DateTime(_) => Some(ColumnType::DateTime),
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value (integers widen to float).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the value's type for error messages.
    pub fn type_name(&self) -> &'static str {
        self.column_type().map_or("null", |t| t.label())
    }

    /// Convert the value to the given column type where that is a widening.
    pub(crate) fn widen_to(self, target: ColumnType) -> Value {
        match (self, target) {
            (Value::Int(i), ColumnType::Float) => Value::Float(i as f64),
            (Value::Date(d), ColumnType::DateTime) => Value::DateTime(d.and_time(NaiveTime::MIN)),
            (v, _) => v,
        }
    }

    /// Stable textual form used for CSV export.
    ///
    /// Floats always carry a fractional part (`20.0`), NaN is written as an empty
    /// field and booleans are capitalised.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => render_float(*f),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Str(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn render_float(f: f64) -> String {
    if f.is_nan() {
        String::new()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "inf" } else { "-inf" };
        sign.to_string()
    } else {
        // Debug keeps the shortest round-trip digits and the trailing `.0`.
        format!("{:?}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) if f.is_nan() => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Str(s) => serializer.serialize_str(s),
            other => serializer.serialize_str(&other.render()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
