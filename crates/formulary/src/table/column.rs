//! A named, typed column of values.

use serde::Serialize;

use super::value::{ColumnType, Value};

/// A named column whose non-null values all share one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring its type from the values.
    ///
    /// Integers mixed with floats are widened to floats and dates mixed with
    /// datetimes to datetimes. Any other mix degrades to a string column holding
    /// each value's rendered text.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let column_type = infer_type(&values);
        let values = conform(values, column_type);
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// All values in row order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a row.
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Take the values out of the column.
    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Copy of the rows in `start..=end`.
    pub(crate) fn slice(&self, start: usize, end: usize) -> Column {
        Column {
            name: self.name.clone(),
            column_type: self.column_type,
            values: self.values[start..=end].to_vec(),
        }
    }
}

fn infer_type(values: &[Value]) -> ColumnType {
    let mut current = ColumnType::Unknown;
    for value in values {
        let Some(t) = value.column_type() else {
            continue;
        };
        match current.unify(t) {
            Some(unified) => current = unified,
            None => return ColumnType::String,
        }
    }
    current
}

fn conform(values: Vec<Value>, column_type: ColumnType) -> Vec<Value> {
    match column_type {
        ColumnType::Float | ColumnType::DateTime => values
            .into_iter()
            .map(|v| v.widen_to(column_type))
            .collect(),
        ColumnType::String => values
            .into_iter()
            .map(|v| match v {
                Value::Null | Value::Str(_) => v,
                other => Value::Str(other.render()),
            })
            .collect(),
        _ => values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_integer_column() {
        let col = Column::new("n", vec![Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(col.column_type(), ColumnType::Integer);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_mixed_numbers_widen_to_float() {
        let col = Column::new("n", vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(col.column_type(), ColumnType::Float);
        assert_eq!(col.values(), &[Value::Float(1.0), Value::Float(2.5)]);
    }

    #[test]
    fn test_incompatible_mix_becomes_string() {
        let col = Column::new("n", vec![Value::Int(1), Value::Str("x".into())]);
        assert_eq!(col.column_type(), ColumnType::String);
        assert_eq!(col.values(), &[Value::Str("1".into()), Value::Str("x".into())]);
    }

    #[test]
    fn test_all_null_is_unknown() {
        let col = Column::new("n", vec![Value::Null, Value::Null]);
        assert_eq!(col.column_type(), ColumnType::Unknown);
    }
}
