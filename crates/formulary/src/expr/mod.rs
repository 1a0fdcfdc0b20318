//! Formula language: parsing and vectorized evaluation.
//!
//! Formulas are pandas-style column expressions such as `Price * Quantity` or
//! `Total > 100 and Region == 'EU'`. Only arithmetic, comparison and boolean
//! operators over column names and literals are understood; function calls,
//! attribute access, indexing and assignment are rejected at parse time, so
//! untrusted text from users or a language model can be evaluated safely.

mod ast;
mod eval;
mod lexer;
mod ops;
mod parser;
mod types;

use std::fmt;

use tracing::trace;

use crate::error::{FormularyError, Result};
use crate::table::{Column, ColumnType, Table, Value};

pub use ast::{BinaryOperator, CompareOperator, Expr, UnaryOperator};
pub use parser::{MAX_EXPRESSION_LENGTH, MAX_NESTING_DEPTH, MAX_TREE_DEPTH};

use eval::Operand;

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    ast: Expr,
}

impl Expression {
    /// Parse formula text.
    pub fn parse(text: &str) -> Result<Self> {
        let ast = parser::parse_expression(text)?;
        Ok(Self {
            text: text.trim().to_string(),
            ast,
        })
    }

    /// The formula text, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The syntax tree.
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Referenced column names in source order.
    pub fn columns(&self) -> Vec<&str> {
        self.ast.columns()
    }

    /// Evaluate against every row of a table.
    ///
    /// Unknown columns are reported before anything is computed, naming the
    /// first one in source order. Operand types are then checked against the
    /// column types, so a mismatch fails even on null or empty data. Constant
    /// expressions are broadcast.
    pub fn evaluate(&self, table: &Table) -> Result<Series> {
        if let Some(missing) = self.columns().into_iter().find(|c| !table.contains_column(c)) {
            return Err(FormularyError::UnknownColumn {
                name: missing.to_string(),
            });
        }

        let kinds = types::check(&self.ast, table)?;

        trace!(expression = %self.text, rows = table.row_count(), "evaluating");

        let mut series = match eval::eval(&self.ast, table)? {
            Operand::Scalar(value) => {
                let column_type = value.column_type().unwrap_or_default();
                Series {
                    values: vec![value; table.row_count()],
                    column_type,
                    may_be_boolean: true,
                }
            }
            Operand::Column(values) => Series::from_values(values.to_vec()),
            Operand::Series(values) => Series::from_values(values),
        };
        series.may_be_boolean = kinds.may_be_boolean();
        Ok(series)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse and evaluate formula text in one step.
pub fn evaluate(table: &Table, expression: &str) -> Result<Series> {
    Expression::parse(expression)?.evaluate(table)
}

/// The result of evaluating a formula: one value per row and their common type.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: Vec<Value>,
    column_type: ColumnType,
    may_be_boolean: bool,
}

impl Series {
    fn from_values(values: Vec<Value>) -> Self {
        let column = Column::new(String::new(), values);
        let column_type = column.column_type();
        Self {
            values: column.into_values(),
            column_type,
            may_be_boolean: true,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the formula is boolean-typed and every value is boolean or null.
    ///
    /// A non-boolean formula fails this even when it produced no rows.
    pub fn is_boolean(&self) -> bool {
        self.may_be_boolean
            && matches!(self.column_type, ColumnType::Boolean | ColumnType::Unknown)
    }

    /// Turn the series into a named column.
    pub fn into_column(self, name: impl Into<String>) -> Column {
        Column::new(name, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Table {
        Table::from_columns(vec![
            Column::new("Price", vec![Value::Int(10), Value::Int(20)]),
            Column::new("Quantity", vec![Value::Int(2), Value::Int(10)]),
            Column::new("Region", vec![Value::from("EU"), Value::from("US")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_evaluate_product() {
        let series = evaluate(&inventory(), "Price * Quantity").unwrap();
        assert_eq!(series.column_type(), ColumnType::Integer);
        assert_eq!(series.values(), &[Value::Int(20), Value::Int(200)]);
    }

    #[test]
    fn test_evaluate_division_is_float() {
        let series = evaluate(&inventory(), "Price / Quantity").unwrap();
        assert_eq!(series.column_type(), ColumnType::Float);
        assert_eq!(series.values(), &[Value::Float(5.0), Value::Float(2.0)]);
    }

    #[test]
    fn test_evaluate_boolean_rule() {
        let series = evaluate(&inventory(), "Price > 15 and Region == 'US'").unwrap();
        assert!(series.is_boolean());
        assert_eq!(series.values(), &[Value::Bool(false), Value::Bool(true)]);
    }

    #[test]
    fn test_constant_is_broadcast() {
        let series = evaluate(&inventory(), "1 + 1").unwrap();
        assert_eq!(series.values(), &[Value::Int(2), Value::Int(2)]);
        assert_eq!(series.column_type(), ColumnType::Integer);
    }

    #[test]
    fn test_bare_column_copies_values() {
        let series = evaluate(&inventory(), "Region").unwrap();
        assert_eq!(series.column_type(), ColumnType::String);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_unknown_column_reported_first() {
        let err = evaluate(&inventory(), "Missing + 'x' * Other").unwrap_err();
        match err {
            FormularyError::UnknownColumn { name } => assert_eq!(name, "Missing"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_string_comparison_with_number_fails() {
        let err = evaluate(&inventory(), "Price > 'ten'").unwrap_err();
        assert!(matches!(err, FormularyError::TypeMismatch { .. }));
        assert!(err.is_evaluation_error());
    }

    #[test]
    fn test_type_mismatch_on_null_rows() {
        let table = Table::from_columns(vec![Column::new(
            "Price",
            vec![Value::Int(10), Value::Null],
        )])
        .unwrap();
        let cropped = table.crop(1, 1).unwrap();
        assert_eq!(cropped.column("Price").unwrap().column_type(), ColumnType::Integer);

        let err = evaluate(&cropped, "Price > 'ten'").unwrap_err();
        assert!(matches!(err, FormularyError::TypeMismatch { .. }));
        assert!(evaluate(&cropped, "Price > 5").unwrap().is_boolean());
    }

    #[test]
    fn test_empty_table_keeps_formula_type() {
        let empty = Table::from_columns(vec![
            Column::new("Price", Vec::new()),
            Column::new("Quantity", Vec::new()),
        ])
        .unwrap();

        assert!(evaluate(&empty, "Price > 15").unwrap().is_boolean());
        assert!(evaluate(&empty, "Price > 15 and not Quantity").unwrap().is_boolean());
        assert!(!evaluate(&empty, "Price * 2").unwrap().is_boolean());
        assert!(!evaluate(&empty, "Price + Quantity").unwrap().is_boolean());
        assert!(evaluate(&empty, "Price").unwrap().is_boolean());
    }

    #[test]
    fn test_expression_metadata() {
        let expr = Expression::parse("  Price * Price + Quantity ").unwrap();
        assert_eq!(expr.text(), "Price * Price + Quantity");
        assert_eq!(expr.columns(), vec!["Price", "Quantity"]);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let table = inventory();
        let before = table.clone();
        let first = evaluate(&table, "Price * 2 > Quantity").unwrap();
        let second = evaluate(&table, "Price * 2 > Quantity").unwrap();
        assert_eq!(first, second);
        assert_eq!(table, before);
    }
}
