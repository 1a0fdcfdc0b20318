//! Static operand typing.
//!
//! Every node is typed from the column types and literals alone, before any row
//! is evaluated, so a formula that cannot type-check is rejected even when the
//! rows it would touch are all null or the table is empty. A column whose type
//! is unknown (no non-null values) may hold any kind.

use std::fmt;

use crate::error::{FormularyError, Result};
use crate::table::{ColumnType, Table, Value};

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::ops::temporal_literal;

/// The set of value kinds an expression may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Kinds(u8);

impl Kinds {
    const NONE: Kinds = Kinds(0);
    const BOOL: Kinds = Kinds(1);
    const NUMBER: Kinds = Kinds(1 << 1);
    const TEXT: Kinds = Kinds(1 << 2);
    const TIME: Kinds = Kinds(1 << 3);
    const ANY: Kinds = Kinds(0b1111);

    const SINGLE: [(Kinds, &'static str); 4] = [
        (Kinds::BOOL, "boolean"),
        (Kinds::NUMBER, "number"),
        (Kinds::TEXT, "string"),
        (Kinds::TIME, "date"),
    ];

    fn of_column(column_type: ColumnType) -> Kinds {
        match column_type {
            ColumnType::Boolean => Kinds::BOOL,
            ColumnType::Integer | ColumnType::Float => Kinds::NUMBER,
            ColumnType::String => Kinds::TEXT,
            ColumnType::Date | ColumnType::DateTime => Kinds::TIME,
            ColumnType::Unknown => Kinds::ANY,
        }
    }

    fn of_value(value: &Value) -> Kinds {
        value.column_type().map_or(Kinds::ANY, Kinds::of_column)
    }

    fn intersects(self, other: Kinds) -> bool {
        self.0 & other.0 != 0
    }

    fn union(self, other: Kinds) -> Kinds {
        Kinds(self.0 | other.0)
    }

    fn members(self) -> impl Iterator<Item = Kinds> {
        Kinds::SINGLE
            .into_iter()
            .map(|(kind, _)| kind)
            .filter(move |kind| self.intersects(*kind))
    }

    /// Whether a boolean result is possible.
    pub(crate) fn may_be_boolean(self) -> bool {
        self.intersects(Kinds::BOOL)
    }
}

impl fmt::Display for Kinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Kinds::ANY {
            return f.write_str("unknown");
        }
        let names: Vec<&str> = Kinds::SINGLE
            .iter()
            .filter(|(kind, _)| self.intersects(*kind))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" or "))
    }
}

/// Type an expression against the table's column types.
pub(crate) fn check(expr: &Expr, table: &Table) -> Result<Kinds> {
    match expr {
        Expr::Literal(value) => Ok(Kinds::of_value(value)),

        Expr::Column(name) => table
            .column(name)
            .map(|column| Kinds::of_column(column.column_type()))
            .ok_or_else(|| FormularyError::UnknownColumn { name: name.clone() }),

        Expr::Unary { op, operand } => {
            let inner = check(operand, table)?;
            let (wanted, symbol) = match op {
                UnaryOperator::Not => (Kinds::BOOL, "not"),
                UnaryOperator::Negate => (Kinds::NUMBER, "-"),
                UnaryOperator::Plus => (Kinds::NUMBER, "+"),
            };
            if inner.intersects(wanted) {
                Ok(wanted)
            } else {
                Err(FormularyError::type_mismatch(format!(
                    "'{}' is not supported for {}",
                    symbol, inner
                )))
            }
        }

        Expr::Binary { op, left, right } => {
            let (l, r) = (check(left, table)?, check(right, table)?);
            let result = combine(l, r, |a, b| binary_result(*op, a, b));
            if result == Kinds::NONE {
                return Err(mismatch(op.symbol(), l, r));
            }
            Ok(result)
        }

        Expr::Compare { first, rest } => {
            let mut prev_expr: &Expr = first;
            let mut prev = check(first, table)?;
            for (op, operand) in rest {
                let next = check(operand, table)?;
                if !comparable(prev, prev_expr, next, operand) {
                    return Err(mismatch(op.symbol(), prev, next));
                }
                prev_expr = operand;
                prev = next;
            }
            Ok(Kinds::BOOL)
        }
    }
}

/// Union of the results over every pairing of possible operand kinds.
fn combine(left: Kinds, right: Kinds, rule: impl Fn(Kinds, Kinds) -> Option<Kinds>) -> Kinds {
    left.members()
        .flat_map(|l| right.members().map(move |r| (l, r)))
        .filter_map(|(l, r)| rule(l, r))
        .fold(Kinds::NONE, Kinds::union)
}

fn binary_result(op: BinaryOperator, left: Kinds, right: Kinds) -> Option<Kinds> {
    let both = |kind: Kinds| left == kind && right == kind;
    match op {
        BinaryOperator::And | BinaryOperator::Or => both(Kinds::BOOL).then_some(Kinds::BOOL),
        BinaryOperator::Add if both(Kinds::TEXT) => Some(Kinds::TEXT),
        BinaryOperator::Subtract if both(Kinds::TIME) => Some(Kinds::NUMBER),
        _ => both(Kinds::NUMBER).then_some(Kinds::NUMBER),
    }
}

fn comparable(left: Kinds, left_expr: &Expr, right: Kinds, right_expr: &Expr) -> bool {
    let pairs = combine(left, right, |a, b| {
        let ok = a == b
            || (a == Kinds::TIME && b == Kinds::TEXT && may_be_temporal_text(right_expr))
            || (a == Kinds::TEXT && b == Kinds::TIME && may_be_temporal_text(left_expr));
        ok.then_some(Kinds::BOOL)
    });
    pairs != Kinds::NONE
}

/// String literals are known up front; string columns are checked per row.
fn may_be_temporal_text(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Value::Str(s)) => temporal_literal(s).is_some(),
        _ => true,
    }
}

fn mismatch(op: &str, left: Kinds, right: Kinds) -> FormularyError {
    FormularyError::type_mismatch(format!(
        "unsupported operand types for '{}': {} and {}",
        op, left, right
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse_expression;
    use crate::table::Column;

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new("Price", vec![Value::Int(10), Value::Null]),
            Column::new("Region", vec![Value::from("EU"), Value::from("US")]),
            Column::new("Active", vec![Value::Bool(true), Value::Null]),
            Column::new("Empty", vec![Value::Null, Value::Null]),
        ])
        .unwrap()
    }

    fn kinds(text: &str) -> Result<Kinds> {
        check(&parse_expression(text).unwrap(), &table())
    }

    #[test]
    fn test_arithmetic_kinds() {
        assert_eq!(kinds("Price * 2 + 1").unwrap(), Kinds::NUMBER);
        assert_eq!(kinds("Region + '!'").unwrap(), Kinds::TEXT);
        assert!(kinds("Region * 2").is_err());
        assert!(kinds("Active + 1").is_err());
    }

    #[test]
    fn test_comparisons_are_boolean() {
        assert_eq!(kinds("Price > 5").unwrap(), Kinds::BOOL);
        assert_eq!(kinds("0 < Price < 100").unwrap(), Kinds::BOOL);
        let err = kinds("Price > 'ten'").unwrap_err();
        assert!(err.to_string().contains("number and string"));
        assert!(kinds("1 < Price < 'x'").is_err());
    }

    #[test]
    fn test_boolean_operators_need_booleans() {
        assert_eq!(kinds("Active and Price > 1").unwrap(), Kinds::BOOL);
        assert!(kinds("Active or Price").is_err());
        assert!(kinds("not Region").is_err());
    }

    #[test]
    fn test_unknown_column_accepts_any_kind() {
        assert_eq!(kinds("Empty").unwrap(), Kinds::ANY);
        assert_eq!(kinds("Empty + 1").unwrap(), Kinds::NUMBER);
        assert_eq!(kinds("Empty + Empty").unwrap(), Kinds::NUMBER.union(Kinds::TEXT));
        assert!(kinds("Empty > 'ten'").is_ok());
        assert!(kinds("Empty and Active").is_ok());
    }

    #[test]
    fn test_may_be_boolean() {
        assert!(kinds("Price > 1").unwrap().may_be_boolean());
        assert!(kinds("Empty").unwrap().may_be_boolean());
        assert!(!kinds("Price * 2").unwrap().may_be_boolean());
        assert!(!kinds("Empty * 2").unwrap().may_be_boolean());
    }

    #[test]
    fn test_date_literals() {
        let dates = Table::from_columns(vec![Column::new(
            "Shipped",
            vec![Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())],
        )])
        .unwrap();
        let check_text = |text: &str| check(&parse_expression(text).unwrap(), &dates);
        assert!(check_text("Shipped > '2024-01-01'").is_ok());
        assert!(check_text("Shipped > 'soon'").is_err());
        assert_eq!(check_text("Shipped - Shipped").unwrap(), Kinds::NUMBER);
    }
}
