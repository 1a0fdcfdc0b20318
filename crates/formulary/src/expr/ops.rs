//! Scalar operator semantics shared by every evaluation path.

use std::cmp::Ordering;

use chrono::{NaiveDateTime, NaiveTime};

use crate::error::{FormularyError, Result};
use crate::input::{parse_date, parse_datetime};
use crate::table::Value;

use super::ast::{BinaryOperator, CompareOperator, UnaryOperator};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Apply an arithmetic operator. Null on either side yields null.
pub(crate) fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    use Value::*;

    let value = match (left, right) {
        (Null, _) | (_, Null) => Null,
        (Int(a), Int(b)) => int_arithmetic(op, *a, *b),
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            let (a, b) = (numeric(left), numeric(right));
            match op {
                BinaryOperator::Add => Float(a + b),
                BinaryOperator::Subtract => Float(a - b),
                BinaryOperator::Multiply => Float(a * b),
                BinaryOperator::Divide => Float(a / b),
                BinaryOperator::And | BinaryOperator::Or => return Err(mismatch(op.symbol(), left, right)),
            }
        }
        (Str(a), Str(b)) if op == BinaryOperator::Add => Str(format!("{}{}", a, b)),
        (Date(a), Date(b)) if op == BinaryOperator::Subtract => Int((*a - *b).num_days()),
        (Date(_) | DateTime(_), Date(_) | DateTime(_)) if op == BinaryOperator::Subtract => {
            let delta = as_datetime(left) - as_datetime(right);
            Float(delta.num_milliseconds() as f64 / MILLIS_PER_DAY)
        }
        _ => return Err(mismatch(op.symbol(), left, right)),
    };
    Ok(value)
}

fn int_arithmetic(op: BinaryOperator, a: i64, b: i64) -> Value {
    let checked = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => return Value::Float(a as f64 / b as f64),
        BinaryOperator::And | BinaryOperator::Or => None,
    };
    match checked {
        Some(v) => Value::Int(v),
        // Overflow falls back to float
        None => {
            let (a, b) = (a as f64, b as f64);
            Value::Float(match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                _ => a * b,
            })
        }
    }
}

/// Compare two values. Null compares false except under `!=`.
pub(crate) fn compare(op: CompareOperator, left: &Value, right: &Value) -> Result<bool> {
    if left.is_null() || right.is_null() {
        return Ok(op == CompareOperator::NotEqual);
    }

    let ordering = ordering(left, right).ok_or_else(|| mismatch(op.symbol(), left, right))?;

    // NaN is unordered: only != holds
    let Some(ordering) = ordering else {
        return Ok(op == CompareOperator::NotEqual);
    };

    Ok(match op {
        CompareOperator::Equal => ordering == Ordering::Equal,
        CompareOperator::NotEqual => ordering != Ordering::Equal,
        CompareOperator::LessThan => ordering == Ordering::Less,
        CompareOperator::LessEqual => ordering != Ordering::Greater,
        CompareOperator::GreaterThan => ordering == Ordering::Greater,
        CompareOperator::GreaterEqual => ordering != Ordering::Less,
    })
}

/// `None` when the values cannot be compared, `Some(None)` when unordered (NaN).
fn ordering(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    use Value::*;

    match (left, right) {
        (Int(a), Int(b)) => Some(Some(a.cmp(b))),
        (Int(_) | Float(_), Int(_) | Float(_)) => Some(numeric(left).partial_cmp(&numeric(right))),
        (Str(a), Str(b)) => Some(Some(a.cmp(b))),
        (Bool(a), Bool(b)) => Some(Some(a.cmp(b))),
        (Date(a), Date(b)) => Some(Some(a.cmp(b))),
        (Date(_) | DateTime(_), Date(_) | DateTime(_)) => {
            Some(Some(as_datetime(left).cmp(&as_datetime(right))))
        }
        (Date(_) | DateTime(_), Str(s)) => {
            let other = temporal_literal(s)?;
            Some(Some(as_datetime(left).cmp(&other)))
        }
        (Str(s), Date(_) | DateTime(_)) => {
            let other = temporal_literal(s)?;
            Some(Some(other.cmp(&as_datetime(right))))
        }
        _ => None,
    }
}

/// Truth value for boolean combinators; null counts as false.
pub(crate) fn truthy(op: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(FormularyError::type_mismatch(format!(
            "'{}' requires boolean operands, got {}",
            op,
            other.type_name()
        ))),
    }
}

/// Apply a prefix operator. Null stays null.
pub(crate) fn unary(op: UnaryOperator, value: &Value) -> Result<Value> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOperator::Negate, Value::Int(i)) => Ok(i
            .checked_neg()
            .map_or(Value::Float(-(*i as f64)), Value::Int)),
        (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::Plus, Value::Int(_) | Value::Float(_)) => Ok(value.clone()),
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Not, other) => Err(FormularyError::type_mismatch(format!(
            "'not' requires a boolean operand, got {}",
            other.type_name()
        ))),
        (_, other) => Err(FormularyError::type_mismatch(format!(
            "unary '{}' is not supported for {}",
            if op == UnaryOperator::Negate { "-" } else { "+" },
            other.type_name()
        ))),
    }
}

fn numeric(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn as_datetime(value: &Value) -> NaiveDateTime {
    match value {
        Value::Date(d) => d.and_time(NaiveTime::MIN),
        Value::DateTime(dt) => *dt,
        _ => NaiveDateTime::MIN,
    }
}

pub(crate) fn temporal_literal(s: &str) -> Option<NaiveDateTime> {
    parse_datetime(s).or_else(|| parse_date(s).map(|d| d.and_time(NaiveTime::MIN)))
}

fn mismatch(op: &str, left: &Value, right: &Value) -> FormularyError {
    FormularyError::type_mismatch(format!(
        "unsupported operand types for '{}': {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}
