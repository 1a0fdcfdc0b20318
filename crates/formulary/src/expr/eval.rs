//! Vectorized tree evaluation against a table.

use crate::error::{FormularyError, Result};
use crate::table::{Table, Value};

use super::ast::{BinaryOperator, Expr};
use super::ops;

/// Intermediate result: a broadcastable constant or one value per row.
pub(crate) enum Operand<'a> {
    Scalar(Value),
    Column(&'a [Value]),
    Series(Vec<Value>),
}

impl Operand<'_> {
    fn get(&self, row: usize) -> &Value {
        match self {
            Operand::Scalar(v) => v,
            Operand::Column(values) => &values[row],
            Operand::Series(values) => &values[row],
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, Operand::Scalar(_))
    }
}

/// Evaluate an AST over every row of the table.
pub(crate) fn eval<'a>(expr: &Expr, table: &'a Table) -> Result<Operand<'a>> {
    let rows = table.row_count();

    match expr {
        Expr::Literal(value) => Ok(Operand::Scalar(value.clone())),

        Expr::Column(name) => table
            .column(name)
            .map(|c| Operand::Column(c.values()))
            .ok_or_else(|| FormularyError::UnknownColumn { name: name.clone() }),

        Expr::Unary { op, operand } => {
            let operand = eval(operand, table)?;
            map1(&operand, rows, |v| ops::unary(*op, v))
        }

        Expr::Binary { op, left, right } => {
            let left = eval(left, table)?;
            let right = eval(right, table)?;
            match op {
                BinaryOperator::And | BinaryOperator::Or => {
                    let symbol = op.symbol();
                    let is_and = *op == BinaryOperator::And;
                    map2(&left, &right, rows, |a, b| {
                        let (a, b) = (ops::truthy(symbol, a)?, ops::truthy(symbol, b)?);
                        Ok(Value::Bool(if is_and { a && b } else { a || b }))
                    })
                }
                _ => map2(&left, &right, rows, |a, b| ops::arithmetic(*op, a, b)),
            }
        }

        Expr::Compare { first, rest } => {
            let mut operands = Vec::with_capacity(rest.len() + 1);
            operands.push(eval(first, table)?);
            for (_, operand) in rest {
                operands.push(eval(operand, table)?);
            }

            let mut result: Option<Operand> = None;
            for (i, (op, _)) in rest.iter().enumerate() {
                let link = map2(&operands[i], &operands[i + 1], rows, |a, b| {
                    ops::compare(*op, a, b).map(Value::Bool)
                })?;
                result = Some(match result {
                    None => link,
                    Some(acc) => map2(&acc, &link, rows, |a, b| {
                        Ok(Value::Bool(a.as_bool() == Some(true) && b.as_bool() == Some(true)))
                    })?,
                });
            }
            // The parser never builds an empty chain
            result.ok_or_else(|| FormularyError::type_mismatch("empty comparison"))
        }
    }
}

fn map1<'a, F>(operand: &Operand<'_>, rows: usize, f: F) -> Result<Operand<'a>>
where
    F: Fn(&Value) -> Result<Value>,
{
    if let Operand::Scalar(v) = operand {
        return Ok(Operand::Scalar(f(v)?));
    }
    let values = (0..rows)
        .map(|row| f(operand.get(row)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Operand::Series(values))
}

fn map2<'a, F>(left: &Operand<'_>, right: &Operand<'_>, rows: usize, f: F) -> Result<Operand<'a>>
where
    F: Fn(&Value, &Value) -> Result<Value>,
{
    if left.is_scalar() && right.is_scalar() {
        return Ok(Operand::Scalar(f(left.get(0), right.get(0))?));
    }
    let values = (0..rows)
        .map(|row| f(left.get(row), right.get(row)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Operand::Series(values))
}
