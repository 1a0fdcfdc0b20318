//! Expression syntax tree.

use std::fmt;

use crate::table::Value;

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal number, string or boolean
    Literal(Value),
    /// Column reference
    Column(String),
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Arithmetic or boolean binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Comparison chain: `a < b <= c` holds when every adjacent pair holds
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOperator, Expr)>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    And,
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

impl CompareOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Equal => "==",
            CompareOperator::NotEqual => "!=",
            CompareOperator::LessThan => "<",
            CompareOperator::LessEqual => "<=",
            CompareOperator::GreaterThan => ">",
            CompareOperator::GreaterEqual => ">=",
        }
    }
}

impl Expr {
    /// Column names referenced by the expression, in source order, without repeats.
    pub fn columns(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    /// Height of the tree; a lone literal or column is 1.
    ///
    /// Walks with an explicit stack so arbitrarily deep trees can be measured.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, level)) = pending.pop() {
            deepest = deepest.max(level);
            match expr {
                Expr::Literal(_) | Expr::Column(_) => {}
                Expr::Unary { operand, .. } => pending.push((operand, level + 1)),
                Expr::Binary { left, right, .. } => {
                    pending.push((left, level + 1));
                    pending.push((right, level + 1));
                }
                Expr::Compare { first, rest } => {
                    pending.push((first, level + 1));
                    pending.extend(rest.iter().map(|(_, operand)| (operand, level + 1)));
                }
            }
        }
        deepest
    }

    fn collect_columns<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_columns(names),
            Expr::Binary { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Expr::Compare { first, rest } => {
                first.collect_columns(names);
                for (_, operand) in rest {
                    operand.collect_columns(names);
                }
            }
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "and" | "or" | "not" | "True" | "False" | "true" | "false")
}

/// Fully parenthesized canonical form.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Str(s)) => write!(f, "{:?}", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Column(name) if is_plain_identifier(name) => f.write_str(name),
            Expr::Column(name) => write!(f, "`{}`", name),
            Expr::Unary { op, operand } => match op {
                UnaryOperator::Negate => write!(f, "(-{})", operand),
                UnaryOperator::Plus => write!(f, "(+{})", operand),
                UnaryOperator::Not => write!(f, "(not {})", operand),
            },
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Compare { first, rest } => {
                write!(f, "({}", first)?;
                for (op, operand) in rest {
                    write!(f, " {} {}", op.symbol(), operand)?;
                }
                f.write_str(")")
            }
        }
    }
}
