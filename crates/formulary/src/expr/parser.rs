//! Recursive descent parser for the formula language.
//!
//! Precedence (lowest to highest):
//! 1. `or` / `|`
//! 2. `and` / `&`
//! 3. `not` / `~`
//! 4. Comparison chains: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! 5. Addition/Subtraction: `+`, `-`
//! 6. Multiplication/Division: `*`, `/`
//! 7. Unary: `-`, `+`
//! 8. Primary: literals, column names, parentheses

use crate::error::{FormularyError, Result};
use crate::table::Value;

use super::ast::{BinaryOperator, CompareOperator, Expr, UnaryOperator};
use super::lexer::{tokenize, Spanned, Token};

/// Longest expression text accepted, in characters.
pub const MAX_EXPRESSION_LENGTH: usize = 4096;

/// Deepest nesting of parentheses and prefix operators accepted.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Tallest syntax tree accepted, counting every operator node. Long `a + b + ...`
/// chains nest one level per operator even without parentheses.
pub const MAX_TREE_DEPTH: usize = 256;

/// Parse expression text into an AST.
pub(crate) fn parse_expression(text: &str) -> Result<Expr> {
    let fail = |reason: String| FormularyError::syntax(text, reason);

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(fail("expression is empty".into()));
    }
    if trimmed.chars().count() > MAX_EXPRESSION_LENGTH {
        return Err(fail(format!(
            "expression is longer than {} characters",
            MAX_EXPRESSION_LENGTH
        )));
    }

    let tokens = tokenize(trimmed).map_err(fail)?;
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or().map_err(fail)?;

    if let Some(extra) = parser.current() {
        return Err(fail(format!(
            "unexpected '{}' at position {}",
            extra.token.describe(),
            extra.offset
        )));
    }

    if expr.depth() > MAX_TREE_DEPTH {
        return Err(fail(format!(
            "expression has more than {} nested operations",
            MAX_TREE_DEPTH
        )));
    }

    Ok(expr)
}

type ParseResult<T> = std::result::Result<T, String>;

struct ExprParser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    // === Helper methods ===

    fn current(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn check(&self, token: &Token) -> bool {
        self.current().is_some_and(|s| &s.token == token)
    }

    fn consume(&mut self) -> Option<&'a Spanned> {
        let spanned = self.tokens.get(self.pos);
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(format!(
                "expression is nested deeper than {} levels",
                MAX_NESTING_DEPTH
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.consume();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;

        while self.check(&Token::And) {
            self.consume();
            let right = self.parse_not()?;
            left = Expr::Binary {
                op: BinaryOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Not) {
            self.consume();
            self.enter()?;
            let operand = self.parse_not()?;
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.current().map(|s| &s.token) {
                Some(Token::EqualEqual) => CompareOperator::Equal,
                Some(Token::NotEqual) => CompareOperator::NotEqual,
                Some(Token::Less) => CompareOperator::LessThan,
                Some(Token::LessEqual) => CompareOperator::LessEqual,
                Some(Token::Greater) => CompareOperator::GreaterThan,
                Some(Token::GreaterEqual) => CompareOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            rest.push((op, self.parse_additive()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().map(|s| &s.token) {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().map(|s| &s.token) {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.current().map(|s| &s.token) {
            Some(Token::Minus) => UnaryOperator::Negate,
            Some(Token::Plus) => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.consume();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        // Fold negative literals so `-5` stays a constant
        if let (UnaryOperator::Negate, Expr::Literal(Value::Int(i))) = (op, &operand) {
            if let Some(neg) = i.checked_neg() {
                return Ok(Expr::Literal(Value::Int(neg)));
            }
        }

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(spanned) = self.consume() else {
            return Err("unexpected end of expression".into());
        };

        match &spanned.token {
            Token::Int(i) => Ok(Expr::Literal(Value::Int(*i))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(*f))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s.clone()))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),

            Token::Ident(name) => {
                if self.check(&Token::LeftParen) {
                    return Err(format!("function calls are not allowed ('{}')", name));
                }
                Ok(Expr::Column(name.clone()))
            }
            Token::Quoted(name) => {
                if self.check(&Token::LeftParen) {
                    return Err(format!("function calls are not allowed ('{}')", name));
                }
                Ok(Expr::Column(name.clone()))
            }

            Token::LeftParen => {
                self.enter()?;
                let expr = self.parse_or()?;
                self.leave();
                match self.consume() {
                    Some(Spanned {
                        token: Token::RightParen,
                        ..
                    }) => {}
                    Some(other) => {
                        return Err(format!(
                            "expected ')' but found '{}' at position {}",
                            other.token.describe(),
                            other.offset
                        ));
                    }
                    None => return Err("missing closing ')'".into()),
                }
                if self.check(&Token::LeftParen) {
                    return Err("calling an expression is not allowed".into());
                }
                Ok(expr)
            }

            other => Err(format!(
                "unexpected '{}' at position {}",
                other.describe(),
                spanned.offset
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(name.into()))
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression("Price * Quantity + 1").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOperator::Add,
                left: Box::new(Expr::Binary {
                    op: BinaryOperator::Multiply,
                    left: column("Price"),
                    right: column("Quantity"),
                }),
                right: Box::new(Expr::Literal(Value::Int(1))),
            }
        );
    }

    #[test]
    fn test_parse_comparison_chain() {
        let expr = parse_expression("0 < Price <= 100").unwrap();
        let Expr::Compare { first, rest } = expr else {
            panic!("expected comparison chain");
        };
        assert_eq!(*first, Expr::Literal(Value::Int(0)));
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[1].0, CompareOperator::LessEqual);
    }

    #[test]
    fn test_parse_boolean_operators() {
        let expr = parse_expression("a > 1 and not b | c").unwrap();
        assert_eq!(expr.to_string(), "(((a > 1) and (not b)) or c)");
    }

    #[test]
    fn test_parse_negative_literal() {
        assert_eq!(
            parse_expression("-5").unwrap(),
            Expr::Literal(Value::Int(-5))
        );
        assert!(matches!(
            parse_expression("-Price").unwrap(),
            Expr::Unary {
                op: UnaryOperator::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_backtick_columns() {
        let expr = parse_expression("`Flag_Total > 100` or `Unit Price` > 2").unwrap();
        assert_eq!(expr.columns(), vec!["Flag_Total > 100", "Unit Price"]);
    }

    #[test]
    fn test_rejects_function_calls() {
        let err = parse_expression("abs(Price)").unwrap_err();
        assert!(err.to_string().contains("function calls"));
        assert!(parse_expression("(Price)(1)").is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "   ", "Price +", "(Price", "Price)", "Price Quantity", "> 1", "not"] {
            let err = parse_expression(input).unwrap_err();
            assert!(
                matches!(err, FormularyError::Syntax { .. }),
                "{:?} should be a syntax error",
                input
            );
        }
    }

    #[test]
    fn test_syntax_error_keeps_expression() {
        match parse_expression("Price.__class__").unwrap_err() {
            FormularyError::Syntax { expression, reason } => {
                assert_eq!(expression, "Price.__class__");
                assert!(reason.contains("attribute access"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rejects_deep_nesting() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse_expression(&deep).is_err());
        let ok = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_expression(&ok).is_ok());
        assert!(parse_expression(&"-".repeat(200)).is_err());
    }

    #[test]
    fn test_rejects_long_operator_chains() {
        let chain = vec!["a"; MAX_TREE_DEPTH + 1].join("+");
        assert!(chain.len() < MAX_EXPRESSION_LENGTH);
        let err = parse_expression(&chain).unwrap_err();
        assert!(err.to_string().contains("nested operations"));

        let chain = vec!["a"; MAX_TREE_DEPTH].join(" * ");
        assert_eq!(parse_expression(&chain).unwrap().depth(), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_rejects_long_expressions() {
        let long = vec!["a"; MAX_EXPRESSION_LENGTH].join("+");
        assert!(parse_expression(&long).is_err());
    }
}
