//! Precedence-climbing parser from tokens to [`Expr`].

use super::ast::{BinaryOp, Expr};
use super::error::{EvalError, EvalErrorKind};
use super::tokens::{Spanned, Token};

const ADDITIVE: u8 = 10;
const MULTIPLICATIVE: u8 = 20;
// Between Mul and Pow so that -2^2 parses as -(2^2).
const UNARY: u8 = 25;
const POWER: u8 = 30;

/// Deepest tree or parser recursion accepted. Keeps parsing, evaluation
/// and drop of the boxed tree well inside any thread's stack.
pub const MAX_DEPTH: usize = 512;

/// Parse tokens into an AST using precedence climbing.
///
/// Every token must be consumed; trailing input such as the `(3)` in
/// `2(3)` is an error because there is no implicit multiplication.
pub fn parse_expression(tokens: &[Spanned]) -> Result<Expr, EvalError> {
    if tokens.is_empty() {
        return Err(EvalError::unexpected_end());
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let (expr, _) = parser.parse_expr(0)?;

    match parser.current() {
        None => Ok(expr),
        Some(extra) => Err(unexpected(extra, "operator or end of input")),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    /// Current `parse_expr` recursion.
    depth: usize,
}

/// A parsed subtree and its height.
type Parsed = (Expr, usize);

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Parsed, EvalError> {
        self.depth += 1;
        let parsed = if self.depth > MAX_DEPTH {
            Err(self.too_deep())
        } else {
            self.parse_chain(min_precedence)
        };
        self.depth -= 1;
        parsed
    }

    fn parse_chain(&mut self, min_precedence: u8) -> Result<Parsed, EvalError> {
        let (mut left, mut height) = self.parse_prefix()?;

        while let Some(spanned) = self.current() {
            let Some((op, precedence)) = infix(&spanned.token) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            // Left-associative chains grow the tree without recursing.
            if height >= MAX_DEPTH {
                return Err(self.too_deep());
            }
            self.advance();

            // Power is right associative, everything else left.
            let next_precedence = if op == BinaryOp::Pow {
                precedence
            } else {
                precedence + 1
            };
            let (right, right_height) = self.parse_expr(next_precedence)?;
            height = self.grow(height.max(right_height))?;
            left = Expr::binary(op, left, right);
        }

        Ok((left, height))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, EvalError> {
        let spanned = self.current().ok_or_else(EvalError::unexpected_end)?;

        match spanned.token {
            Token::Number(n) => {
                self.advance();
                Ok((Expr::Number(n), 1))
            }
            Token::Constant(c) => {
                self.advance();
                Ok((Expr::Constant(c), 1))
            }
            Token::Minus => {
                self.advance();
                let (operand, height) = self.parse_expr(UNARY)?;
                Ok((Expr::neg(operand), self.grow(height)?))
            }
            Token::Plus => {
                self.advance();
                self.parse_expr(UNARY)
            }
            Token::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect_right_paren()?;
                Ok(inner)
            }
            Token::Function(func) => {
                self.advance();
                match self.current() {
                    Some(Spanned {
                        token: Token::LeftParen,
                        ..
                    }) => self.advance(),
                    Some(other) => return Err(unexpected(other, "(")),
                    None => return Err(EvalError::unexpected_end()),
                }
                let (arg, height) = self.parse_expr(0)?;
                self.expect_right_paren()?;
                Ok((Expr::call(func, arg), self.grow(height)?))
            }
            _ => Err(unexpected(spanned, "number, constant, function or (")),
        }
    }

    /// Height of a node over a child of `height`.
    fn grow(&self, height: usize) -> Result<usize, EvalError> {
        if height >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height + 1)
    }

    fn too_deep(&self) -> EvalError {
        EvalError::new(
            EvalErrorKind::TooDeep,
            self.current().map(|spanned| spanned.start),
            format!("more than {MAX_DEPTH} levels"),
        )
    }

    fn expect_right_paren(&mut self) -> Result<(), EvalError> {
        match self.current() {
            Some(Spanned {
                token: Token::RightParen,
                ..
            }) => {
                self.advance();
                Ok(())
            }
            Some(other) => Err(unexpected(other, ")")),
            None => Err(EvalError::unexpected_end()),
        }
    }
}

fn infix(token: &Token) -> Option<(BinaryOp, u8)> {
    match token {
        Token::Plus => Some((BinaryOp::Add, ADDITIVE)),
        Token::Minus => Some((BinaryOp::Sub, ADDITIVE)),
        Token::Star => Some((BinaryOp::Mul, MULTIPLICATIVE)),
        Token::Slash => Some((BinaryOp::Div, MULTIPLICATIVE)),
        Token::Caret => Some((BinaryOp::Pow, POWER)),
        _ => None,
    }
}

fn unexpected(spanned: &Spanned, expected: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::UnexpectedToken,
        Some(spanned.start),
        format!("expected {expected}, got '{}'", spanned.token.describe()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ast::{Constant, Function};
    use crate::calculator::tokens::tokenize;

    fn parse(input: &str) -> Result<Expr, EvalError> {
        parse_expression(&tokenize(input)?)
    }

    fn value(input: &str) -> f64 {
        parse(input).unwrap().eval().unwrap()
    }

    fn nested(open: &str, inner: &str, close: &str, levels: usize) -> String {
        format!("{}{inner}{}", open.repeat(levels), close.repeat(levels))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(value("2+3*4"), 14.0);
        assert_eq!(value("(2+3)*4"), 20.0);
        assert_eq!(value("10-4-3"), 3.0);
        assert_eq!(value("8/4/2"), 1.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(value("2^3^2"), 512.0);
        assert_eq!(value("2^-1"), 0.5);
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(value("-2^2"), -4.0);
        assert_eq!(value("(-2)^2"), 4.0);
        assert_eq!(value("3--2"), 5.0);
        assert_eq!(value("+5"), 5.0);
    }

    #[test]
    fn test_function_call_shape() {
        assert_eq!(
            parse("sqrt(pi)").unwrap(),
            Expr::call(Function::Sqrt, Expr::Constant(Constant::Pi))
        );
        assert_eq!(value("√(16)+1"), 5.0);
        assert!((value("ln(e)") - 1.0).abs() < 1e-12);
        assert_eq!(value("log(1000)"), 3.0);
    }

    #[test]
    fn test_function_requires_parenthesis() {
        let err = parse("sin 30").unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::UnexpectedToken);
        assert_eq!(err.position, Some(4));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(parse("5+*").unwrap_err().kind, EvalErrorKind::UnexpectedToken);
        assert_eq!(parse("5+").unwrap_err().kind, EvalErrorKind::UnexpectedEnd);
        assert_eq!(parse("(1+2").unwrap_err().kind, EvalErrorKind::UnexpectedEnd);
        assert_eq!(parse("1+2)").unwrap_err().kind, EvalErrorKind::UnexpectedToken);
        assert_eq!(parse("()").unwrap_err().kind, EvalErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_no_implicit_multiplication() {
        assert!(parse("2(3)").is_err());
        assert!(parse("2π").is_err());
        assert!(parse("(1)(2)").is_err());
    }

    #[test]
    fn test_empty_token_stream() {
        assert_eq!(
            parse_expression(&[]).unwrap_err().kind,
            EvalErrorKind::UnexpectedEnd
        );
    }

    #[test]
    fn test_reasonable_nesting_is_accepted() {
        assert_eq!(value(&nested("(", "7", ")", 200)), 7.0);
        assert_eq!(value(&nested("sqrt(", "1", ")", 100)), 1.0);
        assert_eq!(value(&format!("{}1", "-".repeat(100))), 1.0);
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let inputs = [
            nested("(", "1", ")", 100_000),
            nested("sin(", "0", ")", 100_000),
            format!("{}1", "-".repeat(100_000)),
            format!("{}1", "+".repeat(100_000)),
            format!("{}1", "1+".repeat(100_000)),
            format!("{}2", "2^".repeat(100_000)),
        ];
        for input in &inputs {
            let err = parse(input).unwrap_err();
            assert_eq!(err.kind, EvalErrorKind::TooDeep, "{}", &input[..20]);
        }
    }
}
