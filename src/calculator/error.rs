//! Errors produced while turning buffer text into a number.

use std::fmt;
use thiserror::Error;

/// What went wrong while evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// A character or word that is not part of the vocabulary.
    UnknownToken,
    /// A number literal such as `1.2.3`.
    InvalidNumber,
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken,
    /// The expression stopped before it was complete.
    UnexpectedEnd,
    /// Denominator evaluated to zero.
    DivisionByZero,
    /// NaN or infinity appeared during evaluation.
    NonFinite,
    /// Parentheses, calls, signs or operator chains nest past the limit.
    TooDeep,
}

impl EvalErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownToken => "unknown token",
            Self::InvalidNumber => "invalid number",
            Self::UnexpectedToken => "unexpected token",
            Self::UnexpectedEnd => "unexpected end of input",
            Self::DivisionByZero => "division by zero",
            Self::NonFinite => "non-finite value",
            Self::TooDeep => "expression nested too deeply",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed expression.
///
/// `position` is a byte offset into the raw buffer, when one is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}: {detail}", position_suffix(.position))]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub position: Option<usize>,
    pub detail: String,
}

fn position_suffix(position: &Option<usize>) -> String {
    position.map(|p| format!(" at byte {p}")).unwrap_or_default()
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, position: Option<usize>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            detail: detail.into(),
        }
    }

    pub fn unexpected_end() -> Self {
        Self::new(EvalErrorKind::UnexpectedEnd, None, "expression is incomplete")
    }

    pub fn division_by_zero() -> Self {
        Self::new(EvalErrorKind::DivisionByZero, None, "denominator is zero")
    }

    pub fn non_finite(what: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::NonFinite, None, what)
    }
}
