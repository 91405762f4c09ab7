//! Expression evaluation.
//!
//! Lexes and parses buffer text into a typed tree, reduces it to a
//! finite `f64` and formats the value for display.

use super::error::EvalError;
use super::parser::parse_expression;
use super::tokens::tokenize;

/// Shown in place of a result whenever evaluation fails.
pub const ERROR_MARKER: &str = "Error";

/// Fractional digits kept for non-integer results.
const DECIMAL_PLACES: usize = 8;

/// Result of evaluating a calculator expression.
#[derive(Clone, Debug)]
pub enum CalcResult {
    /// Successful calculation with a finite numeric result.
    Success {
        /// The expression exactly as typed.
        expression: String,
        /// The numeric value.
        value: f64,
        /// Formatted for display and history.
        display_result: String,
    },
    /// The expression could not be reduced to a finite number.
    Error {
        /// The expression exactly as typed.
        expression: String,
        error: EvalError,
    },
}

impl CalcResult {
    /// Get the expression that was evaluated.
    pub fn expression(&self) -> &str {
        match self {
            Self::Success { expression, .. } => expression,
            Self::Error { expression, .. } => expression,
        }
    }

    /// Check if this is a successful result.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Get the display string: the formatted value or the error marker.
    pub fn display(&self) -> &str {
        match self {
            Self::Success { display_result, .. } => display_result,
            Self::Error { .. } => ERROR_MARKER,
        }
    }
}

/// Evaluate a mathematical expression.
///
/// Returns `None` for an empty input, which is not an error. The
/// expression is stored untrimmed so history replays exactly what was typed.
pub fn evaluate_expression(input: &str) -> Option<CalcResult> {
    if input.is_empty() {
        return None;
    }

    let expression = input.to_string();
    match compute(input) {
        Ok(value) => Some(CalcResult::Success {
            expression,
            display_result: format_result(value),
            value,
        }),
        Err(error) => Some(CalcResult::Error { expression, error }),
    }
}

/// Reduce raw input to a finite number.
pub fn compute(input: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(input)?;
    let expr = parse_expression(&tokens)?;
    expr.eval()
}

/// Format a number for display.
///
/// Integers print without a decimal point. Everything else is rounded to
/// eight fractional digits with trailing zeros removed.
pub fn format_result(value: f64) -> String {
    if value == 0.0 {
        // Also folds -0 into 0.
        return "0".to_string();
    }

    if value.fract() == 0.0 {
        return format!("{value}");
    }

    let formatted = format!("{:.*}", DECIMAL_PLACES, value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}
