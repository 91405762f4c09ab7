//! Calculator module for evaluating mathematical expressions.
//!
//! This module provides functionality to:
//! - Hold the in-progress input line
//! - Tokenize and parse it into a typed expression tree
//! - Evaluate the tree and format the result for display

mod ast;
mod buffer;
mod error;
mod evaluation;
mod parser;
mod tokens;

pub use ast::{BinaryOp, Constant, Expr, Function};
pub use buffer::ExpressionBuffer;
pub use error::{EvalError, EvalErrorKind};
pub use evaluation::{CalcResult, ERROR_MARKER, compute, evaluate_expression, format_result};
pub use parser::parse_expression;
pub use tokens::{Spanned, Token, tokenize};
