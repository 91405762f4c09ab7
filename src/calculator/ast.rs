//! Typed expression tree and its numeric semantics.
//!
//! All arithmetic is IEEE `f64`. Any step that would yield NaN or an
//! infinity is reported as an error instead of being propagated.

use super::error::EvalError;
use std::f64::consts;

/// Built-in functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Log10,
    Ln,
    Sqrt,
}

impl Function {
    /// Look up a function by its spelled-out name.
    ///
    /// `log` is the base-10 logarithm, as on the keypad.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "log" | "log10" => Some(Self::Log10),
            "ln" => Some(Self::Ln),
            "sqrt" => Some(Self::Sqrt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log10 => "log10",
            Self::Ln => "ln",
            Self::Sqrt => "sqrt",
        }
    }

    /// Trigonometric functions take radians.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Log10 => x.log10(),
            Self::Ln => x.ln(),
            Self::Sqrt => x.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "e",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Pi => consts::PI,
            Self::E => consts::E,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(Constant),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn neg(inner: Expr) -> Self {
        Self::Neg(Box::new(inner))
    }

    pub fn call(func: Function, arg: Expr) -> Self {
        Self::Call(func, Box::new(arg))
    }

    /// Reduce the tree to a finite number.
    pub fn eval(&self) -> Result<f64, EvalError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Constant(c) => c.value(),
            Self::Neg(inner) => -inner.eval()?,
            Self::Call(func, arg) => {
                let x = arg.eval()?;
                let y = func.apply(x);
                if !y.is_finite() {
                    return Err(EvalError::non_finite(format!("{}({x})", func.name())));
                }
                y
            }
            Self::Binary(op, left, right) => {
                let l = left.eval()?;
                let r = right.eval()?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(EvalError::division_by_zero());
                        }
                        l / r
                    }
                    BinaryOp::Pow => l.powf(r),
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::non_finite(format!("{value}")))
        }
    }
}
