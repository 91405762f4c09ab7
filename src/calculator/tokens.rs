//! Tokenization of calculator input.
//!
//! Accepts both the ASCII operators and the display glyphs the keypad
//! inserts (`×`, `÷`, `√`, `π`), so buffer text can be lexed as typed.

use super::ast::{Constant, Function};
use super::error::{EvalError, EvalErrorKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
    Function(Function),
    Constant(Constant),
}

impl Token {
    /// Text shown in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Plus => "+".to_string(),
            Self::Minus => "-".to_string(),
            Self::Star => "*".to_string(),
            Self::Slash => "/".to_string(),
            Self::Caret => "^".to_string(),
            Self::LeftParen => "(".to_string(),
            Self::RightParen => ")".to_string(),
            Self::Function(func) => func.name().to_string(),
            Self::Constant(c) => c.name().to_string(),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
}

/// Split raw input into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let literal = &input[start..end];
            tokens.push(Spanned {
                token: Token::Number(parse_number(literal, start)?),
                start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &input[start..end];
            let token = match word {
                "pi" => Token::Constant(Constant::Pi),
                "e" => Token::Constant(Constant::E),
                _ => match Function::from_name(word) {
                    Some(func) => Token::Function(func),
                    None => {
                        return Err(EvalError::new(
                            EvalErrorKind::UnknownToken,
                            Some(start),
                            format!("'{word}'"),
                        ));
                    }
                },
            };
            tokens.push(Spanned { token, start });
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '√' => Token::Function(Function::Sqrt),
            'π' => Token::Constant(Constant::Pi),
            other => {
                return Err(EvalError::new(
                    EvalErrorKind::UnknownToken,
                    Some(start),
                    format!("'{other}'"),
                ));
            }
        };
        chars.next();
        tokens.push(Spanned { token, start });
    }

    Ok(tokens)
}

fn parse_number(literal: &str, start: usize) -> Result<f64, EvalError> {
    let invalid = || EvalError::new(EvalErrorKind::InvalidNumber, Some(start), format!("'{literal}'"));

    if literal == "." || literal.matches('.').count() > 1 {
        return Err(invalid());
    }
    literal.parse::<f64>().map_err(|_| invalid())
}
