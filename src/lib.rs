//! NovaCalc: a keypad calculator with persisted history and optional
//! AI explanations of results.
//!
//! The library holds the whole core; the `novacalc` binary is a terminal
//! input surface on top of it.

pub mod calculator;
pub mod config;
pub mod explain;
pub mod history;
pub mod keymap;
pub mod session;

pub use calculator::{CalcResult, ERROR_MARKER, EvalError, ExpressionBuffer, evaluate_expression};
pub use config::Config;
pub use explain::{Explainer, Explanation, explain_or_fallback};
pub use history::{FileStorage, HistoryEntry, HistoryStore, MemoryStorage, Storage};
pub use keymap::{Action, Key, Keymap, Mode};
pub use session::{Calculator, Outcome};
