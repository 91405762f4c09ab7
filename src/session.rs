//! Calculator session state.
//!
//! Ties the expression buffer, evaluator, history and explanation gate
//! together. Every method is a synchronous state transition; only the
//! explanation request itself happens elsewhere.

use crate::calculator::{CalcResult, ERROR_MARKER, EvalError, ExpressionBuffer, evaluate_expression};
use crate::explain::{Explanation, ExplanationGate, Ticket};
use crate::history::{HistoryEntry, HistoryStore, Storage};
use crate::keymap::{Action, Mode};
use tracing::debug;

/// What an evaluation did.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// The buffer was empty; nothing changed.
    Skipped,
    /// The result is displayed and recorded as this entry.
    Success(HistoryEntry),
    /// The error marker is displayed and the buffer kept for correction.
    Malformed(EvalError),
}

pub struct Calculator<S: Storage> {
    buffer: ExpressionBuffer,
    result: String,
    /// The expression `result` was computed from.
    evaluated: String,
    mode: Mode,
    history: HistoryStore<S>,
    gate: ExplanationGate,
    explanation: Option<Explanation>,
}

impl<S: Storage> Calculator<S> {
    /// Start a session from previously loaded history and an empty buffer.
    pub fn new(history: HistoryStore<S>) -> Self {
        Self {
            buffer: ExpressionBuffer::new(),
            result: String::new(),
            evaluated: String::new(),
            mode: Mode::default(),
            history,
            gate: ExplanationGate::new(),
            explanation: None,
        }
    }

    pub fn expression(&self) -> &str {
        self.buffer.as_str()
    }

    /// The displayed result: empty, a formatted number, or the error marker.
    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        self.explanation.as_ref()
    }

    pub fn input(&mut self, token: &str) {
        self.buffer.append(token);
        self.explanation = None;
    }

    pub fn delete_last(&mut self) {
        self.buffer.delete_last();
        self.explanation = None;
    }

    /// Reset both the buffer and the displayed result.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.result.clear();
        self.evaluated.clear();
        self.explanation = None;
    }

    pub fn evaluate(&mut self) -> Outcome {
        let Some(calc) = evaluate_expression(self.buffer.as_str()) else {
            return Outcome::Skipped;
        };
        self.explanation = None;

        match calc {
            CalcResult::Success {
                expression,
                display_result,
                ..
            } => {
                debug!(%expression, result = %display_result, "Evaluated");
                let entry = self.history.record(&expression, &display_result).clone();
                self.result = display_result;
                self.evaluated = expression;
                Outcome::Success(entry)
            }
            CalcResult::Error { expression, error } => {
                debug!(%expression, %error, "Malformed expression");
                self.result = ERROR_MARKER.to_string();
                self.evaluated = expression;
                Outcome::Malformed(error)
            }
        }
    }

    /// Restore a history entry into the buffer and display.
    ///
    /// Returns `false` and leaves everything untouched if `id` is unknown.
    pub fn replay(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.get(id) else {
            return false;
        };
        self.buffer.set(entry.expression());
        self.result = entry.result().to_string();
        self.evaluated = entry.expression().to_string();
        self.explanation = None;
        true
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Dispatch an input-surface action. Returns the outcome for evaluations.
    pub fn apply(&mut self, action: Action) -> Option<Outcome> {
        match action {
            Action::Append(token) => self.input(&token),
            Action::DeleteLast => self.delete_last(),
            Action::Clear => self.clear(),
            Action::Evaluate => return Some(self.evaluate()),
        }
        None
    }

    /// Start an explanation request for the displayed result.
    ///
    /// Only a successful result can be explained, and only while the
    /// buffer still holds the expression it was computed from.
    pub fn begin_explanation(&mut self) -> Option<Ticket> {
        if self.result.is_empty() || self.result == ERROR_MARKER {
            return None;
        }
        if self.buffer.as_str() != self.evaluated {
            debug!(expression = %self.buffer.as_str(), "Buffer edited since evaluation");
            return None;
        }
        Some(self.gate.issue(self.buffer.as_str(), &self.result))
    }

    /// Apply a finished explanation if it still describes what is shown.
    pub fn finish_explanation(&mut self, ticket: &Ticket, explanation: Explanation) -> bool {
        let admitted = self
            .gate
            .admit(ticket, self.buffer.as_str(), &self.result);
        if admitted {
            self.explanation = Some(explanation);
        }
        admitted
    }

    pub fn explanation_pending(&self) -> bool {
        self.gate.in_flight()
    }
}
