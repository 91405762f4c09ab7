//! A single recorded calculation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One past expression/result pair.
///
/// Entries never change after creation; the fields are only exposed
/// through getters. The serialized shape is
/// `{"id", "expression", "result", "timestamp"}` with the timestamp in
/// Unix milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: String,
    expression: String,
    result: String,
    timestamp: i64,
}

impl HistoryEntry {
    /// Create an entry with a freshly generated id.
    pub fn new(expression: impl Into<String>, result: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            expression: expression.into(),
            result: result.into(),
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw input as typed, glyphs included.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}
