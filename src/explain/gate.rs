//! Guards against out-of-order explanation responses.
//!
//! Requests can outlive the expression they were made for. Each request is
//! issued a [`Ticket`] naming the expression and result it describes, and a
//! completion is only admitted if its ticket is the newest one and the
//! calculator still shows that same pair.

use tracing::debug;

/// Identifies one in-flight explanation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    serial: u64,
    expression: String,
    result: String,
}

impl Ticket {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn result(&self) -> &str {
        &self.result
    }
}

#[derive(Debug, Default)]
pub struct ExplanationGate {
    issued: u64,
    active: Option<u64>,
}

impl ExplanationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any earlier one.
    pub fn issue(&mut self, expression: &str, result: &str) -> Ticket {
        self.issued += 1;
        self.active = Some(self.issued);
        Ticket {
            serial: self.issued,
            expression: expression.to_string(),
            result: result.to_string(),
        }
    }

    /// Whether a request is outstanding.
    pub fn in_flight(&self) -> bool {
        self.active.is_some()
    }

    /// Decide whether a completed request may update the display.
    ///
    /// An admitted ticket is consumed, so a duplicate completion is rejected.
    pub fn admit(&mut self, ticket: &Ticket, expression: &str, result: &str) -> bool {
        let latest = self.active == Some(ticket.serial);
        let matches = ticket.expression == expression && ticket.result == result;

        if latest && matches {
            self.active = None;
            return true;
        }

        if latest {
            // The display moved on; nothing else is waiting.
            self.active = None;
        }
        debug!(
            serial = ticket.serial,
            expression = %ticket.expression,
            latest,
            "Discarding stale explanation"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_matching_ticket_is_admitted_once() {
        let mut gate = ExplanationGate::new();
        let ticket = gate.issue("2+2", "4");
        assert!(gate.in_flight());
        assert!(gate.admit(&ticket, "2+2", "4"));
        assert!(!gate.in_flight());
        assert!(!gate.admit(&ticket, "2+2", "4"));
    }

    #[test]
    fn test_superseded_ticket_is_rejected() {
        let mut gate = ExplanationGate::new();
        let first = gate.issue("2+2", "4");
        let second = gate.issue("3+3", "6");
        assert!(second.serial() > first.serial());

        // The older response arrives last-but-one and must not win.
        assert!(!gate.admit(&first, "3+3", "6"));
        assert!(gate.admit(&second, "3+3", "6"));
    }

    #[test]
    fn test_changed_display_rejects_response() {
        let mut gate = ExplanationGate::new();
        let ticket = gate.issue("2+2", "4");
        assert!(!gate.admit(&ticket, "2+2+", "4"));
        assert!(!gate.in_flight());
    }

    #[test]
    fn test_same_expression_reissued_only_newest_counts() {
        let mut gate = ExplanationGate::new();
        let stale = gate.issue("1÷3", "0.33333333");
        let fresh = gate.issue("1÷3", "0.33333333");
        assert!(!gate.admit(&stale, "1÷3", "0.33333333"));
        assert!(gate.admit(&fresh, "1÷3", "0.33333333"));
    }
}
