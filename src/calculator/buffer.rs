//! The in-progress input line.

/// Text the user is composing before evaluation.
///
/// No syntax checking happens here; whatever is appended is kept and the
/// evaluator decides later whether it makes sense.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpressionBuffer {
    text: String,
}

impl ExpressionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Concatenate a token to the end of the buffer.
    pub fn append(&mut self, token: &str) {
        self.text.push_str(token);
    }

    /// Remove the final character, if any.
    ///
    /// Works on `char` boundaries so glyphs such as `×` go in one step.
    pub fn delete_last(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Replace the whole buffer, used when replaying history.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates_in_order() {
        let mut buffer = ExpressionBuffer::new();
        for token in ["1", "2", "×", "sin(", "π", ")"] {
            buffer.append(token);
        }
        assert_eq!(buffer.as_str(), "12×sin(π)");
    }

    #[test]
    fn test_delete_last_on_empty_is_noop() {
        let mut buffer = ExpressionBuffer::new();
        buffer.delete_last();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_delete_last_removes_one_char() {
        let mut buffer = ExpressionBuffer::new();
        buffer.append("7÷");
        buffer.delete_last();
        assert_eq!(buffer.as_str(), "7");
        buffer.append("sin(");
        buffer.delete_last();
        assert_eq!(buffer.as_str(), "7sin");
    }

    #[test]
    fn test_clear_and_set() {
        let mut buffer = ExpressionBuffer::new();
        buffer.append("42");
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.set("1+1");
        assert_eq!(buffer.as_str(), "1+1");
    }
}
