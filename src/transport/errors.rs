//! Transport errors
//!
//! Engine rejections are propagated unmodified; the only reinterpretation is
//! recognizing an unknown-field rejection as a schema mismatch.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while sending a command or reading its reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be used
    #[error("Transport failed: {0}")]
    Connection(String),

    /// Engine refused the command
    #[error("Engine rejected command: {0}")]
    Rejected(String),

    /// Engine does not know a referenced field
    #[error("Field '{field}' is not in the index schema: {message}")]
    FieldNotInSchema { field: String, message: String },

    /// Engine gave up after the requested timeout
    #[error("Command timed out: {0}")]
    Timeout(String),

    /// Reply could not be interpreted
    #[error("Malformed engine reply: {0}")]
    MalformedReply(String),
}

/// `Unknown field at offset N near X`, or a quoted name after
/// `Unknown field` / `No such field` / `Property`
const UNKNOWN_FIELD_PATTERN: &str = concat!(
    r#"(?i)(?:unknown field|no such field)\s+at offset \d+ near\s+[`'"]?@?([A-Za-z0-9_.$]+)"#,
    r#"|(?:unknown field|no such field|property)\s*[`'"]@?([A-Za-z0-9_.$]+)[`'"]"#,
);

/// Reply the engine sends when a query exceeds its TIMEOUT
const TIMEOUT_REPLY: &str = "timeout limit was reached";

fn unknown_field_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(UNKNOWN_FIELD_PATTERN).ok())
        .as_ref()
}

impl TransportError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Connection(_) => "SEARCH_TRANSPORT_FAILED",
            TransportError::Rejected(_) => "SEARCH_ENGINE_REJECTED",
            TransportError::FieldNotInSchema { .. } => "SEARCH_FIELD_NOT_IN_SCHEMA",
            TransportError::Timeout(_) => "SEARCH_TIMEOUT",
            TransportError::MalformedReply(_) => "SEARCH_MALFORMED_REPLY",
        }
    }

    /// Classify an engine error message
    ///
    /// Messages naming an unknown field become `FieldNotInSchema`, timeouts
    /// become `Timeout`, everything else stays `Rejected`.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();

        if message.to_ascii_lowercase().contains(TIMEOUT_REPLY) {
            return TransportError::Timeout(message);
        }

        let field = unknown_field_regex()
            .and_then(|re| re.captures(&message))
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string());

        match field {
            Some(field) => TransportError::FieldNotInSchema { field, message },
            None => TransportError::Rejected(message),
        }
    }

    /// Apply `classify` to a plain rejection; other variants pass through
    pub fn reclassify(self) -> Self {
        match self {
            TransportError::Rejected(message) => Self::classify(message),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_classified() {
        let err = TransportError::classify("Unknown field `colour`");
        assert_eq!(
            err,
            TransportError::FieldNotInSchema {
                field: "colour".into(),
                message: "Unknown field `colour`".into()
            }
        );
        assert_eq!(err.code(), "SEARCH_FIELD_NOT_IN_SCHEMA");
    }

    #[test]
    fn test_property_not_loaded_classified() {
        let err = TransportError::classify("Property `@price` not loaded nor in schema");
        match err {
            TransportError::FieldNotInSchema { field, .. } => assert_eq!(field, "price"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_near_offset_classified() {
        let err = TransportError::classify("Unknown field at offset 10 near colour");
        match err {
            TransportError::FieldNotInSchema { field, .. } => assert_eq!(field, "colour"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unquoted_word_after_unknown_field_not_taken() {
        let err = TransportError::classify("Unknown field type for attribute");
        assert_eq!(err.code(), "SEARCH_ENGINE_REJECTED");
    }

    #[test]
    fn test_timeout_classified() {
        let err = TransportError::classify("Timeout limit was reached");
        assert_eq!(err.code(), "SEARCH_TIMEOUT");
    }

    #[test]
    fn test_timeout_argument_error_stays_rejected() {
        let message = "Bad arguments for TIMEOUT: Could not convert argument to expected type";
        let err = TransportError::classify(message);
        assert_eq!(err, TransportError::Rejected(message.into()));
        assert_eq!(err.code(), "SEARCH_ENGINE_REJECTED");
    }

    #[test]
    fn test_other_rejections_unchanged() {
        let err = TransportError::classify("Syntax error at offset 3 near brand");
        assert_eq!(
            err,
            TransportError::Rejected("Syntax error at offset 3 near brand".into())
        );
    }

    #[test]
    fn test_reclassify_leaves_connection_errors() {
        let err = TransportError::Connection("refused".into()).reclassify();
        assert_eq!(err.code(), "SEARCH_TRANSPORT_FAILED");
    }
}
