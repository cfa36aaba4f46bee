//! Query-by-example errors

use std::fmt;

/// QBE error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QbeErrorCode {
    /// Probe could not be serialized
    SearchExampleUnserializable,
}

impl QbeErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QbeErrorCode::SearchExampleUnserializable => "SEARCH_EXAMPLE_UNSERIALIZABLE",
        }
    }
}

/// QBE error
#[derive(Debug, Clone)]
pub struct QbeError {
    code: QbeErrorCode,
    message: String,
}

impl QbeError {
    /// Probe serialization failed
    pub fn unserializable(reason: impl Into<String>) -> Self {
        Self {
            code: QbeErrorCode::SearchExampleUnserializable,
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QbeErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for QbeError {}

/// Result type for QBE operations
pub type QbeResult<T> = Result<T, QbeError>;
