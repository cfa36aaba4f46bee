//! Result mapping errors
//!
//! Error codes:
//! - SEARCH_MAPPER_PARSE_FAILED (REJECT)
//! - SEARCH_MAPPER_DECODE_FAILED (REJECT)
//! - SEARCH_MAPPER_ARITY_MISMATCH (REJECT)
//! - SEARCH_PROJECTION_NOT_GETTER (REJECT)

use std::fmt;

/// Mapper error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperErrorCode {
    /// Raw value did not parse as the requested type
    SearchMapperParseFailed,
    /// Row could not be decoded into an entity
    SearchMapperDecodeFailed,
    /// Tuple arity differs from the requested native tuple
    SearchMapperArityMismatch,
    /// Projection method is not a zero-argument getter
    SearchProjectionNotGetter,
}

impl MapperErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            MapperErrorCode::SearchMapperParseFailed => "SEARCH_MAPPER_PARSE_FAILED",
            MapperErrorCode::SearchMapperDecodeFailed => "SEARCH_MAPPER_DECODE_FAILED",
            MapperErrorCode::SearchMapperArityMismatch => "SEARCH_MAPPER_ARITY_MISMATCH",
            MapperErrorCode::SearchProjectionNotGetter => "SEARCH_PROJECTION_NOT_GETTER",
        }
    }
}

impl fmt::Display for MapperErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Mapper error with context
#[derive(Debug, Clone)]
pub struct MapperError {
    code: MapperErrorCode,
    message: String,
}

impl MapperError {
    /// A raw value failed to parse as `target`
    pub fn parse_failed(raw: impl fmt::Display, target: &str) -> Self {
        Self {
            code: MapperErrorCode::SearchMapperParseFailed,
            message: format!("Cannot parse '{}' as {}", raw, target),
        }
    }

    /// Entity decoding failed
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self {
            code: MapperErrorCode::SearchMapperDecodeFailed,
            message: reason.into(),
        }
    }

    /// Tuple arity mismatch
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self {
            code: MapperErrorCode::SearchMapperArityMismatch,
            message: format!("Expected a tuple of {} values, got {}", expected, actual),
        }
    }

    /// Projection invoked with something other than a getter
    pub fn not_getter(method: impl Into<String>) -> Self {
        Self {
            code: MapperErrorCode::SearchProjectionNotGetter,
            message: format!(
                "Method '{}' is not a zero-argument getter and cannot be projected",
                method.into()
            ),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> MapperErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for MapperError {}

/// Result type for mapping operations
pub type MapperResult<T> = Result<T, MapperError>;
