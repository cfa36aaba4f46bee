//! Crate-level error returned by terminal calls
//!
//! Wraps the subsystem errors without changing their codes or messages.

use thiserror::Error;

use crate::aggregation::AggregationError;
use crate::config::ConfigError;
use crate::mapper::MapperError;
use crate::qbe::QbeError;
use crate::schema::SchemaError;
use crate::transport::TransportError;

/// Result type for terminal calls
pub type SearchResult<T> = Result<T, SearchError>;

/// Any failure a query can end with
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Qbe(#[from] QbeError),
}

impl SearchError {
    /// Stable `SEARCH_*` code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Aggregation(e) => e.code().code(),
            SearchError::Mapper(e) => e.code().code(),
            SearchError::Transport(e) => e.code(),
            SearchError::Schema(e) => e.code().code(),
            SearchError::Config(e) => e.code().code(),
            SearchError::Qbe(e) => e.code().code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_passthrough() {
        let err: SearchError = TransportError::Rejected("Syntax error".into()).into();
        assert_eq!(err.code(), "SEARCH_ENGINE_REJECTED");
        assert_eq!(err.to_string(), "Engine rejected command: Syntax error");

        let err: SearchError = AggregationError::field_required("SUM").into();
        assert_eq!(err.code(), "SEARCH_REDUCER_FIELD_REQUIRED");
    }
}
