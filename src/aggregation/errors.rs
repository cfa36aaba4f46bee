//! Aggregation error types
//!
//! Error codes:
//! - SEARCH_REDUCER_PARAM_REQUIRED (REJECT)
//! - SEARCH_REDUCER_FIELD_REQUIRED (REJECT)
//! - SEARCH_ALIAS_WITHOUT_REDUCER (REJECT)
//!
//! Usage errors are recorded while the pipeline is being built and surfaced
//! by the terminal call.

use std::fmt;

/// Aggregation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationErrorCode {
    /// Reducer needs a parameter that was not given
    SearchReducerParamRequired,
    /// Reducer needs a source field that was not given
    SearchReducerFieldRequired,
    /// `as_alias` called with no pending reducer
    SearchAliasWithoutReducer,
}

impl AggregationErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            AggregationErrorCode::SearchReducerParamRequired => "SEARCH_REDUCER_PARAM_REQUIRED",
            AggregationErrorCode::SearchReducerFieldRequired => "SEARCH_REDUCER_FIELD_REQUIRED",
            AggregationErrorCode::SearchAliasWithoutReducer => "SEARCH_ALIAS_WITHOUT_REDUCER",
        }
    }
}

impl fmt::Display for AggregationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Aggregation usage error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationError {
    code: AggregationErrorCode,
    message: String,
}

impl AggregationError {
    /// A reducer was given no value for a required parameter
    pub fn param_required(reducer: &str, param: &str) -> Self {
        Self {
            code: AggregationErrorCode::SearchReducerParamRequired,
            message: format!("Reducer {} requires a {} parameter", reducer, param),
        }
    }

    /// A reducer was given no source field
    pub fn field_required(reducer: &str) -> Self {
        Self {
            code: AggregationErrorCode::SearchReducerFieldRequired,
            message: format!("Reducer {} requires a source field", reducer),
        }
    }

    /// An alias was requested with nothing to alias
    pub fn alias_without_reducer(alias: &str) -> Self {
        Self {
            code: AggregationErrorCode::SearchAliasWithoutReducer,
            message: format!("Alias '{}' given with no pending reducer", alias),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> AggregationErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for AggregationError {}

/// Result type for aggregation operations
pub type AggregationResult<T> = Result<T, AggregationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_required_display() {
        let err = AggregationError::param_required("QUANTILE", "percentile");
        assert_eq!(err.code(), AggregationErrorCode::SearchReducerParamRequired);
        assert_eq!(
            err.to_string(),
            "[REJECT] SEARCH_REDUCER_PARAM_REQUIRED: Reducer QUANTILE requires a percentile parameter"
        );
    }
}
