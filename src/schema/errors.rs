//! Schema error types
//!
//! Error codes:
//! - SEARCH_SCHEMA_MALFORMED (FATAL when loading from disk)
//! - SEARCH_SCHEMA_DUPLICATE_FIELD (REJECT)
//! - SEARCH_UNKNOWN_INDEX (REJECT)
//! - SEARCH_FIELD_NOT_IN_SCHEMA (REJECT)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected
    Reject,
    /// Schema material on disk is unusable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema file or definition is structurally invalid
    SearchSchemaMalformed,
    /// Two fields share one alias
    SearchSchemaDuplicateField,
    /// No schema registered for the index
    SearchUnknownIndex,
    /// Field alias not declared by the index
    SearchFieldNotInSchema,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SearchSchemaMalformed => "SEARCH_SCHEMA_MALFORMED",
            SchemaErrorCode::SearchSchemaDuplicateField => "SEARCH_SCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::SearchUnknownIndex => "SEARCH_UNKNOWN_INDEX",
            SchemaErrorCode::SearchFieldNotInSchema => "SEARCH_FIELD_NOT_IN_SCHEMA",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::SearchSchemaMalformed => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    field: Option<String>,
}

impl SchemaError {
    /// Create a malformed schema error
    pub fn malformed_schema(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SearchSchemaMalformed,
            message: format!("Malformed schema '{}': {}", source.into(), reason.into()),
            field: None,
        }
    }

    /// Create a duplicate field error
    pub fn duplicate_field(index: &str, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            code: SchemaErrorCode::SearchSchemaDuplicateField,
            message: format!("Index '{}' declares field '{}' more than once", index, alias),
            field: Some(alias),
        }
    }

    /// Create an unknown index error
    pub fn unknown_index(index: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SearchUnknownIndex,
            message: format!("No schema registered for index '{}'", index.into()),
            field: None,
        }
    }

    /// Create a field-not-in-schema error
    pub fn field_not_in_schema(index: &str, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: SchemaErrorCode::SearchFieldNotInSchema,
            message: format!("Field '{}' is not declared by index '{}'", field, index),
            field: Some(field),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchemaErrorCode::SearchFieldNotInSchema.code(),
            "SEARCH_FIELD_NOT_IN_SCHEMA"
        );
        assert_eq!(SchemaErrorCode::SearchUnknownIndex.code(), "SEARCH_UNKNOWN_INDEX");
    }

    #[test]
    fn test_malformed_is_fatal() {
        let err = SchemaError::malformed_schema("products.json", "missing fields");
        assert_eq!(err.severity(), Severity::Fatal);
        assert!(err.to_string().starts_with("[FATAL] SEARCH_SCHEMA_MALFORMED"));
    }

    #[test]
    fn test_field_not_in_schema_carries_field() {
        let err = SchemaError::field_not_in_schema("products", "colour");
        assert_eq!(err.field(), Some("colour"));
        assert!(err.message().contains("products"));
    }
}
