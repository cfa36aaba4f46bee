//! Configuration errors
//!
//! All configuration errors are REJECT: the caller keeps the previous
//! configuration or the defaults.

use std::fmt;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// File could not be read
    SearchConfigUnreadable,
    /// File is not valid JSON for the config shape
    SearchConfigMalformed,
    /// A value is outside its allowed range
    SearchConfigInvalid,
}

impl ConfigErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::SearchConfigUnreadable => "SEARCH_CONFIG_UNREADABLE",
            ConfigErrorCode::SearchConfigMalformed => "SEARCH_CONFIG_MALFORMED",
            ConfigErrorCode::SearchConfigInvalid => "SEARCH_CONFIG_INVALID",
        }
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    /// File could not be read
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::SearchConfigUnreadable,
            message: msg.into(),
        }
    }

    /// File did not parse
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::SearchConfigMalformed,
            message: msg.into(),
        }
    }

    /// Value out of range
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::SearchConfigInvalid,
            message: msg.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
