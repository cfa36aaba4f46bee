//! Query engine configuration
//!
//! Loaded from a JSON file; every key is optional and falls back to the
//! documented default.
//!
//! ```json
//! {
//!   "default_dialect": 2,
//!   "max_limit": 10000,
//!   "cursor_idle_timeout_ms": 300000,
//!   "geo_default_distance": 0.0001,
//!   "geo_default_unit": "mi",
//!   "log_level": "INFO"
//! }
//! ```

mod errors;

pub use errors::{ConfigError, ConfigErrorCode, ConfigResult};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event, Event, Logger, Severity};

/// Upper bound injected when a query never sets LIMIT
pub const DEFAULT_MAX_LIMIT: usize = 10_000;

/// Idle timeout for cursors opened by paged aggregations
pub const DEFAULT_CURSOR_IDLE_TIMEOUT_MS: u64 = 300_000;

const GEO_UNITS: [&str; 4] = ["m", "km", "mi", "ft"];

/// Defaults for SUMMARIZE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeDefaults {
    #[serde(default = "default_fragments")]
    pub fragments: usize,
    #[serde(default = "default_fragment_size")]
    pub size: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_fragments() -> usize {
    3
}
fn default_fragment_size() -> usize {
    20
}
fn default_separator() -> String {
    "...".to_string()
}

impl Default for SummarizeDefaults {
    fn default() -> Self {
        Self {
            fragments: default_fragments(),
            size: default_fragment_size(),
            separator: default_separator(),
        }
    }
}

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Query dialect sent with every command
    #[serde(default = "default_dialect")]
    pub default_dialect: u32,

    /// LIMIT count injected when none was set
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// MAXIDLE for cursors opened by paged aggregations
    #[serde(default = "default_cursor_idle_timeout")]
    pub cursor_idle_timeout_ms: u64,

    /// Radius used for point equality in query-by-example
    #[serde(default = "default_geo_distance")]
    pub geo_default_distance: f64,

    /// Unit of `geo_default_distance`
    #[serde(default = "default_geo_unit")]
    pub geo_default_unit: String,

    /// SUMMARIZE defaults
    #[serde(default)]
    pub summarize: SummarizeDefaults,

    /// HIGHLIGHT open/close tags
    #[serde(default = "default_highlight_tags")]
    pub highlight_tags: (String, String),

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dialect() -> u32 {
    2
}
fn default_max_limit() -> usize {
    DEFAULT_MAX_LIMIT
}
fn default_cursor_idle_timeout() -> u64 {
    DEFAULT_CURSOR_IDLE_TIMEOUT_MS
}
fn default_geo_distance() -> f64 {
    0.0001
}
fn default_geo_unit() -> String {
    "mi".to_string()
}
fn default_highlight_tags() -> (String, String) {
    ("<b>".to_string(), "</b>".to_string())
}
fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_dialect: default_dialect(),
            max_limit: default_max_limit(),
            cursor_idle_timeout_ms: default_cursor_idle_timeout(),
            geo_default_distance: default_geo_distance(),
            geo_default_unit: default_geo_unit(),
            summarize: SummarizeDefaults::default(),
            highlight_tags: default_highlight_tags(),
            log_level: default_log_level(),
        }
    }
}

impl QueryConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::unreadable(format!("Failed to read config: {}", e)))?;

        let config: QueryConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::malformed(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        let path_str = path.display().to_string();
        log_event(
            Severity::Info,
            Event::ConfigLoaded,
            &[("path", path_str.as_str())],
        );

        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=4).contains(&self.default_dialect) {
            return Err(ConfigError::invalid(format!(
                "default_dialect must be between 1 and 4, got {}",
                self.default_dialect
            )));
        }

        if self.max_limit == 0 {
            return Err(ConfigError::invalid("max_limit must be > 0"));
        }

        if self.cursor_idle_timeout_ms == 0 {
            return Err(ConfigError::invalid("cursor_idle_timeout_ms must be > 0"));
        }

        if !(self.geo_default_distance > 0.0) {
            return Err(ConfigError::invalid("geo_default_distance must be > 0"));
        }

        if !GEO_UNITS.contains(&self.geo_default_unit.as_str()) {
            return Err(ConfigError::invalid(format!(
                "Invalid geo_default_unit: '{}'. Expected one of m, km, mi, ft.",
                self.geo_default_unit
            )));
        }

        if self.summarize.fragments == 0 || self.summarize.size == 0 {
            return Err(ConfigError::invalid("summarize fragments and size must be > 0"));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::invalid(format!(
                "Invalid log_level: '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Minimum log severity named by `log_level`
    pub fn log_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Apply process-wide settings (currently the log level)
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_severity());
    }
}
