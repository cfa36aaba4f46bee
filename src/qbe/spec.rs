//! Match specifications for query-by-example

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QbeError, QbeResult};

/// How string values of TEXT fields are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringMatchMode {
    /// Exact phrase
    #[default]
    Default,
    /// Exact phrase
    Exact,
    /// Prefix match
    Starting,
    /// Suffix match
    Ending,
    /// Infix match
    Containing,
    /// Not supported by the engine; fields using it are skipped
    Regex,
}

/// How an example probe is turned into a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    matching_all: bool,
    ignored_paths: BTreeSet<String>,
    string_mode: StringMatchMode,
}

impl Default for MatchSpec {
    fn default() -> Self {
        Self::matching_all()
    }
}

impl MatchSpec {
    /// Every populated field must match
    pub fn matching_all() -> Self {
        Self {
            matching_all: true,
            ignored_paths: BTreeSet::new(),
            string_mode: StringMatchMode::Default,
        }
    }

    /// Any populated TAG, GEO or NUMERIC field may match
    pub fn matching_any() -> Self {
        Self {
            matching_all: false,
            ..Self::matching_all()
        }
    }

    /// Leave these field aliases or paths out of the query
    pub fn with_ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the string matching mode for TEXT fields
    pub fn with_string_matcher(mut self, mode: StringMatchMode) -> Self {
        self.string_mode = mode;
        self
    }

    /// True for match-all
    pub fn is_matching_all(&self) -> bool {
        self.matching_all
    }

    /// String matching mode
    pub fn string_mode(&self) -> StringMatchMode {
        self.string_mode
    }

    /// True if `alias` or `path` was ignored
    pub fn is_ignored(&self, alias: &str, path: &str) -> bool {
        self.ignored_paths.contains(alias)
            || self.ignored_paths.contains(path)
            || self
                .ignored_paths
                .contains(path.strip_prefix("$.").unwrap_or(path))
    }
}

/// A probe document paired with its match specification
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    probe: Value,
    spec: MatchSpec,
}

impl Example {
    /// Serialize `probe` and pair it with `spec`
    pub fn of<T: Serialize>(probe: &T, spec: MatchSpec) -> QbeResult<Self> {
        let probe = serde_json::to_value(probe).map_err(|e| QbeError::unserializable(e.to_string()))?;
        Ok(Self { probe, spec })
    }

    /// Probe with the default match-all specification
    pub fn matching_all<T: Serialize>(probe: &T) -> QbeResult<Self> {
        Self::of(probe, MatchSpec::matching_all())
    }

    /// Use an already-built JSON probe
    pub fn from_value(probe: Value, spec: MatchSpec) -> Self {
        Self { probe, spec }
    }

    /// Probe as JSON
    pub fn probe(&self) -> &Value {
        &self.probe
    }

    /// Match specification
    pub fn spec(&self) -> &MatchSpec {
        &self.spec
    }
}
