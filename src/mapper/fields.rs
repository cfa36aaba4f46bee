//! Return field bookkeeping shared by the pipeline and the mapper

use std::collections::HashMap;

use crate::schema::TypeHint;

/// Ordered set of output aliases with a decoded-type hint per alias
///
/// Aliases are stored without a leading `@`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnFieldSet {
    aliases: Vec<String>,
    hints: HashMap<String, TypeHint>,
}

impl ReturnFieldSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias; a known alias keeps its position and gains the new hint
    pub fn insert(&mut self, alias: &str, hint: Option<TypeHint>) {
        let alias = strip_at(alias);
        if !self.aliases.iter().any(|a| a == alias) {
            self.aliases.push(alias.to_string());
        }
        if let Some(hint) = hint {
            self.hints.insert(alias.to_string(), hint);
        }
    }

    /// Remove an alias and its hint
    pub fn remove(&mut self, alias: &str) {
        let alias = strip_at(alias);
        self.aliases.retain(|a| a != alias);
        self.hints.remove(alias);
    }

    /// True if the alias is present
    pub fn contains(&self, alias: &str) -> bool {
        let alias = strip_at(alias);
        self.aliases.iter().any(|a| a == alias)
    }

    /// Aliases in insertion order
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Hint recorded for an alias
    pub fn hint(&self, alias: &str) -> Option<TypeHint> {
        self.hints.get(strip_at(alias)).copied()
    }

    /// Number of aliases
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Drop one leading `@`
pub fn strip_at(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

/// Ensure exactly one leading `@`
pub fn with_at(name: &str) -> String {
    format!("@{}", strip_at(name))
}
