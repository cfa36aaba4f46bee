//! `FT.SEARCH` command assembly

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregation::SortField;
use crate::config::SummarizeDefaults;
use crate::mapper::strip_at;
use crate::transport::Command;

/// SUMMARIZE options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeParams {
    pub fragments: usize,
    pub size: usize,
    pub separator: String,
}

impl Default for SummarizeParams {
    fn default() -> Self {
        Self::from_defaults(&SummarizeDefaults::default())
    }
}

impl SummarizeParams {
    /// Parameters seeded from configuration
    pub fn from_defaults(defaults: &SummarizeDefaults) -> Self {
        Self {
            fragments: defaults.fragments,
            size: defaults.size,
            separator: defaults.separator.clone(),
        }
    }

    /// Fragments per field
    pub fn fragments(mut self, fragments: usize) -> Self {
        self.fragments = fragments;
        self
    }

    /// Tokens per fragment
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Text placed between fragments
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Summarize {
    fields: Vec<String>,
    params: SummarizeParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Highlight {
    fields: Vec<String>,
    tags: (String, String),
}

/// All options of one `FT.SEARCH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCommand {
    pub index: String,
    pub query: String,
    pub verbatim: bool,
    pub no_content: bool,
    pub return_fields: Vec<String>,
    summarize: Option<Summarize>,
    highlight: Option<Highlight>,
    pub sort: Option<SortField>,
    /// `(offset, count)`
    pub limit: Option<(usize, usize)>,
    pub timeout: Option<Duration>,
    pub dialect: u32,
}

impl SearchCommand {
    /// Bare search of `query` on `index`
    pub fn new(index: &str, query: &str, dialect: u32) -> Self {
        Self {
            index: index.to_string(),
            query: query.to_string(),
            verbatim: false,
            no_content: false,
            return_fields: Vec::new(),
            summarize: None,
            highlight: None,
            sort: None,
            limit: None,
            timeout: None,
            dialect,
        }
    }

    /// Summarize `fields` (all text fields when empty)
    pub fn set_summarize(&mut self, fields: &[&str], params: SummarizeParams) {
        self.summarize = Some(Summarize {
            fields: fields.iter().map(|f| strip_at(f).to_string()).collect(),
            params,
        });
    }

    /// Highlight `fields` (all text fields when empty) between `open` and `close`
    pub fn set_highlight(&mut self, fields: &[&str], open: &str, close: &str) {
        self.highlight = Some(Highlight {
            fields: fields.iter().map(|f| strip_at(f).to_string()).collect(),
            tags: (open.to_string(), close.to_string()),
        });
    }

    /// Assemble the wire command
    pub fn to_command(&self) -> Command {
        let mut command = Command::new("FT.SEARCH")
            .arg(self.index.as_str())
            .arg(self.query.as_str());

        if self.verbatim {
            command.push("VERBATIM");
        }
        if self.no_content {
            command.push("NOCONTENT");
        }
        if !self.return_fields.is_empty() {
            command.push("RETURN");
            command.push(self.return_fields.len().to_string());
            command.extend(self.return_fields.iter().cloned());
        }
        if let Some(summarize) = &self.summarize {
            command.push("SUMMARIZE");
            push_fields(&mut command, &summarize.fields);
            command.extend([
                "FRAGS".to_string(),
                summarize.params.fragments.to_string(),
                "LEN".to_string(),
                summarize.params.size.to_string(),
                "SEPARATOR".to_string(),
                summarize.params.separator.clone(),
            ]);
        }
        if let Some(highlight) = &self.highlight {
            command.push("HIGHLIGHT");
            push_fields(&mut command, &highlight.fields);
            command.extend([
                "TAGS".to_string(),
                highlight.tags.0.clone(),
                highlight.tags.1.clone(),
            ]);
        }
        if let Some(sort) = &self.sort {
            command.push("SORTBY");
            command.push(sort.field.as_str());
            command.push(sort.direction.as_str());
        }
        if let Some((offset, count)) = self.limit {
            command.push("LIMIT");
            command.push(offset.to_string());
            command.push(count.to_string());
        }
        if let Some(timeout) = self.timeout {
            command.push("TIMEOUT");
            command.push(timeout.as_millis().to_string());
        }
        command.push("DIALECT");
        command.push(self.dialect.to_string());
        command
    }
}

fn push_fields(command: &mut Command, fields: &[String]) {
    if fields.is_empty() {
        return;
    }
    command.push("FIELDS");
    command.push(fields.len().to_string());
    command.extend(fields.iter().cloned());
}
