//! Aggregation stages and their wire arguments

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mapper::{strip_at, with_at};

use super::errors::AggregationResult;
use super::reducer::ReducerSpec;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key; the field is kept without a leading `@`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortField {
    /// Ascending on `field`
    pub fn asc(field: &str) -> Self {
        Self {
            field: strip_at(field).to_string(),
            direction: Direction::Asc,
        }
    }

    /// Descending on `field`
    pub fn desc(field: &str) -> Self {
        Self {
            field: strip_at(field).to_string(),
            direction: Direction::Desc,
        }
    }

    /// Field name as referenced inside a pipeline
    pub fn property(&self) -> String {
        with_at(&self.field)
    }
}

/// Field-presence filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationFilter {
    /// Rows where the field has a value
    Exists(String),
    /// Rows where the field has no value
    NotExists(String),
}

impl AggregationFilter {
    /// Field this filter tests, without `@`
    pub fn field(&self) -> &str {
        match self {
            AggregationFilter::Exists(field) | AggregationFilter::NotExists(field) => strip_at(field),
        }
    }

    /// FILTER expression
    pub fn expression(&self) -> String {
        match self {
            AggregationFilter::Exists(_) => format!("exists({})", with_at(self.field())),
            AggregationFilter::NotExists(_) => format!("!exists({})", with_at(self.field())),
        }
    }
}

/// Cursor read options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSpec {
    pub batch_size: usize,
    pub max_idle: Duration,
}

impl CursorSpec {
    /// `WITHCURSOR COUNT n MAXIDLE ms`
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "WITHCURSOR".to_string(),
            "COUNT".to_string(),
            self.batch_size.to_string(),
            "MAXIDLE".to_string(),
            self.max_idle.as_millis().to_string(),
        ]
    }
}

/// One pipeline step, in the order it was added
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Load(Vec<String>),
    LoadAll,
    GroupBy {
        fields: Vec<String>,
        reducers: Vec<ReducerSpec>,
    },
    Apply {
        expression: String,
        alias: String,
    },
    SortBy {
        fields: Vec<SortField>,
        max: Option<usize>,
    },
    Filter(String),
    Limit {
        offset: usize,
        count: usize,
    },
}

impl Stage {
    /// Wire arguments for this stage
    pub fn to_args(&self) -> AggregationResult<Vec<String>> {
        let mut args = Vec::new();
        match self {
            Stage::Load(fields) => {
                args.push("LOAD".to_string());
                args.push(fields.len().to_string());
                args.extend(fields.iter().map(|f| with_at(f)));
            }
            Stage::LoadAll => {
                args.push("LOAD".to_string());
                args.push("*".to_string());
            }
            Stage::GroupBy { fields, reducers } => {
                args.push("GROUPBY".to_string());
                args.push(fields.len().to_string());
                args.extend(fields.iter().map(|f| with_at(f)));
                for reducer in reducers {
                    args.extend(reducer.to_args()?);
                }
            }
            Stage::Apply { expression, alias } => {
                args.push("APPLY".to_string());
                args.push(expression.clone());
                args.push("AS".to_string());
                args.push(alias.clone());
            }
            Stage::SortBy { fields, max } => {
                args.push("SORTBY".to_string());
                args.push((fields.len() * 2).to_string());
                for field in fields {
                    args.push(field.property());
                    args.push(field.direction.as_str().to_string());
                }
                if let Some(max) = max {
                    args.push("MAX".to_string());
                    args.push(max.to_string());
                }
            }
            Stage::Filter(expression) => {
                args.push("FILTER".to_string());
                args.push(expression.clone());
            }
            Stage::Limit { offset, count } => {
                args.push("LIMIT".to_string());
                args.push(offset.to_string());
                args.push(count.to_string());
            }
        }
        Ok(args)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load(fields) => write!(f, "load {}", fields.join(", ")),
            Stage::LoadAll => write!(f, "load all fields"),
            Stage::GroupBy { fields, reducers } => {
                if fields.is_empty() {
                    write!(f, "group everything")?;
                } else {
                    write!(f, "group by {}", fields.join(", "))?;
                }
                for reducer in reducers {
                    write!(f, "; {}", reducer)?;
                }
                Ok(())
            }
            Stage::Apply { expression, alias } => write!(f, "apply {} as {}", expression, alias),
            Stage::SortBy { fields, max } => {
                let keys: Vec<String> = fields
                    .iter()
                    .map(|s| format!("{} {}", s.field, s.direction.as_str()))
                    .collect();
                write!(f, "sort by {}", keys.join(", "))?;
                if let Some(max) = max {
                    write!(f, " (max {})", max)?;
                }
                Ok(())
            }
            Stage::Filter(expression) => write!(f, "filter {}", expression),
            Stage::Limit { offset, count } => write!(f, "limit {} from {}", count, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_args() {
        let stage = Stage::SortBy {
            fields: vec![SortField::desc("@count"), SortField::asc("brand")],
            max: Some(5),
        };
        assert_eq!(
            stage.to_args().unwrap(),
            vec!["SORTBY", "4", "@count", "DESC", "@brand", "ASC", "MAX", "5"]
        );
    }

    #[test]
    fn test_load_args() {
        let stage = Stage::Load(vec!["name".into(), "@price".into()]);
        assert_eq!(stage.to_args().unwrap(), vec!["LOAD", "2", "@name", "@price"]);
        assert_eq!(Stage::LoadAll.to_args().unwrap(), vec!["LOAD", "*"]);
    }

    #[test]
    fn test_empty_group_by() {
        let stage = Stage::GroupBy {
            fields: Vec::new(),
            reducers: Vec::new(),
        };
        assert_eq!(stage.to_args().unwrap(), vec!["GROUPBY", "0"]);
        assert_eq!(stage.to_string(), "group everything");
    }

    #[test]
    fn test_exists_filters() {
        assert_eq!(AggregationFilter::Exists("@sku".into()).expression(), "exists(@sku)");
        assert_eq!(AggregationFilter::NotExists("sku".into()).expression(), "!exists(@sku)");
    }

    #[test]
    fn test_cursor_args() {
        let cursor = CursorSpec {
            batch_size: 10,
            max_idle: Duration::from_secs(300),
        };
        assert_eq!(cursor.to_args(), vec!["WITHCURSOR", "COUNT", "10", "MAXIDLE", "300000"]);
    }
}
