//! Group reducers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapper::with_at;
use crate::schema::TypeHint;

use super::errors::{AggregationError, AggregationResult};
use super::stage::SortField;

/// Reducer functions understood by GROUPBY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReducerFunction {
    Count,
    CountDistinct,
    CountDistinctish,
    Sum,
    Min,
    Max,
    Avg,
    Stddev,
    Quantile,
    #[serde(rename = "TOLIST")]
    ToList,
    FirstValue,
    RandomSample,
}

impl ReducerFunction {
    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            ReducerFunction::Count => "COUNT",
            ReducerFunction::CountDistinct => "COUNT_DISTINCT",
            ReducerFunction::CountDistinctish => "COUNT_DISTINCTISH",
            ReducerFunction::Sum => "SUM",
            ReducerFunction::Min => "MIN",
            ReducerFunction::Max => "MAX",
            ReducerFunction::Avg => "AVG",
            ReducerFunction::Stddev => "STDDEV",
            ReducerFunction::Quantile => "QUANTILE",
            ReducerFunction::ToList => "TOLIST",
            ReducerFunction::FirstValue => "FIRST_VALUE",
            ReducerFunction::RandomSample => "RANDOM_SAMPLE",
        }
    }

    /// Parse a wire name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name.trim().to_ascii_uppercase().as_str() {
            "COUNT" => ReducerFunction::Count,
            "COUNT_DISTINCT" => ReducerFunction::CountDistinct,
            "COUNT_DISTINCTISH" => ReducerFunction::CountDistinctish,
            "SUM" => ReducerFunction::Sum,
            "MIN" => ReducerFunction::Min,
            "MAX" => ReducerFunction::Max,
            "AVG" => ReducerFunction::Avg,
            "STDDEV" => ReducerFunction::Stddev,
            "QUANTILE" => ReducerFunction::Quantile,
            "TOLIST" => ReducerFunction::ToList,
            "FIRST_VALUE" => ReducerFunction::FirstValue,
            "RANDOM_SAMPLE" => ReducerFunction::RandomSample,
            _ => return None,
        };
        Some(function)
    }

    /// Alias used when none is given: the lowercase wire name
    pub fn default_alias(&self) -> String {
        self.name().to_ascii_lowercase()
    }

    /// Decoded type of the reducer's output column
    pub fn result_hint(&self, source: Option<TypeHint>) -> TypeHint {
        match self {
            ReducerFunction::Count
            | ReducerFunction::CountDistinct
            | ReducerFunction::CountDistinctish => TypeHint::Long,
            ReducerFunction::Avg | ReducerFunction::Stddev => TypeHint::Double,
            _ => source.unwrap_or(TypeHint::String),
        }
    }

    fn needs_field(&self) -> bool {
        !matches!(self, ReducerFunction::Count)
    }
}

impl fmt::Display for ReducerFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Extra reducer argument: a percentile, a sample size, or a sort key
#[derive(Debug, Clone, PartialEq)]
pub enum ReducerParam {
    Number(f64),
    Text(String),
    Sort(SortField),
}

impl ReducerParam {
    fn as_number(&self) -> Option<f64> {
        match self {
            ReducerParam::Number(n) => Some(*n),
            ReducerParam::Text(text) => text.trim().parse().ok(),
            ReducerParam::Sort(_) => None,
        }
    }
}

impl From<f64> for ReducerParam {
    fn from(value: f64) -> Self {
        ReducerParam::Number(value)
    }
}

impl From<i32> for ReducerParam {
    fn from(value: i32) -> Self {
        ReducerParam::Number(value as f64)
    }
}

impl From<&str> for ReducerParam {
    fn from(value: &str) -> Self {
        ReducerParam::Text(value.to_string())
    }
}

impl From<SortField> for ReducerParam {
    fn from(value: SortField) -> Self {
        ReducerParam::Sort(value)
    }
}

/// A reducer inside a GROUPBY
#[derive(Debug, Clone, PartialEq)]
pub struct ReducerSpec {
    pub function: ReducerFunction,
    /// Source field, without `@`
    pub field: Option<String>,
    pub alias: Option<String>,
    pub params: Vec<ReducerParam>,
}

impl ReducerSpec {
    /// Create a reducer over an optional source field
    pub fn new(function: ReducerFunction, field: Option<&str>, params: Vec<ReducerParam>) -> Self {
        Self {
            function,
            field: field.map(|f| crate::mapper::strip_at(f).to_string()),
            alias: None,
            params,
        }
    }

    /// Alias in effect: the explicit one, else the default
    pub fn effective_alias(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| self.function.default_alias())
    }

    /// `REDUCE FN nargs args... AS alias`
    pub fn to_args(&self) -> AggregationResult<Vec<String>> {
        let name = self.function.name();
        let mut reducer_args: Vec<String> = Vec::new();

        if self.function.needs_field() {
            match &self.field {
                Some(field) => reducer_args.push(with_at(field)),
                None => return Err(AggregationError::field_required(name)),
            }
        }

        match self.function {
            ReducerFunction::Quantile => {
                let percentile = self
                    .params
                    .first()
                    .and_then(ReducerParam::as_number)
                    .ok_or_else(|| AggregationError::param_required(name, "percentile"))?;
                reducer_args.push(percentile.to_string());
            }
            ReducerFunction::RandomSample => {
                let size = self
                    .params
                    .first()
                    .and_then(ReducerParam::as_number)
                    .filter(|n| *n >= 1.0 && n.fract() == 0.0)
                    .ok_or_else(|| AggregationError::param_required(name, "sample size"))?;
                reducer_args.push((size as u64).to_string());
            }
            ReducerFunction::FirstValue => {
                if let Some(ReducerParam::Sort(sort)) = self.params.first() {
                    reducer_args.push("BY".to_string());
                    reducer_args.push(sort.property());
                    reducer_args.push(sort.direction.as_str().to_string());
                }
            }
            _ => {}
        }

        let mut args = vec![
            "REDUCE".to_string(),
            name.to_string(),
            reducer_args.len().to_string(),
        ];
        args.extend(reducer_args);
        args.push("AS".to_string());
        args.push(self.effective_alias());
        Ok(args)
    }
}

impl fmt::Display for ReducerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        if let Some(field) = &self.field {
            write!(f, "({})", field)?;
        }
        write!(f, " as {}", self.effective_alias())
    }
}
