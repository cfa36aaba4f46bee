//! JSON query descriptions accepted on stdin
//!
//! A description names an index, composes filters and examples onto a
//! search, and optionally continues into aggregation stages. It compiles
//! against an offline context, so nothing is sent to an engine.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::aggregation::{AggregationPipeline, ReducerFunction, ReducerParam, SortField};
use crate::config::QueryConfig;
use crate::context::SearchContext;
use crate::qbe::{Example, MatchSpec, StringMatchMode};
use crate::query::{Field, Predicate};
use crate::schema::IndexSchema;
use crate::search::SearchStream;
use crate::transport::{Command, OfflineTransport};

use super::errors::{CliError, CliResult};

/// One query description
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub index: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterRequest>,
    #[serde(default)]
    pub examples: Vec<ExampleRequest>,
    #[serde(default)]
    pub search: SearchOptions,
    /// Present when the query is an aggregation
    #[serde(default)]
    pub stages: Option<Vec<StageRequest>>,
}

impl QueryRequest {
    pub fn from_value(value: Value) -> CliResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    NotEq,
    In,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    Containing,
    Gt,
    Ge,
    Lt,
    Le,
    Between,
    Near,
    IsMissing,
}

/// One field predicate
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    pub field: String,
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub negate: bool,
}

/// One query-by-example probe
#[derive(Debug, Clone, Deserialize)]
pub struct ExampleRequest {
    pub probe: Value,
    #[serde(default)]
    pub match_any: bool,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub string_mode: StringMatchMode,
}

/// Plain search options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub sort: Option<SortField>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub return_fields: Vec<String>,
    #[serde(default)]
    pub verbatim: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub dialect: Option<u32>,
}

/// One aggregation stage
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRequest {
    Load(Vec<String>),
    LoadAll,
    GroupBy(Vec<String>),
    Reduce {
        function: String,
        #[serde(default)]
        field: Option<String>,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        params: Vec<Value>,
    },
    Apply {
        expression: String,
        alias: String,
    },
    Sort {
        fields: Vec<SortField>,
        #[serde(default)]
        max: Option<usize>,
    },
    Filter(String),
    Limit {
        #[serde(default)]
        offset: usize,
        count: usize,
    },
    Cursor {
        count: usize,
        #[serde(default)]
        max_idle_ms: Option<u64>,
    },
}

/// Compile a description to the command it would send
pub fn compile_request(
    request: &QueryRequest,
    schema: &IndexSchema,
    config: &QueryConfig,
) -> CliResult<Command> {
    let ctx = SearchContext::with_config(OfflineTransport, config.clone());
    let stream = build_stream(&ctx, schema, request)?;
    match &request.stages {
        None => Ok(stream.try_compile()?),
        Some(stages) => {
            stream.try_compile()?;
            let pipeline = build_pipeline(stream.aggregate(), stages, config)?;
            Ok(pipeline.compile()?)
        }
    }
}

/// Human-readable steps of a description
pub fn explain_request(
    request: &QueryRequest,
    schema: &IndexSchema,
    config: &QueryConfig,
) -> CliResult<Vec<String>> {
    let ctx = SearchContext::with_config(OfflineTransport, config.clone());
    let stream = build_stream(&ctx, schema, request)?;
    match &request.stages {
        None => Ok(stream.explain()),
        Some(stages) => Ok(build_pipeline(stream.aggregate(), stages, config)?.explain()),
    }
}

fn build_stream<'a>(
    ctx: &'a SearchContext<OfflineTransport>,
    schema: &'a IndexSchema,
    request: &QueryRequest,
) -> CliResult<SearchStream<'a, OfflineTransport>> {
    let mut stream = ctx.search(schema);

    for filter in &request.filters {
        let field = Field::from_schema(schema, &filter.field)?;
        let mut predicate = predicate_for(&field, filter)?;
        if filter.negate {
            predicate = predicate.negate();
        }
        stream = stream.filter(predicate);
    }

    for example in &request.examples {
        let spec = if example.match_any {
            MatchSpec::matching_any()
        } else {
            MatchSpec::matching_all()
        };
        let spec = spec
            .with_ignore_paths(example.ignore.iter().cloned())
            .with_string_matcher(example.string_mode);
        stream = stream.filter_example(&Example::from_value(example.probe.clone(), spec));
    }

    if let Some(text) = &request.text {
        stream = stream.filter_text(text);
    }

    let options = &request.search;
    if let Some(sort) = &options.sort {
        stream = stream.sorted(sort.clone());
    }
    if let Some(limit) = options.limit {
        stream = stream.limit(limit);
    }
    if let Some(skip) = options.skip {
        stream = stream.skip(skip);
    }
    if let Some(dialect) = options.dialect {
        stream = stream.dialect(dialect);
    }
    if !options.return_fields.is_empty() {
        let fields: Vec<&str> = options.return_fields.iter().map(String::as_str).collect();
        stream = stream.return_fields(&fields);
    }
    if options.verbatim {
        stream = stream.verbatim();
    }
    if let Some(ms) = options.timeout_ms {
        stream = stream.timeout(Duration::from_millis(ms));
    }
    Ok(stream)
}

fn build_pipeline<'a>(
    mut pipeline: AggregationPipeline<'a, OfflineTransport>,
    stages: &[StageRequest],
    config: &QueryConfig,
) -> CliResult<AggregationPipeline<'a, OfflineTransport>> {
    for stage in stages {
        pipeline = match stage {
            StageRequest::Load(fields) => pipeline.load(&as_strs(fields)),
            StageRequest::LoadAll => pipeline.load_all(),
            StageRequest::GroupBy(fields) => pipeline.group_by(&as_strs(fields)),
            StageRequest::Reduce {
                function,
                field,
                alias,
                params,
            } => {
                if ReducerFunction::from_name(function).is_none() {
                    return Err(CliError::bad_request(format!("unknown reducer: {}", function)));
                }
                let params = params.iter().map(reducer_param).collect::<CliResult<Vec<_>>>()?;
                let pipeline = pipeline.reduce_named(function, field.as_deref(), &params);
                match alias {
                    Some(alias) => pipeline.as_alias(alias),
                    None => pipeline,
                }
            }
            StageRequest::Apply { expression, alias } => pipeline.apply(expression, alias),
            StageRequest::Sort { fields, max } => match max {
                Some(max) => pipeline.sorted_max(*max, fields),
                None => pipeline.sorted(fields),
            },
            StageRequest::Filter(expression) => pipeline.filter(expression),
            StageRequest::Limit { offset, count } => pipeline.limit_offset(*offset, *count),
            StageRequest::Cursor { count, max_idle_ms } => {
                let idle = max_idle_ms.unwrap_or(config.cursor_idle_timeout_ms);
                pipeline.cursor(*count, Duration::from_millis(idle))
            }
        };
    }
    Ok(pipeline)
}

fn as_strs(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}

fn reducer_param(value: &Value) -> CliResult<ReducerParam> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(ReducerParam::Number)
            .ok_or_else(|| CliError::bad_request(format!("bad reducer parameter: {}", n))),
        Value::String(s) => Ok(ReducerParam::Text(s.clone())),
        Value::Object(_) => Ok(ReducerParam::Sort(serde_json::from_value(value.clone())?)),
        other => Err(CliError::bad_request(format!("bad reducer parameter: {}", other))),
    }
}

fn number(filter: &FilterRequest, value: &Value) -> CliResult<f64> {
    value.as_f64().ok_or_else(|| {
        CliError::bad_request(format!("{} expects a number, got {}", filter.field, value))
    })
}

fn text(filter: &FilterRequest) -> CliResult<String> {
    match &filter.value {
        Value::String(s) => Ok(s.clone()),
        other => Err(CliError::bad_request(format!(
            "{} expects a string, got {}",
            filter.field, other
        ))),
    }
}

fn predicate_for(field: &Field, filter: &FilterRequest) -> CliResult<Predicate> {
    let predicate = match filter.op {
        FilterOp::Eq => field.eq(filter.value.clone()),
        FilterOp::NotEq => field.not_eq(filter.value.clone()),
        FilterOp::In => match &filter.value {
            Value::Array(values) => field.in_values(values.iter().cloned()),
            other => field.in_values([other.clone()]),
        },
        FilterOp::Like => field.like(text(filter)?),
        FilterOp::NotLike => field.not_like(text(filter)?),
        FilterOp::StartsWith => field.starts_with(text(filter)?),
        FilterOp::EndsWith => field.ends_with(text(filter)?),
        FilterOp::Containing => field.containing(text(filter)?),
        FilterOp::Gt => field.gt(number(filter, &filter.value)?),
        FilterOp::Ge => field.ge(number(filter, &filter.value)?),
        FilterOp::Lt => field.lt(number(filter, &filter.value)?),
        FilterOp::Le => field.le(number(filter, &filter.value)?),
        FilterOp::Between => match filter.value.as_array().map(Vec::as_slice) {
            Some([low, high]) => field.between(number(filter, low)?, number(filter, high)?),
            _ => {
                return Err(CliError::bad_request(format!(
                    "{} between expects [low, high]",
                    filter.field
                )))
            }
        },
        FilterOp::Near => {
            let lon = number(filter, &filter.value["lon"])?;
            let lat = number(filter, &filter.value["lat"])?;
            let radius = number(filter, &filter.value["radius"])?;
            let unit = filter.value["unit"].as_str().unwrap_or("km");
            field.near(lon, lat, radius, unit)
        }
        FilterOp::IsMissing => field.is_missing(),
    };
    Ok(predicate)
}
