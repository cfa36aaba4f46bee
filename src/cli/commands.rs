//! CLI command implementations
//!
//! Both commands read one query description from stdin, resolve its index
//! against the schema directory and write one JSON response to stdout.
//! Problems with the description are reported as error responses; problems
//! with the environment fail the process.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::QueryConfig;
use crate::schema::{SchemaError, SchemaLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};
use super::request::{compile_request, explain_request, QueryRequest};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { config, schemas } => compile(config.as_deref(), &schemas),
        Command::Explain { config, schemas } => explain(config.as_deref(), &schemas),
    }
}

/// Compile the description on stdin to its engine command
pub fn compile(config_path: Option<&Path>, schemas: &Path) -> CliResult<()> {
    let (config, loader) = prepare(config_path, schemas)?;
    respond(compile_value(read_request()?, &loader, &config))
}

/// List the steps of the description on stdin
pub fn explain(config_path: Option<&Path>, schemas: &Path) -> CliResult<()> {
    let (config, loader) = prepare(config_path, schemas)?;
    respond(explain_value(read_request()?, &loader, &config))
}

/// `{"command": "...", "args": [...]}` for one description
pub fn compile_value(input: Value, loader: &SchemaLoader, config: &QueryConfig) -> CliResult<Value> {
    let request = QueryRequest::from_value(input)?;
    let schema = loader
        .get(&request.index)
        .ok_or_else(|| SchemaError::unknown_index(request.index.as_str()))?;
    let command = compile_request(&request, schema, config)?;
    Ok(json!({
        "command": command.to_string(),
        "args": command.args(),
    }))
}

/// `{"steps": [...]}` for one description
pub fn explain_value(input: Value, loader: &SchemaLoader, config: &QueryConfig) -> CliResult<Value> {
    let request = QueryRequest::from_value(input)?;
    let schema = loader
        .get(&request.index)
        .ok_or_else(|| SchemaError::unknown_index(request.index.as_str()))?;
    let steps = explain_request(&request, schema, config)?;
    Ok(json!({ "steps": steps }))
}

fn prepare(config_path: Option<&Path>, schemas: &Path) -> CliResult<(QueryConfig, SchemaLoader)> {
    let config = match config_path {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };
    config.apply_logging();

    let mut loader = SchemaLoader::new(schemas);
    loader
        .load_all()
        .map_err(|e| CliError::config_error(e.to_string()))?;
    Ok((config, loader))
}

fn respond(result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(e) if e.is_request_error() => write_error(e.code_str(), e.message()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IndexSchema, IndexedField};

    fn loader() -> SchemaLoader {
        let mut loader = SchemaLoader::new(Path::new("/nonexistent"));
        loader
            .register(
                IndexSchema::new("users")
                    .with_field(IndexedField::tag("$.role").with_alias("role"))
                    .with_field(IndexedField::text("$.name").with_alias("name")),
            )
            .unwrap();
        loader
    }

    #[test]
    fn test_compile_value_shape() {
        let input = json!({
            "index": "users",
            "filters": [{"field": "role", "op": "in", "value": ["admin", "manager"]}]
        });
        let data = compile_value(input, &loader(), &QueryConfig::default()).unwrap();
        assert!(data["command"].as_str().unwrap().starts_with("FT.SEARCH users"));
        assert_eq!(data["args"][0], "users");
    }

    #[test]
    fn test_unknown_index_is_request_error() {
        let input = json!({"index": "orders"});
        let err = compile_value(input, &loader(), &QueryConfig::default()).unwrap_err();
        assert!(err.is_request_error());
        assert_eq!(err.code_str(), "SEARCH_UNKNOWN_INDEX");
    }

    #[test]
    fn test_malformed_description_is_bad_request() {
        let input = json!({"filters": []});
        let err = explain_value(input, &loader(), &QueryConfig::default()).unwrap_err();
        assert_eq!(err.code_str(), "SEARCH_CLI_BAD_REQUEST");
    }

    #[test]
    fn test_explain_value_steps() {
        let input = json!({"index": "users", "text": "alice"});
        let data = explain_value(input, &loader(), &QueryConfig::default()).unwrap();
        assert!(data["steps"].as_array().unwrap().len() >= 2);
    }
}
