//! CLI module for searchstream
//!
//! Provides command-line interface for:
//! - compile: print the engine command for a JSON query description
//! - explain: print the steps of a JSON query description

mod args;
mod commands;
mod errors;
mod io;
mod request;

pub use args::{Cli, Command};
pub use commands::{compile, compile_value, explain, explain_value, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
pub use request::{
    compile_request, explain_request, ExampleRequest, FilterOp, FilterRequest, QueryRequest,
    SearchOptions, StageRequest,
};
