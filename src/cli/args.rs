//! CLI argument definitions using clap
//!
//! Commands:
//! - searchstream compile --schemas <dir> [--config <path>]
//! - searchstream explain --schemas <dir> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// searchstream - compile search and aggregation queries without an engine
#[derive(Parser, Debug)]
#[command(name = "searchstream")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one query description read from stdin
    Compile {
        /// Path to configuration file; defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of index schema files
        #[arg(long, default_value = "./schemas")]
        schemas: PathBuf,
    },

    /// List the steps of one query description read from stdin
    Explain {
        /// Path to configuration file; defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of index schema files
        #[arg(long, default_value = "./schemas")]
        schemas: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
