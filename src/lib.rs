//! searchstream - A fluent query compiler and executor for search-indexed document stores
//!
//! Builds `FT.SEARCH` / `FT.AGGREGATE` commands from typed predicates,
//! query-by-example probes and aggregation stages, dispatches them through a
//! caller-supplied transport, and maps the raw rows back into tuples,
//! projections, maps or entities.

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod mapper;
pub mod observability;
pub mod pagination;
pub mod qbe;
pub mod query;
pub mod schema;
pub mod search;
pub mod transport;

pub use context::SearchContext;
pub use error::{SearchError, SearchResult};
