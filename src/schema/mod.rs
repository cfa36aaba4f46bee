//! Index schema metadata
//!
//! Field kinds, aliases and decoded types for each search index. Everything
//! that builds a query clause or decodes a row consults this module.

mod errors;
mod loader;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaLoader;
pub use types::{FieldKind, IndexSchema, IndexedField, SchemaProvider, TypeHint};
