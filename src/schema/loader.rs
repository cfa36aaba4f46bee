//! Schema loader
//!
//! Reads one index schema per `*.json` file from a directory and keeps them
//! in memory keyed by index name. A malformed file fails the whole load.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::observability::{log_event, Event, Severity};

use super::errors::{SchemaError, SchemaResult};
use super::types::{IndexSchema, SchemaProvider};

/// Schema registry backed by a directory of JSON files
pub struct SchemaLoader {
    schema_dir: PathBuf,
    schemas: HashMap<String, IndexSchema>,
}

impl SchemaLoader {
    /// Creates a loader for `schema_dir`; nothing is read until `load_all`
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            schemas: HashMap::new(),
        }
    }

    /// Returns the schema directory path
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every JSON schema file in the directory
    ///
    /// A missing directory loads nothing.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.schema_dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(
                self.schema_dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema(
                    self.schema_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }

        // Directory order is platform dependent
        paths.sort();
        for path in &paths {
            self.load_schema_file(path)?;
        }

        let count = self.schemas.len().to_string();
        let dir = self.schema_dir.display().to_string();
        log_event(
            Severity::Info,
            Event::SchemasLoaded,
            &[("count", count.as_str()), ("dir", dir.as_str())],
        );

        Ok(())
    }

    /// Loads a single schema file
    pub fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: IndexSchema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(path.display().to_string(), e))?;

        self.schemas.insert(schema.index_name.clone(), schema);
        Ok(())
    }

    /// Registers a schema directly, replacing any schema for the same index
    pub fn register(&mut self, schema: IndexSchema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema("<in-memory>", e))?;
        self.schemas.insert(schema.index_name.clone(), schema);
        Ok(())
    }

    /// Gets a schema by index name
    pub fn get(&self, index: &str) -> Option<&IndexSchema> {
        self.schemas.get(index)
    }

    /// Returns the number of loaded schemas
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Writes a schema to `<schema_dir>/<index_name>.json`
    pub fn save_schema(&self, schema: &IndexSchema) -> SchemaResult<PathBuf> {
        let path = self.schema_dir.join(format!("{}.json", schema.index_name));

        fs::create_dir_all(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(
                self.schema_dir.display().to_string(),
                format!("Failed to create schema directory: {}", e),
            )
        })?;

        let content = serde_json::to_string_pretty(schema).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}

impl SchemaProvider for SchemaLoader {
    fn schema_for(&self, index: &str) -> Option<&IndexSchema> {
        self.get(index)
    }
}
