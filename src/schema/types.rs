//! Index schema definitions
//!
//! An index schema lists the fields the search engine indexes for one
//! document type: where each value lives in the document, the alias the
//! engine knows it by, how it is indexed, and the type the application
//! expects back.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// How the engine indexes a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldKind {
    /// Tokenized full text
    Text,
    /// Exact-match tag set
    Tag,
    /// Numeric range
    Numeric,
    /// Longitude/latitude point
    Geo,
    /// Embedding vector
    Vector,
}

impl FieldKind {
    /// Returns the engine keyword for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Tag => "TAG",
            FieldKind::Numeric => "NUMERIC",
            FieldKind::Geo => "GEO",
            FieldKind::Vector => "VECTOR",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application-side type a field value decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeHint {
    String,
    Integer,
    Long,
    Double,
    Float,
    Boolean,
    /// Calendar date, epoch millis at UTC midnight
    Date,
    /// Local date-time, interpreted as UTC
    DateTime,
    /// Absolute instant
    Instant,
    /// Longitude/latitude pair
    Point,
    Other,
}

impl TypeHint {
    /// True for hints whose values are stored as epoch millis
    pub fn is_temporal(&self) -> bool {
        matches!(self, TypeHint::Date | TypeHint::DateTime | TypeHint::Instant)
    }

    /// True for hints that decode to a number
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeHint::Integer | TypeHint::Long | TypeHint::Double | TypeHint::Float
        )
    }
}

impl Default for TypeHint {
    fn default() -> Self {
        TypeHint::String
    }
}

/// One indexed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedField {
    /// Document path (`$.address.city` for JSON, plain name for hashes)
    pub path: String,
    /// Engine alias; derived from the path when absent
    #[serde(default)]
    pub alias: Option<String>,
    /// Index kind
    pub kind: FieldKind,
    /// Decoded type
    #[serde(default)]
    pub target: TypeHint,
    /// Whether the engine keeps a sortable copy
    #[serde(default)]
    pub sortable: bool,
}

impl IndexedField {
    /// Create a field with an alias derived from its path
    pub fn new(path: impl Into<String>, kind: FieldKind, target: TypeHint) -> Self {
        Self {
            path: path.into(),
            alias: None,
            kind,
            target,
            sortable: false,
        }
    }

    /// Create a TEXT field decoding to a string
    pub fn text(path: impl Into<String>) -> Self {
        Self::new(path, FieldKind::Text, TypeHint::String)
    }

    /// Create a TAG field decoding to a string
    pub fn tag(path: impl Into<String>) -> Self {
        Self::new(path, FieldKind::Tag, TypeHint::String)
    }

    /// Create a NUMERIC field with the given decoded type
    pub fn numeric(path: impl Into<String>, target: TypeHint) -> Self {
        Self::new(path, FieldKind::Numeric, target)
    }

    /// Create a GEO field decoding to a point
    pub fn geo(path: impl Into<String>) -> Self {
        Self::new(path, FieldKind::Geo, TypeHint::Point)
    }

    /// Create a VECTOR field
    pub fn vector(path: impl Into<String>) -> Self {
        Self::new(path, FieldKind::Vector, TypeHint::Other)
    }

    /// Set an explicit alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Mark the field sortable
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Engine alias: the explicit alias, or the path with `$.` dropped and
    /// dots replaced by underscores
    pub fn alias(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.path_segments().join("_"),
        }
    }

    /// Path split into object keys, `[*]` array markers removed
    pub fn path_segments(&self) -> Vec<String> {
        let trimmed = self.path.strip_prefix("$.").unwrap_or(&self.path);
        trimmed
            .split('.')
            .map(|segment| segment.trim_end_matches("[*]").to_string())
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

/// Schema of one search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name passed as the first argument of every command
    pub index_name: String,
    /// Key prefix of documents covered by the index
    #[serde(default)]
    pub prefix: Option<String>,
    /// Indexed fields, in declaration order
    pub fields: Vec<IndexedField>,
}

impl IndexSchema {
    /// Create an empty schema for an index
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            prefix: None,
            fields: Vec::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: IndexedField) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the key prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Index name
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Find a field by alias; a leading `@` is ignored
    pub fn field(&self, alias: &str) -> Option<&IndexedField> {
        let alias = alias.strip_prefix('@').unwrap_or(alias);
        self.fields.iter().find(|f| f.alias() == alias)
    }

    /// Find a field by alias or fail with SEARCH_FIELD_NOT_IN_SCHEMA
    pub fn require(&self, alias: &str) -> SchemaResult<&IndexedField> {
        self.field(alias)
            .ok_or_else(|| SchemaError::field_not_in_schema(&self.index_name, alias))
    }

    /// Declared decoded type of a field, if the field is known
    pub fn hint_for(&self, alias: &str) -> Option<TypeHint> {
        self.field(alias).map(|f| f.target)
    }

    /// Validates structure: non-empty names, unique aliases
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.index_name.trim().is_empty() {
            return Err("index_name must not be empty".into());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.path.trim().is_empty() {
                return Err("field path must not be empty".into());
            }
            let alias = field.alias();
            if !seen.insert(alias.clone()) {
                return Err(SchemaError::duplicate_field(&self.index_name, alias)
                    .message()
                    .to_string());
            }
        }

        Ok(())
    }
}

/// Lookup seam for schemas by index name
pub trait SchemaProvider {
    /// Schema registered for `index`, if any
    fn schema_for(&self, index: &str) -> Option<&IndexSchema>;

    /// Schema registered for `index`, or SEARCH_UNKNOWN_INDEX
    fn require_schema(&self, index: &str) -> SchemaResult<&IndexSchema> {
        self.schema_for(index)
            .ok_or_else(|| SchemaError::unknown_index(index))
    }
}

impl SchemaProvider for IndexSchema {
    fn schema_for(&self, index: &str) -> Option<&IndexSchema> {
        if self.index_name == index {
            Some(self)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> IndexSchema {
        IndexSchema::new("products")
            .with_field(IndexedField::tag("$.brand"))
            .with_field(IndexedField::text("$.name").sortable())
            .with_field(IndexedField::numeric("$.price", TypeHint::Double))
            .with_field(IndexedField::geo("$.address.location").with_alias("location"))
            .with_field(IndexedField::tag("$.address.city"))
    }

    #[test]
    fn test_alias_derived_from_json_path() {
        let field = IndexedField::tag("$.address.city");
        assert_eq!(field.alias(), "address_city");
        assert_eq!(field.path_segments(), vec!["address", "city"]);
    }

    #[test]
    fn test_alias_for_hash_field() {
        assert_eq!(IndexedField::tag("brand").alias(), "brand");
    }

    #[test]
    fn test_array_markers_dropped_from_path() {
        let field = IndexedField::tag("$.colors[*]");
        assert_eq!(field.path_segments(), vec!["colors"]);
        assert_eq!(field.alias(), "colors");
    }

    #[test]
    fn test_field_lookup_ignores_at_prefix() {
        let schema = products();
        assert_eq!(schema.field("@brand").map(|f| f.kind), Some(FieldKind::Tag));
        assert_eq!(schema.field("location").map(|f| f.kind), Some(FieldKind::Geo));
        assert!(schema.field("colour").is_none());
    }

    #[test]
    fn test_require_unknown_field() {
        let err = products().require("colour").unwrap_err();
        assert_eq!(err.field(), Some("colour"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let schema = IndexSchema::new("products")
            .with_field(IndexedField::tag("$.brand"))
            .with_field(IndexedField::text("brand"));
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_schema_json_shape() {
        let json = r#"{
            "index_name": "products",
            "fields": [
                {"path": "$.brand", "kind": "TAG"},
                {"path": "$.price", "kind": "NUMERIC", "target": "double"}
            ]
        }"#;
        let schema: IndexSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.fields[0].target, TypeHint::String);
        assert_eq!(schema.hint_for("price"), Some(TypeHint::Double));
        assert!(schema.validate_structure().is_ok());
    }

    #[test]
    fn test_schema_provider_for_single_schema() {
        let schema = products();
        assert!(schema.schema_for("products").is_some());
        assert!(schema.require_schema("orders").is_err());
    }
}
