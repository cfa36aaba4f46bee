//! Untyped row values as returned by the engine

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single untyped value in a result row
///
/// Floats compare and hash by bit pattern so values can key maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RowValue>),
}

impl RowValue {
    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RowValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar rendered as text; `None` for null and lists
    pub fn to_text(&self) -> Option<String> {
        match self {
            RowValue::Null | RowValue::List(_) => None,
            RowValue::Int(i) => Some(i.to_string()),
            RowValue::Float(f) => Some(f.to_string()),
            RowValue::Str(s) => Some(s.clone()),
        }
    }

    /// Convert from a JSON value; objects are kept as their JSON text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => RowValue::Null,
            Value::Bool(b) => RowValue::Str(b.to_string()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RowValue::Int(i),
                None => RowValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => RowValue::Str(s.clone()),
            Value::Array(items) => RowValue::List(items.iter().map(RowValue::from_json).collect()),
            Value::Object(_) => RowValue::Str(value.to_string()),
        }
    }

    /// Convert to a JSON value, leaving strings as strings
    pub fn to_json(&self) -> Value {
        match self {
            RowValue::Null => Value::Null,
            RowValue::Int(i) => Value::from(*i),
            RowValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RowValue::Str(s) => Value::String(s.clone()),
            RowValue::List(items) => Value::Array(items.iter().map(RowValue::to_json).collect()),
        }
    }
}

impl PartialEq for RowValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RowValue::Null, RowValue::Null) => true,
            (RowValue::Int(a), RowValue::Int(b)) => a == b,
            (RowValue::Float(a), RowValue::Float(b)) => a.to_bits() == b.to_bits(),
            (RowValue::Str(a), RowValue::Str(b)) => a == b,
            (RowValue::List(a), RowValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RowValue {}

impl Hash for RowValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            RowValue::Null => {}
            RowValue::Int(i) => i.hash(state),
            RowValue::Float(f) => f.to_bits().hash(state),
            RowValue::Str(s) => s.hash(state),
            RowValue::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Null => write!(f, "null"),
            RowValue::Int(i) => write!(f, "{}", i),
            RowValue::Float(x) => write!(f, "{}", x),
            RowValue::Str(s) => write!(f, "{}", s),
            RowValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::Str(value.to_string())
    }
}

impl From<String> for RowValue {
    fn from(value: String) -> Self {
        RowValue::Str(value)
    }
}

impl From<i64> for RowValue {
    fn from(value: i64) -> Self {
        RowValue::Int(value)
    }
}

impl From<f64> for RowValue {
    fn from(value: f64) -> Self {
        RowValue::Float(value)
    }
}

impl<T: Into<RowValue>> From<Vec<T>> for RowValue {
    fn from(values: Vec<T>) -> Self {
        RowValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One row of an engine response: optional document key plus ordered fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    id: Option<String>,
    fields: Vec<(String, RowValue)>,
}

impl ResultRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row for a document key
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Vec::new(),
        }
    }

    /// Append a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<RowValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a field in place; an existing key is overwritten
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<RowValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Build a row from a flat JSON object
    pub fn from_json(id: Option<String>, object: &Value) -> Self {
        let mut row = Self {
            id,
            fields: Vec::new(),
        };
        if let Value::Object(map) = object {
            for (key, value) in map {
                row.fields.push((key.clone(), RowValue::from_json(value)));
            }
        }
        row
    }

    /// Document key, when the engine returned one
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Value under an exact key
    pub fn get(&self, key: &str) -> Option<&RowValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value under `key` or `@key`
    pub fn get_alias(&self, key: &str) -> Option<&RowValue> {
        let bare = key.strip_prefix('@').unwrap_or(key);
        self.get(bare).or_else(|| self.get(&format!("@{}", bare)))
    }

    /// Fields in engine order
    pub fn fields(&self) -> &[(String, RowValue)] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
