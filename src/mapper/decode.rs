//! Lenient decoding of untyped row values
//!
//! Nulls decode to the zero value of the target type; anything else that does
//! not parse is an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::TypeHint;

use super::errors::{MapperError, MapperResult};
use super::value::RowValue;

/// Column types accepted by typed tuple mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    String,
    Integer,
    Long,
    Double,
    List,
}

impl ContentType {
    /// Content type used for list elements of a field with this hint
    pub fn for_hint(hint: TypeHint) -> Option<ContentType> {
        match hint {
            TypeHint::String => Some(ContentType::String),
            TypeHint::Integer => Some(ContentType::Integer),
            TypeHint::Long | TypeHint::Date | TypeHint::DateTime | TypeHint::Instant => {
                Some(ContentType::Long)
            }
            TypeHint::Double | TypeHint::Float => Some(ContentType::Double),
            _ => None,
        }
    }

    /// Decode a raw value; `element_hint` only matters for `List`
    pub fn decode(&self, raw: &RowValue, element_hint: Option<TypeHint>) -> MapperResult<RowValue> {
        match self {
            ContentType::String => Ok(RowValue::Str(LenientDecode::string(raw))),
            ContentType::Integer => LenientDecode::integer(raw).map(|v| RowValue::Int(v as i64)),
            ContentType::Long => LenientDecode::long(raw).map(RowValue::Int),
            ContentType::Double => LenientDecode::double(raw).map(RowValue::Float),
            ContentType::List => LenientDecode::list(raw, element_hint).map(RowValue::List),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::String => "string",
            ContentType::Integer => "integer",
            ContentType::Long => "long",
            ContentType::Double => "double",
            ContentType::List => "list",
        };
        write!(f, "{}", name)
    }
}

/// Named decode policy for raw engine values
pub struct LenientDecode;

impl LenientDecode {
    /// Null and lists-as-text fall back to ""
    pub fn string(raw: &RowValue) -> String {
        match raw {
            RowValue::Null => String::new(),
            RowValue::List(_) => raw.to_string(),
            other => other.to_text().unwrap_or_default(),
        }
    }

    /// Null and blank decode to 0
    pub fn long(raw: &RowValue) -> MapperResult<i64> {
        match raw {
            RowValue::Null => Ok(0),
            RowValue::Int(i) => Ok(*i),
            RowValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            RowValue::Str(s) if s.trim().is_empty() => Ok(0),
            RowValue::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| MapperError::parse_failed(s, "long")),
            other => Err(MapperError::parse_failed(other, "long")),
        }
    }

    /// As `long`, then narrowed to 32 bits
    pub fn integer(raw: &RowValue) -> MapperResult<i32> {
        let wide = Self::long(raw)?;
        i32::try_from(wide).map_err(|_| MapperError::parse_failed(wide, "integer"))
    }

    /// Null and blank decode to 0.0
    pub fn double(raw: &RowValue) -> MapperResult<f64> {
        match raw {
            RowValue::Null => Ok(0.0),
            RowValue::Int(i) => Ok(*i as f64),
            RowValue::Float(f) => Ok(*f),
            RowValue::Str(s) if s.trim().is_empty() => Ok(0.0),
            RowValue::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| MapperError::parse_failed(s, "double")),
            other => Err(MapperError::parse_failed(other, "double")),
        }
    }

    /// Null decodes to false; accepts true/false and 1/0
    pub fn boolean(raw: &RowValue) -> MapperResult<bool> {
        match raw {
            RowValue::Null => Ok(false),
            RowValue::Int(0) => Ok(false),
            RowValue::Int(1) => Ok(true),
            RowValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                _ => Err(MapperError::parse_failed(s, "boolean")),
            },
            other => Err(MapperError::parse_failed(other, "boolean")),
        }
    }

    /// Element-wise decode using the field's hint; unhinted elements stay raw
    ///
    /// A JSON array in a string is expanded; any other scalar becomes a
    /// one-element list.
    pub fn list(raw: &RowValue, hint: Option<TypeHint>) -> MapperResult<Vec<RowValue>> {
        let items = match raw {
            RowValue::Null => return Ok(Vec::new()),
            RowValue::List(items) => items.clone(),
            RowValue::Str(s) if s.trim_start().starts_with('[') => {
                match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(serde_json::Value::Array(values)) => {
                        values.iter().map(RowValue::from_json).collect()
                    }
                    _ => vec![raw.clone()],
                }
            }
            other => vec![other.clone()],
        };

        match hint.and_then(ContentType::for_hint) {
            Some(ContentType::List) | None => Ok(items),
            Some(element_type) => items
                .iter()
                .map(|item| element_type.decode(item, None))
                .collect(),
        }
    }
}

/// Strict conversion from a decoded row value into a native type
pub trait FromRowValue: Sized {
    fn from_row_value(value: RowValue) -> MapperResult<Self>;
}

impl FromRowValue for RowValue {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        Ok(value)
    }
}

impl FromRowValue for String {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        Ok(LenientDecode::string(&value))
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::long(&value)
    }
}

impl FromRowValue for i32 {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::integer(&value)
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::double(&value)
    }
}

impl FromRowValue for f32 {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::double(&value).map(|v| v as f32)
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::boolean(&value)
    }
}

impl FromRowValue for Vec<RowValue> {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        LenientDecode::list(&value, None)
    }
}

impl FromRowValue for Vec<String> {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        Ok(LenientDecode::list(&value, None)?
            .iter()
            .map(LenientDecode::string)
            .collect())
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}
