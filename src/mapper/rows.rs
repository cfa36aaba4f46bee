//! Row-to-shape mapping: tuples, maps, entities, projections

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::decode::ContentType;
use super::errors::{MapperError, MapperResult};
use super::fields::{strip_at, ReturnFieldSet};
use super::projection::Projection;
use super::tuple::{Tuple, MAX_TUPLE_ARITY};
use super::value::{ResultRow, RowValue};

/// One mapped row, keys without a leading `@`
pub type RowMap = BTreeMap<String, RowValue>;

/// Keys that carry a document id, in priority order
pub const ID_KEYS: [&str; 3] = ["id", "_id", "@id"];

/// Map each row to a labeled tuple over the return fields
///
/// Column `i` is decoded with `content_types[i]` (string when absent). List
/// columns decode element-wise with the alias's type hint.
pub fn to_tuples(
    rows: &[ResultRow],
    fields: &ReturnFieldSet,
    content_types: &[ContentType],
) -> MapperResult<Vec<Tuple>> {
    let labels = fields.aliases();
    let mut tuples = Vec::with_capacity(rows.len());

    for row in rows {
        if labels.is_empty() || labels.len() > MAX_TUPLE_ARITY {
            tuples.push(Tuple::empty());
            continue;
        }

        let mut values = Vec::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let raw = row.get_alias(label).cloned().unwrap_or(RowValue::Null);
            let content_type = content_types.get(i).copied().unwrap_or(ContentType::String);
            values.push(content_type.decode(&raw, fields.hint(label))?);
        }
        tuples.push(Tuple::new(labels.to_vec(), values));
    }

    Ok(tuples)
}

/// Map each row to an ordered map
///
/// With `include_id`, the first of `id`, `_id`, `@id` present (falling back
/// to the document key) is copied as `id`. With a non-empty return set only
/// those aliases are copied; otherwise every non-id key is.
pub fn to_maps(
    rows: &[ResultRow],
    fields: &ReturnFieldSet,
    include_id: bool,
) -> Vec<RowMap> {
    rows.iter()
        .map(|row| row_to_map(row, fields, include_id))
        .collect()
}

fn row_to_map(row: &ResultRow, fields: &ReturnFieldSet, include_id: bool) -> RowMap {
    let mut map = RowMap::new();

    if include_id {
        let id = ID_KEYS
            .iter()
            .find_map(|key| row.get(key).cloned())
            .or_else(|| row.id().map(RowValue::from));
        if let Some(id) = id {
            map.insert("id".to_string(), id);
        }
    }

    if fields.is_empty() {
        for (key, value) in row.fields() {
            if ID_KEYS.contains(&key.as_str()) {
                continue;
            }
            map.insert(strip_at(key).to_string(), value.clone());
        }
    } else {
        for alias in fields.aliases() {
            if !include_id && ID_KEYS.contains(&alias.as_str()) {
                continue;
            }
            if let Some(value) = row.get_alias(alias) {
                map.insert(strip_at(alias).to_string(), value.clone());
            }
        }
    }

    map
}

/// Decode each row into an entity
///
/// A `$` field holding a JSON document decodes directly. Hash-style rows are
/// first tried with JSON-looking values expanded (numbers, booleans,
/// arrays, objects), then with every value as a string.
pub fn to_entities<E: DeserializeOwned>(rows: &[ResultRow]) -> MapperResult<Vec<E>> {
    rows.iter().map(decode_entity).collect()
}

/// Decode one row into an entity
pub fn decode_entity<E: DeserializeOwned>(row: &ResultRow) -> MapperResult<E> {
    if let Some(RowValue::Str(document)) = row.get("$") {
        let mut value: Value = serde_json::from_str(document)
            .map_err(|e| MapperError::decode_failed(format!("Invalid JSON document: {}", e)))?;
        inject_id(&mut value, row.id());
        return serde_json::from_value(value)
            .map_err(|e| MapperError::decode_failed(e.to_string()));
    }

    let mut expanded = hash_row_object(row, true);
    inject_id(&mut expanded, row.id());
    match serde_json::from_value(expanded) {
        Ok(entity) => Ok(entity),
        Err(_) => {
            let mut literal = hash_row_object(row, false);
            inject_id(&mut literal, row.id());
            serde_json::from_value(literal).map_err(|e| MapperError::decode_failed(e.to_string()))
        }
    }
}

/// Build projections from rows
pub fn to_projections<P: Projection>(rows: &[ResultRow]) -> Vec<P> {
    rows.iter().map(P::from_row).collect()
}

fn hash_row_object(row: &ResultRow, expand: bool) -> Value {
    let mut object = Map::new();
    for (key, value) in row.fields() {
        let json = match value {
            RowValue::Str(text) if expand => {
                serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            other => other.to_json(),
        };
        object.insert(strip_at(key).to_string(), json);
    }
    Value::Object(object)
}

fn inject_id(value: &mut Value, id: Option<&str>) {
    if let (Value::Object(object), Some(id)) = (value, id) {
        object
            .entry("id")
            .or_insert_with(|| Value::String(id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeHint;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        id: String,
        name: String,
        price: f64,
        #[serde(default)]
        colors: Vec<String>,
    }

    fn fields(entries: &[(&str, Option<TypeHint>)]) -> ReturnFieldSet {
        let mut set = ReturnFieldSet::new();
        for (alias, hint) in entries {
            set.insert(alias, *hint);
        }
        set
    }

    #[test]
    fn test_tuples_decode_per_column() {
        let rows = vec![ResultRow::new()
            .with_field("brand", "Nike")
            .with_field("count", "3")
            .with_field("avg_price", "19.5")];
        let set = fields(&[
            ("brand", Some(TypeHint::String)),
            ("count", Some(TypeHint::Long)),
            ("avg_price", Some(TypeHint::Double)),
        ]);

        let tuples = to_tuples(
            &rows,
            &set,
            &[ContentType::String, ContentType::Long, ContentType::Double],
        )
        .unwrap();
        assert_eq!(
            tuples[0].values(),
            &[RowValue::from("Nike"), RowValue::Int(3), RowValue::Float(19.5)]
        );
        assert_eq!(tuples[0].labels()[2], "avg_price");
    }

    #[test]
    fn test_tuples_null_defaults() {
        let rows = vec![ResultRow::new().with_field("brand", "Nike")];
        let set = fields(&[("brand", None), ("count", Some(TypeHint::Long))]);
        let tuples = to_tuples(&rows, &set, &[ContentType::String, ContentType::Long]).unwrap();
        assert_eq!(tuples[0].get(1), Some(&RowValue::Int(0)));
    }

    #[test]
    fn test_tuples_empty_return_set() {
        let rows = vec![ResultRow::new().with_field("brand", "Nike")];
        let tuples = to_tuples(&rows, &ReturnFieldSet::new(), &[]).unwrap();
        assert!(tuples[0].is_empty());
    }

    #[test]
    fn test_tuples_parse_error_propagates() {
        let rows = vec![ResultRow::new().with_field("count", "lots")];
        let set = fields(&[("count", Some(TypeHint::Long))]);
        assert!(to_tuples(&rows, &set, &[ContentType::Long]).is_err());
    }

    #[test]
    fn test_tuples_list_column_uses_hint() {
        let rows = vec![ResultRow::new().with_field("prices", vec!["1.5", "2"])];
        let set = fields(&[("prices", Some(TypeHint::Double))]);
        let tuples = to_tuples(&rows, &set, &[ContentType::List]).unwrap();
        assert_eq!(
            tuples[0].get(0),
            Some(&RowValue::List(vec![RowValue::Float(1.5), RowValue::Float(2.0)]))
        );
    }

    #[test]
    fn test_maps_without_id() {
        let rows = vec![ResultRow::with_id("product:1")
            .with_field("id", "1")
            .with_field("@name", "Shoe")];
        let maps = to_maps(&rows, &ReturnFieldSet::new(), false);
        assert!(!maps[0].contains_key("id"));
        assert_eq!(maps[0].get("name"), Some(&RowValue::from("Shoe")));
    }

    #[test]
    fn test_maps_id_priority() {
        let rows = vec![
            ResultRow::new()
                .with_field("@id", "c")
                .with_field("_id", "b")
                .with_field("id", "a"),
            ResultRow::new().with_field("@id", "c").with_field("_id", "b"),
            ResultRow::new().with_field("@id", "c"),
            ResultRow::with_id("doc:9"),
        ];
        let maps = to_maps(&rows, &ReturnFieldSet::new(), true);
        let ids: Vec<_> = maps.iter().map(|m| m.get("id").cloned()).collect();
        assert_eq!(
            ids,
            vec![
                Some(RowValue::from("a")),
                Some(RowValue::from("b")),
                Some(RowValue::from("c")),
                Some(RowValue::from("doc:9")),
            ]
        );
        for map in &maps {
            assert_eq!(map.keys().filter(|k| k.contains("id")).count(), 1);
        }
    }

    #[test]
    fn test_maps_explicit_return_fields() {
        let rows = vec![ResultRow::new()
            .with_field("@brand", "Nike")
            .with_field("count", "4")
            .with_field("extra", "x")];
        let set = fields(&[("brand", None), ("count", None)]);
        let maps = to_maps(&rows, &set, false);
        assert_eq!(maps[0].len(), 2);
        assert_eq!(maps[0].get("brand"), Some(&RowValue::from("Nike")));
    }

    #[test]
    fn test_entity_from_json_document() {
        let row = ResultRow::with_id("product:1").with_field(
            "$",
            r#"{"name":"Shoe","price":49.99,"colors":["red"]}"#,
        );
        let product: Product = decode_entity(&row).unwrap();
        assert_eq!(product.id, "product:1");
        assert_eq!(product.colors, vec!["red".to_string()]);
    }

    #[test]
    fn test_entity_from_hash_row() {
        let row = ResultRow::with_id("product:7")
            .with_field("name", "Shoe")
            .with_field("price", "49.99");
        let product: Product = decode_entity(&row).unwrap();
        assert_eq!(product.id, "product:7");
        assert_eq!(product.price, 49.99);
    }

    #[test]
    fn test_entity_decode_failure() {
        let row = ResultRow::new().with_field("name", "Shoe");
        let result: MapperResult<Product> = decode_entity(&row);
        assert_eq!(result.unwrap_err().code().code(), "SEARCH_MAPPER_DECODE_FAILED");
    }
}
