//! Example-to-query translation
//!
//! Walks the index schema, looks each field up in the probe by its document
//! path, and adds one clause per populated field. TAG, GEO and NUMERIC
//! clauses combine by intersection under match-all and by union under
//! match-any. TEXT clauses always intersect. VECTOR fields and the REGEX
//! string mode are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::QueryConfig;
use crate::observability::{log_event, Event, Severity};
use crate::query::{escape_field, escape_value, exact_phrase, QueryNode};
use crate::schema::{FieldKind, IndexSchema, IndexedField, TypeHint};

use super::spec::{Example, MatchSpec, StringMatchMode};

/// Translates examples against one index schema
pub struct ExampleTranslator<'a> {
    schema: &'a IndexSchema,
    config: &'a QueryConfig,
}

impl<'a> ExampleTranslator<'a> {
    /// Create a translator
    pub fn new(schema: &'a IndexSchema, config: &'a QueryConfig) -> Self {
        Self { schema, config }
    }

    /// Translate an example into a fresh tree
    pub fn translate(&self, example: &Example) -> QueryNode {
        self.translate_onto(QueryNode::empty(), example)
    }

    /// Translate an example onto an existing tree
    pub fn translate_onto(&self, root: QueryNode, example: &Example) -> QueryNode {
        let spec = example.spec();
        let mut root = root;

        for field in &self.schema.fields {
            let alias = field.alias();
            if spec.is_ignored(&alias, &field.path) {
                continue;
            }

            let value = match lookup(example.probe(), &field.path_segments()) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };

            root = match field.kind {
                FieldKind::Tag => self.tag_clause(root, &alias, value, spec),
                FieldKind::Text => self.text_clause(root, &alias, value, spec),
                FieldKind::Geo => self.geo_clause(root, &alias, value, spec),
                FieldKind::Numeric => self.numeric_clause(root, field, &alias, value, spec),
                FieldKind::Vector => {
                    skipped(&alias, "vector fields cannot be matched by example");
                    root
                }
            };
        }

        root
    }

    fn tag_clause(&self, root: QueryNode, alias: &str, value: &Value, spec: &MatchSpec) -> QueryNode {
        let field = escape_field(alias);
        let leaf = |text: String| QueryNode::leaf(format!("@{}:{{{}}}", field, escape_value(&text)));

        let node = match value {
            Value::Array(items) => {
                QueryNode::intersect(items.iter().filter_map(scalar_text).map(leaf))
            }
            other => match scalar_text(other) {
                Some(text) => leaf(text),
                None => return root,
            },
        };
        combine(root, node, spec.is_matching_all())
    }

    fn text_clause(&self, root: QueryNode, alias: &str, value: &Value, spec: &MatchSpec) -> QueryNode {
        let mode = spec.string_mode();
        if mode == StringMatchMode::Regex {
            skipped(alias, "regex string matching is not supported");
            return root;
        }

        let field = escape_field(alias);
        let leaf = |text: String| {
            let term = match mode {
                StringMatchMode::Starting => format!("{}*", escape_value(&text)),
                StringMatchMode::Ending => format!("*{}", escape_value(&text)),
                StringMatchMode::Containing => format!("*{}*", escape_value(&text)),
                _ => exact_phrase(&text),
            };
            QueryNode::leaf(format!("@{}:{}", field, term))
        };

        let node = match value {
            Value::Array(items) => {
                QueryNode::intersect(items.iter().filter_map(scalar_text).map(leaf))
            }
            other => match scalar_text(other) {
                Some(text) => leaf(text),
                None => return root,
            },
        };
        root.and(node)
    }

    fn geo_clause(&self, root: QueryNode, alias: &str, value: &Value, spec: &MatchSpec) -> QueryNode {
        match parse_point(value) {
            Some((lon, lat)) => {
                let leaf = QueryNode::leaf(format!(
                    "@{}:[{} {} {} {}]",
                    escape_field(alias),
                    lon,
                    lat,
                    self.config.geo_default_distance,
                    self.config.geo_default_unit
                ));
                combine(root, leaf, spec.is_matching_all())
            }
            None => {
                skipped(alias, "value is not a point");
                root
            }
        }
    }

    fn numeric_clause(
        &self,
        root: QueryNode,
        field: &IndexedField,
        alias: &str,
        value: &Value,
        spec: &MatchSpec,
    ) -> QueryNode {
        let escaped = escape_field(alias);
        let leaf = |number: String| QueryNode::leaf(format!("@{}:[{} {}]", escaped, number, number));

        let node = match value {
            Value::Array(items) => QueryNode::intersect(
                items
                    .iter()
                    .filter_map(|item| numeric_literal(item, field.target))
                    .map(leaf),
            ),
            other => match numeric_literal(other, field.target) {
                Some(number) => leaf(number),
                None => {
                    skipped(alias, "value is not numeric");
                    return root;
                }
            },
        };
        combine(root, node, spec.is_matching_all())
    }
}

fn combine(root: QueryNode, node: QueryNode, matching_all: bool) -> QueryNode {
    if node.is_blank() {
        root
    } else if matching_all {
        root.and(node)
    } else {
        root.or(node)
    }
}

fn skipped(alias: &str, reason: &str) {
    log_event(
        Severity::Trace,
        Event::QbeFieldSkipped,
        &[("field", alias), ("reason", reason)],
    );
}

fn lookup<'v>(probe: &'v Value, segments: &[String]) -> Option<&'v Value> {
    let mut current = probe;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Number literal for a NUMERIC clause; temporal strings become epoch millis
fn numeric_literal(value: &Value, target: TypeHint) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::String(s) if target.is_temporal() => epoch_millis(s).map(|m| m.to_string()),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|v| v.to_string()),
        _ => None,
    }
}

/// Epoch millis (UTC) for RFC 3339 instants, local date-times, or dates
pub fn epoch_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

/// Longitude/latitude from `{x, y}`, `{lon, lat}`, `{longitude, latitude}`,
/// `[lon, lat]`, or `"lon,lat"`
fn parse_point(value: &Value) -> Option<(f64, f64)> {
    match value {
        Value::Object(map) => {
            let pick = |keys: [&str; 2]| -> Option<(f64, f64)> {
                Some((map.get(keys[0])?.as_f64()?, map.get(keys[1])?.as_f64()?))
            };
            pick(["x", "y"])
                .or_else(|| pick(["lon", "lat"]))
                .or_else(|| pick(["longitude", "latitude"]))
        }
        Value::Array(items) if items.len() == 2 => Some((items[0].as_f64()?, items[1].as_f64()?)),
        Value::String(text) => {
            let (lon, lat) = text.split_once(',')?;
            Some((lon.trim().parse().ok()?, lat.trim().parse().ok()?))
        }
        _ => None,
    }
}
