//! Typed field predicates
//!
//! A [`Field`] names an indexed field and its kind; its methods build
//! [`Predicate`]s that render to a single query clause and compose onto a
//! running tree by intersection.

use std::fmt;

use serde_json::Value;

use crate::schema::{FieldKind, IndexSchema, SchemaResult};

use super::escape::{escape_field, escape_value, exact_phrase, like_pattern};
use super::node::QueryNode;

/// What a predicate tests
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    In(Vec<Value>),
    Like(String),
    StartsWith(String),
    EndsWith(String),
    Containing(String),
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    Between(f64, f64),
    Near {
        lon: f64,
        lat: f64,
        radius: f64,
        unit: String,
    },
    IsMissing,
}

/// A condition bound to one field, optionally negated
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: String,
    kind: FieldKind,
    condition: Condition,
    negated: bool,
}

impl Predicate {
    /// Bind a condition to a field
    pub fn new(field: impl Into<String>, kind: FieldKind, condition: Condition) -> Self {
        Self {
            field: field.into(),
            kind,
            condition,
            negated: false,
        }
    }

    /// Logical NOT; negating twice restores the original
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// True if negated
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Field alias
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Condition
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Rendered clause, or `None` when the predicate has nothing to test
    /// (blank patterns, empty value lists, kinds the condition does not
    /// apply to)
    pub fn clause(&self) -> Option<String> {
        let body = self.positive_clause()?;
        if self.negated {
            Some(format!("-{}", body))
        } else {
            Some(body)
        }
    }

    /// The clause as a leaf
    pub fn to_node(&self) -> Option<QueryNode> {
        self.clause().map(QueryNode::leaf)
    }

    /// Compose onto `root` by intersection; no-op predicates return `root`
    pub fn apply(&self, root: QueryNode) -> QueryNode {
        match self.to_node() {
            Some(node) => root.and(node),
            None => root,
        }
    }

    fn positive_clause(&self) -> Option<String> {
        let field = format!("@{}", escape_field(&self.field));

        match &self.condition {
            Condition::Eq(value) => self.eq_clause(&field, value),
            Condition::In(values) => self.in_clause(&field, values),
            Condition::Like(pattern) => {
                if pattern.trim().is_empty() {
                    return None;
                }
                let wildcard = format!("w'{}'", like_pattern(pattern));
                match self.kind {
                    FieldKind::Text => Some(format!("{}:{}", field, wildcard)),
                    FieldKind::Tag => Some(format!("{}:{{{}}}", field, wildcard)),
                    _ => None,
                }
            }
            Condition::StartsWith(value) => self.affix_clause(&field, value, false, true),
            Condition::EndsWith(value) => self.affix_clause(&field, value, true, false),
            Condition::Containing(value) => self.affix_clause(&field, value, true, true),
            Condition::Gt(v) => self.numeric(&field, format!("[({} +inf]", v)),
            Condition::Ge(v) => self.numeric(&field, format!("[{} +inf]", v)),
            Condition::Lt(v) => self.numeric(&field, format!("[-inf ({}]", v)),
            Condition::Le(v) => self.numeric(&field, format!("[-inf {}]", v)),
            Condition::Between(low, high) => self.numeric(&field, format!("[{} {}]", low, high)),
            Condition::Near {
                lon,
                lat,
                radius,
                unit,
            } => {
                if self.kind != FieldKind::Geo {
                    return None;
                }
                Some(format!("{}:[{} {} {} {}]", field, lon, lat, radius, unit))
            }
            Condition::IsMissing => Some(format!("ismissing({})", field)),
        }
    }

    fn is_textual(&self) -> bool {
        matches!(self.kind, FieldKind::Text | FieldKind::Tag)
    }

    fn numeric(&self, field: &str, range: String) -> Option<String> {
        if self.kind == FieldKind::Numeric {
            Some(format!("{}:{}", field, range))
        } else {
            None
        }
    }

    fn eq_clause(&self, field: &str, value: &Value) -> Option<String> {
        match self.kind {
            FieldKind::Tag => scalar_text(value).map(|v| format!("{}:{{{}}}", field, escape_value(&v))),
            FieldKind::Text => scalar_text(value).map(|v| format!("{}:{}", field, exact_phrase(&v))),
            FieldKind::Numeric => {
                numeric_value(value).map(|v| format!("{}:[{} {}]", field, v, v))
            }
            FieldKind::Geo | FieldKind::Vector => None,
        }
    }

    fn in_clause(&self, field: &str, values: &[Value]) -> Option<String> {
        match self.kind {
            FieldKind::Tag => {
                let terms: Vec<String> = values
                    .iter()
                    .filter_map(scalar_text)
                    .map(|v| escape_value(&v))
                    .collect();
                if terms.is_empty() {
                    return None;
                }
                Some(format!("{}:{{{}}}", field, terms.join(" | ")))
            }
            FieldKind::Text => {
                let terms: Vec<String> = values
                    .iter()
                    .filter_map(scalar_text)
                    .map(|v| exact_phrase(&v))
                    .collect();
                if terms.is_empty() {
                    return None;
                }
                Some(format!("{}:({})", field, terms.join(" | ")))
            }
            FieldKind::Numeric => {
                let ranges: Vec<String> = values
                    .iter()
                    .filter_map(numeric_value)
                    .map(|v| format!("{}:[{} {}]", field, v, v))
                    .collect();
                match ranges.len() {
                    0 => None,
                    1 => ranges.into_iter().next(),
                    _ => Some(format!("({})", ranges.join(" | "))),
                }
            }
            FieldKind::Geo | FieldKind::Vector => None,
        }
    }

    fn affix_clause(&self, field: &str, value: &str, leading: bool, trailing: bool) -> Option<String> {
        if value.is_empty() || !self.is_textual() {
            return None;
        }
        let mut term = String::new();
        if leading {
            term.push('*');
        }
        term.push_str(&escape_value(value));
        if trailing {
            term.push('*');
        }
        match self.kind {
            FieldKind::Tag => Some(format!("{}:{{{}}}", field, term)),
            _ => Some(format!("{}:{}", field, term)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clause().unwrap_or_default())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn numeric_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|v| v.to_string()),
        _ => None,
    }
}

/// Handle for building predicates on one indexed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    alias: String,
    kind: FieldKind,
}

impl Field {
    /// A field with an explicit alias and kind
    pub fn new(alias: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            alias: alias.into(),
            kind,
        }
    }

    /// Look a field up in a schema
    pub fn from_schema(schema: &IndexSchema, alias: &str) -> SchemaResult<Self> {
        let field = schema.require(alias)?;
        Ok(Self::new(field.alias(), field.kind))
    }

    /// TAG field
    pub fn tag(alias: impl Into<String>) -> Self {
        Self::new(alias, FieldKind::Tag)
    }

    /// TEXT field
    pub fn text(alias: impl Into<String>) -> Self {
        Self::new(alias, FieldKind::Text)
    }

    /// NUMERIC field
    pub fn numeric(alias: impl Into<String>) -> Self {
        Self::new(alias, FieldKind::Numeric)
    }

    /// GEO field
    pub fn geo(alias: impl Into<String>) -> Self {
        Self::new(alias, FieldKind::Geo)
    }

    /// Field alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Field kind
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    fn predicate(&self, condition: Condition) -> Predicate {
        Predicate::new(self.alias.clone(), self.kind, condition)
    }

    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Condition::Eq(value.into()))
    }

    pub fn not_eq(&self, value: impl Into<Value>) -> Predicate {
        self.eq(value).negate()
    }

    pub fn in_values<I, V>(&self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicate(Condition::In(values.into_iter().map(Into::into).collect()))
    }

    /// SQL-style pattern: `%` any run, `_` one character
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        self.predicate(Condition::Like(pattern.into()))
    }

    pub fn not_like(&self, pattern: impl Into<String>) -> Predicate {
        self.like(pattern).negate()
    }

    pub fn starts_with(&self, prefix: impl Into<String>) -> Predicate {
        self.predicate(Condition::StartsWith(prefix.into()))
    }

    pub fn ends_with(&self, suffix: impl Into<String>) -> Predicate {
        self.predicate(Condition::EndsWith(suffix.into()))
    }

    pub fn containing(&self, infix: impl Into<String>) -> Predicate {
        self.predicate(Condition::Containing(infix.into()))
    }

    pub fn gt(&self, value: f64) -> Predicate {
        self.predicate(Condition::Gt(value))
    }

    pub fn ge(&self, value: f64) -> Predicate {
        self.predicate(Condition::Ge(value))
    }

    pub fn lt(&self, value: f64) -> Predicate {
        self.predicate(Condition::Lt(value))
    }

    pub fn le(&self, value: f64) -> Predicate {
        self.predicate(Condition::Le(value))
    }

    /// Inclusive range
    pub fn between(&self, low: f64, high: f64) -> Predicate {
        self.predicate(Condition::Between(low, high))
    }

    /// Points within `radius` of (`lon`, `lat`)
    pub fn near(&self, lon: f64, lat: f64, radius: f64, unit: impl Into<String>) -> Predicate {
        self.predicate(Condition::Near {
            lon,
            lat,
            radius,
            unit: unit.into(),
        })
    }

    /// Documents without a value for this field
    pub fn is_missing(&self) -> Predicate {
        self.predicate(Condition::IsMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::serialize;
    use crate::schema::IndexedField;

    fn render(predicate: &Predicate) -> String {
        serialize(&predicate.apply(QueryNode::empty()))
    }

    #[test]
    fn test_tag_equality_escapes() {
        assert_eq!(render(&Field::tag("email").eq("jo@x.io")), "@email:{jo\\@x\\.io}");
        assert_eq!(render(&Field::tag("city").eq("New York")), "@city:{New\\ York}");
    }

    #[test]
    fn test_text_equality_is_exact_phrase() {
        assert_eq!(render(&Field::text("name").eq("red shoe")), "@name:\"red shoe\"");
    }

    #[test]
    fn test_numeric_ranges() {
        let price = Field::numeric("price");
        assert_eq!(render(&price.eq(10)), "@price:[10 10]");
        assert_eq!(render(&price.gt(10.0)), "@price:[(10 +inf]");
        assert_eq!(render(&price.ge(10.5)), "@price:[10.5 +inf]");
        assert_eq!(render(&price.lt(3.0)), "@price:[-inf (3]");
        assert_eq!(render(&price.le(3.0)), "@price:[-inf 3]");
        assert_eq!(render(&price.between(1.0, 2.5)), "@price:[1 2.5]");
    }

    #[test]
    fn test_like_uses_wildcard_syntax() {
        let name = Field::text("name");
        assert_eq!(render(&name.like("Micro%")), "@name:w'Micro*'");
        assert_eq!(render(&name.not_like("Micro%")), "-@name:w'Micro*'");
        assert_eq!(
            name.not_like("Micro%").clause(),
            name.like("Micro%").negate().clause()
        );
    }

    #[test]
    fn test_tag_like_wraps_wildcard_in_braces() {
        let brand = Field::tag("brand");
        assert_eq!(render(&brand.like("Nik%")), "@brand:{w'Nik*'}");
        assert_eq!(render(&brand.not_like("Nik%")), "-@brand:{w'Nik*'}");
        assert_eq!(Field::numeric("price").like("1%").clause(), None);
    }

    #[test]
    fn test_blank_like_is_noop() {
        let root = QueryNode::leaf("@brand:{Nike}");
        assert_eq!(Field::text("name").like("  ").apply(root.clone()), root);
    }

    #[test]
    fn test_is_missing_and_negation() {
        let email = Field::tag("email");
        assert_eq!(render(&email.is_missing()), "ismissing(@email)");
        assert_eq!(render(&email.is_missing().negate()), "-ismissing(@email)");
        assert_eq!(email.is_missing().negate().negate(), email.is_missing());
    }

    #[test]
    fn test_in_values() {
        assert_eq!(
            render(&Field::tag("brand").in_values(["Nike", "Adidas"])),
            "@brand:{Nike | Adidas}"
        );
        assert_eq!(
            render(&Field::numeric("size").in_values([8, 9])),
            "(@size:[8 8] | @size:[9 9])"
        );
        assert_eq!(Field::tag("brand").in_values(Vec::<String>::new()).clause(), None);
    }

    #[test]
    fn test_affixes() {
        assert_eq!(render(&Field::text("name").starts_with("Mic")), "@name:Mic*");
        assert_eq!(render(&Field::text("name").ends_with("soft")), "@name:*soft");
        assert_eq!(render(&Field::tag("sku").containing("AB")), "@sku:{*AB*}");
    }

    #[test]
    fn test_geo_near() {
        assert_eq!(
            render(&Field::geo("location").near(-122.06, 37.37, 5.0, "mi")),
            "@location:[-122.06 37.37 5 mi]"
        );
    }

    #[test]
    fn test_kind_mismatch_is_noop() {
        assert_eq!(Field::tag("brand").gt(3.0).clause(), None);
        assert_eq!(Field::numeric("price").like("1%").clause(), None);
    }

    #[test]
    fn test_predicates_compose_by_intersection() {
        let root = Field::tag("brand").eq("Nike").apply(QueryNode::empty());
        let root = Field::numeric("price").lt(100.0).apply(root);
        assert_eq!(serialize(&root), "(@brand:{Nike}) (@price:[-inf (100])");
    }

    #[test]
    fn test_field_from_schema() {
        let schema = IndexSchema::new("people").with_field(IndexedField::tag("$.address.city"));
        let field = Field::from_schema(&schema, "address_city").unwrap();
        assert_eq!(field.kind(), FieldKind::Tag);
        assert!(Field::from_schema(&schema, "email").is_err());
    }
}
