//! Typed projections over result rows
//!
//! A projection is a struct generated by [`projection!`](crate::projection)
//! wrapping a [`PropertyBag`]. Each declared getter resolves one property,
//! coercing the raw value to the getter's return type.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;

use super::decode::FromRowValue;
use super::errors::{MapperError, MapperResult};
use super::value::{ResultRow, RowValue};

/// Map-backed property source for projections
///
/// Equality, hashing and `Display` derive from the backing map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyBag {
    values: BTreeMap<String, RowValue>,
}

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every field of a row; the document key is not a property
    pub fn from_row(row: &ResultRow) -> Self {
        let values = row
            .fields()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { values }
    }

    /// Insert a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RowValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Resolve a property: exact key, then `@key`, then a case-insensitive
    /// match ignoring a leading `@`
    pub fn resolve(&self, key: &str) -> Option<&RowValue> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        if let Some(value) = self.values.get(&format!("@{}", key)) {
            return Some(value);
        }
        let wanted = key.trim_start_matches('@');
        self.values
            .iter()
            .find(|(k, _)| k.trim_start_matches('@').eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v)
    }

    /// Resolve and coerce; absent keys and failed coercions give `None`
    pub fn get<T: FromRowValue>(&self, key: &str) -> Option<T> {
        self.resolve(key)
            .and_then(|value| T::from_row_value(value.clone()).ok())
    }

    /// Resolve and coerce, surfacing coercion failures
    pub fn try_get<T: FromRowValue>(&self, key: &str) -> MapperResult<Option<T>> {
        match self.resolve(key) {
            Some(value) => T::from_row_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// Backing map
    pub fn as_map(&self) -> &BTreeMap<String, RowValue> {
        &self.values
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// JSON-encoded property decoded through serde
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromRowValue for Json<T> {
    fn from_row_value(value: RowValue) -> MapperResult<Self> {
        let decoded = match &value {
            RowValue::Str(text) => serde_json::from_str(text),
            other => serde_json::from_value(other.to_json()),
        };
        decoded
            .map(Json)
            .map_err(|e| MapperError::decode_failed(format!("Cannot decode '{}': {}", value, e)))
    }
}

/// A typed view over a row
pub trait Projection: Sized {
    /// Property names backing the declared getters, in declaration order
    fn property_names() -> &'static [&'static str];

    /// Wrap a bag
    fn from_bag(bag: PropertyBag) -> Self;

    /// Backing bag
    fn bag(&self) -> &PropertyBag;

    /// Build from a result row
    fn from_row(row: &ResultRow) -> Self {
        Self::from_bag(PropertyBag::from_row(row))
    }

    /// Dynamic getter call by bean-style name (`getName`, `isActive`)
    ///
    /// Anything that is not a zero-argument getter is rejected.
    fn invoke(&self, method: &str) -> MapperResult<Option<&RowValue>> {
        let property =
            property_for_getter(method).ok_or_else(|| MapperError::not_getter(method))?;
        Ok(self.bag().resolve(&property))
    }
}

/// Property name for a bean-style getter: `getYearFounded` -> `yearFounded`
pub fn property_for_getter(method: &str) -> Option<String> {
    let rest = method
        .strip_prefix("get")
        .or_else(|| method.strip_prefix("is"))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}

/// Declare a projection struct with typed getters
///
/// ```
/// searchstream::projection! {
///     pub struct BrandSummary {
///         name: "name" => String,
///         year_founded: "yearFounded" => i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! projection {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($getter:ident : $property:literal => $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis struct $name {
            bag: $crate::mapper::PropertyBag,
        }

        impl $name {
            $(
                pub fn $getter(&self) -> Option<$ty> {
                    self.bag.get::<$ty>($property)
                }
            )*
        }

        impl $crate::mapper::Projection for $name {
            fn property_names() -> &'static [&'static str] {
                &[$($property),*]
            }

            fn from_bag(bag: $crate::mapper::PropertyBag) -> Self {
                Self { bag }
            }

            fn bag(&self) -> &$crate::mapper::PropertyBag {
                &self.bag
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.bag, f)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashSet;

    crate::projection! {
        struct CompanyView {
            name: "name" => String,
            year_founded: "yearFounded" => i64,
            rating: "rating" => f32,
            public: "public" => bool,
            id: "id" => String,
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Address {
        city: String,
    }

    fn company_row() -> ResultRow {
        ResultRow::new()
            .with_field("name", "Redis")
            .with_field("@yearFounded", "2011")
            .with_field("RATING", "4.5")
            .with_field("public", "false")
    }

    #[test]
    fn test_resolution_order() {
        let mut bag = PropertyBag::new();
        bag.insert("name", "exact");
        bag.insert("@name", "prefixed");
        assert_eq!(bag.resolve("name"), Some(&RowValue::from("exact")));

        let mut bag = PropertyBag::new();
        bag.insert("@name", "prefixed");
        bag.insert("NAME", "cased");
        assert_eq!(bag.resolve("name"), Some(&RowValue::from("prefixed")));

        let mut bag = PropertyBag::new();
        bag.insert("@Name", "cased");
        assert_eq!(bag.resolve("name"), Some(&RowValue::from("cased")));
    }

    #[test]
    fn test_getters_coerce() {
        let view = CompanyView::from_row(&company_row());
        assert_eq!(view.name().as_deref(), Some("Redis"));
        assert_eq!(view.year_founded(), Some(2011));
        assert_eq!(view.rating(), Some(4.5));
        assert_eq!(view.public(), Some(false));
    }

    #[test]
    fn test_id_only_when_loaded() {
        let view = CompanyView::from_row(&ResultRow::with_id("company:1").with_field("name", "Redis"));
        assert_eq!(view.id(), None);

        let view = CompanyView::from_row(&ResultRow::new().with_field("id", "company:1"));
        assert_eq!(view.id().as_deref(), Some("company:1"));
    }

    #[test]
    fn test_invoke_getter_by_name() {
        let view = CompanyView::from_row(&company_row());
        assert_eq!(
            view.invoke("getYearFounded").unwrap(),
            Some(&RowValue::from("2011"))
        );
        assert_eq!(view.invoke("isPublic").unwrap(), Some(&RowValue::from("false")));
    }

    #[test]
    fn test_invoke_non_getter_rejected() {
        let view = CompanyView::from_row(&company_row());
        let err = view.invoke("setName").unwrap_err();
        assert_eq!(err.code().code(), "SEARCH_PROJECTION_NOT_GETTER");
        assert!(view.invoke("get").is_err());
        assert!(view.invoke("getter").is_err());
    }

    #[test]
    fn test_equality_and_hash_from_bag() {
        let a = CompanyView::from_row(&company_row());
        let b = CompanyView::from_row(&company_row());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_from_bag() {
        let view = CompanyView::from_row(&ResultRow::new().with_field("name", "Redis"));
        assert_eq!(view.to_string(), "{name=Redis}");
    }

    #[test]
    fn test_json_property_decoding() {
        let mut bag = PropertyBag::new();
        bag.insert("address", "{\"city\":\"Oslo\"}");
        let Json(address) = bag.get::<Json<Address>>("address").unwrap();
        assert_eq!(address, Address { city: "Oslo".into() });
    }

    #[test]
    fn test_try_get_surfaces_parse_errors() {
        let mut bag = PropertyBag::new();
        bag.insert("count", "many");
        assert!(bag.try_get::<i64>("count").is_err());
        assert_eq!(bag.get::<i64>("count"), None);
    }

    #[test]
    fn test_property_names() {
        assert_eq!(CompanyView::property_names()[1], "yearFounded");
        assert_eq!(property_for_getter("getYearFounded").as_deref(), Some("yearFounded"));
    }
}
