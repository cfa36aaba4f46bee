//! Shared fixtures for integration tests

#![allow(dead_code)]

use searchstream::mapper::ResultRow;
use searchstream::schema::{IndexSchema, IndexedField, TypeHint};

pub fn products() -> IndexSchema {
    IndexSchema::new("products")
        .with_prefix("product:")
        .with_field(IndexedField::tag("$.brand"))
        .with_field(IndexedField::text("$.name"))
        .with_field(IndexedField::numeric("$.price", TypeHint::Double).sortable())
        .with_field(IndexedField::numeric("$.stock", TypeHint::Integer))
        .with_field(IndexedField::geo("$.location"))
}

pub fn users() -> IndexSchema {
    IndexSchema::new("users")
        .with_field(IndexedField::tag("$.role"))
        .with_field(IndexedField::tag("$.department"))
        .with_field(IndexedField::text("$.name"))
        .with_field(IndexedField::numeric("$.age", TypeHint::Integer))
        .with_field(IndexedField::numeric("$.joined", TypeHint::Date))
}

/// One grouped row per brand with its document count
pub fn brand_counts(brands: &[(&str, i64)]) -> Vec<ResultRow> {
    brands
        .iter()
        .map(|(brand, count)| {
            ResultRow::new()
                .with_field("brand", *brand)
                .with_field("count", *count)
        })
        .collect()
}

/// `n` product documents keyed `product:<i>`
pub fn product_rows(n: usize) -> Vec<ResultRow> {
    (0..n)
        .map(|i| {
            ResultRow::with_id(format!("product:{}", i))
                .with_field("name", format!("Shoe {}", i))
                .with_field("price", 10.0 + i as f64)
        })
        .collect()
}
