//! Execution Tests
//!
//! Terminal calls against a scripted transport: what is sent, and how the
//! replies come back as maps, tuples and pages.

mod common;

use searchstream::aggregation::{ReducerFunction, SortField};
use searchstream::mapper::{ContentType, ResultRow, RowValue};
use searchstream::pagination::{AggregationPage, PageRequest, Pageable};
use searchstream::query::Field;
use searchstream::transport::{RawResponse, ScriptedTransport, TransportError};
use searchstream::{SearchContext, SearchError};
use searchstream::qbe::{Example, MatchSpec};
use serde::Deserialize;
use serde_json::json;

use common::{brand_counts, product_rows, products, users};

// =============================================================================
// Aggregation Tests
// =============================================================================

/// Top brands by document count come back as labeled tuples.
#[test]
fn test_top_brands_by_count() {
    let rows = brand_counts(&[
        ("Nike", 40),
        ("Adidas", 31),
        ("Puma", 22),
        ("Asics", 12),
        ("Reebok", 9),
    ]);
    let ctx = SearchContext::new(ScriptedTransport::new().reply(RawResponse::with_rows(rows)));
    let schema = products();

    let tuples = ctx
        .aggregate(&schema)
        .group_by(&["brand"])
        .reduce(ReducerFunction::Count)
        .sorted(&[SortField::desc("count")])
        .limit(5)
        .to_list(&[ContentType::String, ContentType::Long])
        .unwrap();

    assert_eq!(tuples.len(), 5);
    assert_eq!(tuples[0].labels(), &["brand", "count"]);
    assert_eq!(tuples[0].get(1), Some(&RowValue::Int(40)));

    let sent = ctx.transport().last_sent().unwrap().to_string();
    assert_eq!(
        sent,
        "FT.AGGREGATE products * GROUPBY 1 @brand REDUCE COUNT 0 AS count \
         SORTBY 2 @count DESC LIMIT 0 5 DIALECT 2"
    );
}

/// The first id-like key wins, falling back to the document key.
#[test]
fn test_maps_carry_id_by_priority() {
    let rows = vec![
        ResultRow::with_id("product:1")
            .with_field("_id", "legacy-1")
            .with_field("id", "sku-1")
            .with_field("name", "Runner"),
        ResultRow::with_id("product:2").with_field("name", "Trail"),
    ];
    let ctx = SearchContext::new(ScriptedTransport::new().reply(RawResponse::with_rows(rows)));
    let schema = products();

    let maps = ctx.aggregate(&schema).load(&["name"]).to_maps_with_id().unwrap();

    assert_eq!(maps[0].get("id"), Some(&RowValue::from("sku-1")));
    assert_eq!(maps[1].get("id"), Some(&RowValue::from("product:2")));
    assert_eq!(maps[1].get("name"), Some(&RowValue::from("Trail")));
}

/// Without the id flag no id key is produced.
#[test]
fn test_maps_without_id() {
    let rows = vec![ResultRow::with_id("product:1")
        .with_field("id", "sku-1")
        .with_field("name", "Runner")];
    let ctx = SearchContext::new(ScriptedTransport::new().reply(RawResponse::with_rows(rows)));
    let schema = products();

    let maps = ctx.search(&schema).to_maps(false).unwrap();

    assert!(maps[0].get("id").is_none());
    assert_eq!(maps[0].get("name"), Some(&RowValue::from("Runner")));
}

// =============================================================================
// Query-by-Example Tests
// =============================================================================

/// Two match-any probes on the same tag union into one query.
#[test]
fn test_example_union_returns_both_roles() {
    let rows = vec![
        ResultRow::with_id("user:1").with_field("$", r#"{"name":"Ada","role":"admin"}"#),
        ResultRow::with_id("user:2").with_field("$", r#"{"name":"Lin","role":"manager"}"#),
    ];
    let ctx = SearchContext::new(ScriptedTransport::new().reply(RawResponse::with_rows(rows)));
    let schema = users();

    let users: Vec<User> = ctx
        .search(&schema)
        .filter_example(&Example::from_value(json!({"role": "admin"}), MatchSpec::matching_any()))
        .filter_example(&Example::from_value(json!({"role": "manager"}), MatchSpec::matching_any()))
        .to_list()
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, "user:1");
    assert_eq!(users[0].name, "Ada");
    assert_eq!(users[1].role, "manager");
    let sent = ctx.transport().last_sent().unwrap();
    assert_eq!(sent.args()[1], "(@role:{admin}) | (@role:{manager})");
}

/// An unaliased reducer alias is a usage error reported at the terminal.
#[test]
fn test_alias_without_reducer_fails_at_terminal() {
    let ctx = SearchContext::new(ScriptedTransport::new());
    let schema = products();

    let err = ctx
        .aggregate(&schema)
        .group_by(&["brand"])
        .as_alias("total")
        .aggregate()
        .unwrap_err();

    assert_eq!(err.code(), "SEARCH_ALIAS_WITHOUT_REDUCER");
    assert!(ctx.transport().sent().is_empty());
}

// =============================================================================
// Cursor Pagination Tests
// =============================================================================

/// A cursor page runs lazily and reads forward until the cursor closes.
#[test]
fn test_cursor_pages_read_forward() {
    let transport = ScriptedTransport::new()
        .reply(RawResponse::with_rows(brand_counts(&[("Nike", 4), ("Puma", 3)])).with_cursor(77))
        .reply(RawResponse::with_rows(brand_counts(&[("Asics", 1)])).with_cursor(0));
    let ctx = SearchContext::new(transport);
    let schema = products();

    let mut page = ctx
        .aggregate(&schema)
        .group_by(&["brand"])
        .reduce(ReducerFunction::Count)
        .to_page(PageRequest::of(0, 2));
    assert!(ctx.transport().sent().is_empty());

    assert_eq!(page.size().unwrap(), 2);
    assert_eq!(page.cursor_id().unwrap(), 77);
    assert!(!page.is_last().unwrap());

    let first = ctx.transport().sent()[0].to_string();
    assert!(first.contains("WITHCURSOR COUNT 2 MAXIDLE 300000"));

    let mut second = page.read_next().unwrap().unwrap();
    assert_eq!(second.number(), 1);
    assert_eq!(second.size().unwrap(), 1);
    assert!(!second.has_next().unwrap());
    assert!(second.read_next().unwrap().is_none());

    let cursor_read = ctx.transport().last_sent().unwrap().to_string();
    assert_eq!(cursor_read, "FT.CURSOR READ products 77 COUNT 2");
}

/// A cursor pageable handed out by one page resumes in another call.
#[test]
fn test_resume_from_cursor_pageable() {
    let transport = ScriptedTransport::new()
        .reply(RawResponse::with_rows(brand_counts(&[("Nike", 4)])).with_cursor(9))
        .reply(RawResponse::empty().with_total(2))
        .reply(RawResponse::with_rows(brand_counts(&[("Asics", 1)])).with_total(2));
    let ctx = SearchContext::new(transport);
    let schema = products();

    let mut page = ctx
        .aggregate(&schema)
        .group_by(&["brand"])
        .reduce(ReducerFunction::Count)
        .to_page(PageRequest::of(0, 1));

    let (request, cursor_id) = match page.next_pageable().unwrap() {
        Pageable::Cursor { request, cursor_id } => (request, cursor_id),
        other => panic!("expected cursor pageable, got {:?}", other),
    };
    assert_eq!(cursor_id, 9);

    let mut resumed = AggregationPage::resume(&ctx, "products", request, cursor_id).unwrap();
    assert_eq!(resumed.number(), 1);
    assert_eq!(resumed.size().unwrap(), 1);
}

// =============================================================================
// Search Pagination Tests
// =============================================================================

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    name: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: String,
    name: String,
    price: f64,
}

/// 100 matches at 5 per page is 20 pages; the first has a next page.
#[test]
fn test_search_page_of_twenty() {
    let transport = ScriptedTransport::new()
        .reply(RawResponse::with_rows(product_rows(5)))
        .reply(RawResponse::empty().with_total(100));
    let ctx = SearchContext::new(transport);
    let schema = products();

    let page = ctx
        .search(&schema)
        .filter(Field::numeric("price").ge(10.0))
        .page::<Product>(PageRequest::of(0, 5).sorted(SortField::asc("price")))
        .unwrap();

    assert_eq!(page.total_elements(), 100);
    assert_eq!(page.total_pages(), 20);
    assert_eq!(page.number_of_elements(), 5);
    assert!(page.is_first());
    assert!(page.has_next());
    assert!(!page.has_previous());
    assert_eq!(page.content()[0].id, "product:0");
    assert_eq!(page.content()[3].name, "Shoe 3");
    assert_eq!(page.content()[3].price, 13.0);

    let sent = ctx.transport().sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].to_string().ends_with("SORTBY price ASC LIMIT 0 5 DIALECT 2"));
    assert!(sent[1].to_string().contains("NOCONTENT LIMIT 0 5"));
}

/// Engine rejections naming a field are classified and counted.
#[test]
fn test_rejection_is_classified() {
    let transport = ScriptedTransport::new()
        .fail(TransportError::Rejected("Unknown field `colour`".into()));
    let ctx = SearchContext::new(transport);
    let schema = products();

    let err = ctx.search(&schema).to_rows().unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert_eq!(err.code(), "SEARCH_FIELD_NOT_IN_SCHEMA");
    assert_eq!(ctx.metrics().snapshot().rejected, 1);
}

/// The engine's offset/near form names the field after `near`.
#[test]
fn test_rejection_near_offset_names_field() {
    let transport = ScriptedTransport::new()
        .fail(TransportError::Rejected("Unknown field at offset 10 near colour".into()));
    let ctx = SearchContext::new(transport);
    let schema = products();

    match ctx.search(&schema).to_rows().unwrap_err() {
        SearchError::Transport(TransportError::FieldNotInSchema { field, .. }) => {
            assert_eq!(field, "colour")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
