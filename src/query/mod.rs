//! Query construction
//!
//! The predicate tree, escaping rules, and typed field predicates that
//! compose into the query string of FT.SEARCH and FT.AGGREGATE.

mod escape;
mod node;
mod predicate;

pub use escape::{escape, escape_field, escape_value, exact_phrase, like_pattern, TAG_ESCAPE_CHARS};
pub use node::{serialize, ParenMode, QueryNode};
pub use predicate::{Condition, Field, Predicate};
