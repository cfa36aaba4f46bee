//! Query by example
//!
//! A serializable probe plus a [`MatchSpec`] becomes a predicate tree, one
//! clause per populated indexed field.

mod errors;
mod spec;
mod translator;

pub use errors::{QbeError, QbeErrorCode, QbeResult};
pub use spec::{Example, MatchSpec, StringMatchMode};
pub use translator::{epoch_millis, ExampleTranslator};
