//! Pagination
//!
//! - [`Page`]: eager page of a plain search plus its total count
//! - [`AggregationPage`]: lazy, forward-only page over an aggregation cursor

mod aggregation_page;
mod page;
mod request;

pub use aggregation_page::AggregationPage;
pub use page::Page;
pub use request::{total_pages, PageRequest, Pageable};
