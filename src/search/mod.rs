//! Plain searches
//!
//! [`SearchStream`] builds `FT.SEARCH` commands and can hand its query to an
//! aggregation pipeline.

mod command;
mod stream;

pub use command::{SearchCommand, SummarizeParams};
pub use stream::SearchStream;
