//! Aggregation pipelines
//!
//! Builds `FT.AGGREGATE` commands stage by stage:
//! - LOAD, GROUPBY + REDUCE, APPLY, SORTBY, FILTER, LIMIT in call order
//! - one pending group and one pending reducer, flushed by the next stage
//! - `LIMIT 0 <max_limit>` injected when no limit was set
//! - optional cursor for batched reads

mod errors;
mod pipeline;
mod reducer;
mod stage;

pub use errors::{AggregationError, AggregationErrorCode, AggregationResult};
pub use pipeline::AggregationPipeline;
pub use reducer::{ReducerFunction, ReducerParam, ReducerSpec};
pub use stage::{AggregationFilter, CursorSpec, Direction, SortField, Stage};
