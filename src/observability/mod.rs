//! Observability for the query engine
//!
//! - Structured JSON logging with a configurable minimum severity
//! - Typed events
//! - Atomic query counters
//!
//! Observability never changes what a query returns.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, QueryMetrics};

/// Log an event at the given severity
pub fn log_event(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}
