//! Observable events
//!
//! Every log line written by the query engine names one of these events.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded from disk
    ConfigLoaded,
    /// Index schemas loaded from disk
    SchemasLoaded,
    /// FT.SEARCH sent to the engine
    SearchDispatched,
    /// FT.AGGREGATE sent to the engine
    AggregateDispatched,
    /// FT.CURSOR READ sent to the engine
    CursorRead,
    /// Zero-content count query sent to the engine
    CountQueryDispatched,
    /// Engine or transport refused a command
    QueryRejected,
    /// Example field left out of the translated query
    QbeFieldSkipped,
    /// Reducer name not recognized, stage dropped
    ReducerSkipped,
}

impl Event {
    /// Returns the event name written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SearchDispatched => "SEARCH_QUERY_DISPATCHED",
            Event::AggregateDispatched => "AGGREGATE_DISPATCHED",
            Event::CursorRead => "CURSOR_READ",
            Event::CountQueryDispatched => "COUNT_QUERY_DISPATCHED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QbeFieldSkipped => "QBE_FIELD_SKIPPED",
            Event::ReducerSkipped => "REDUCER_SKIPPED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
