//! Search context
//!
//! Owns the transport, configuration and metrics shared by every builder it
//! creates. Every command leaves through [`SearchContext::dispatch`], which
//! logs, counts, and classifies engine rejections.

use std::time::Instant;

use crate::aggregation::AggregationPipeline;
use crate::config::QueryConfig;
use crate::error::SearchResult;
use crate::observability::{log_event, Event, QueryMetrics, Severity};
use crate::schema::IndexSchema;
use crate::search::SearchStream;
use crate::transport::{Command, RawResponse, SearchTransport, TransportResult};

/// What a dispatched command is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchKind {
    Search,
    Aggregate,
    Count,
}

impl DispatchKind {
    fn event(&self) -> Event {
        match self {
            DispatchKind::Search => Event::SearchDispatched,
            DispatchKind::Aggregate => Event::AggregateDispatched,
            DispatchKind::Count => Event::CountQueryDispatched,
        }
    }
}

/// Entry point for building and running queries
pub struct SearchContext<T: SearchTransport> {
    transport: T,
    config: QueryConfig,
    metrics: QueryMetrics,
}

impl<T: SearchTransport> SearchContext<T> {
    /// Create a context with default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, QueryConfig::default())
    }

    /// Create a context with explicit configuration
    pub fn with_config(transport: T, config: QueryConfig) -> Self {
        Self {
            transport,
            config,
            metrics: QueryMetrics::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// Start a plain search over `schema`'s index
    pub fn search<'a>(&'a self, schema: &'a IndexSchema) -> SearchStream<'a, T> {
        SearchStream::new(self, schema)
    }

    /// Start an aggregation over every document of `schema`'s index
    pub fn aggregate<'a>(&'a self, schema: &'a IndexSchema) -> AggregationPipeline<'a, T> {
        AggregationPipeline::new(self, schema, "*")
    }

    pub(crate) fn dispatch(&self, command: &Command, kind: DispatchKind) -> SearchResult<RawResponse> {
        match kind {
            DispatchKind::Search => self.metrics.increment_searches(),
            DispatchKind::Aggregate => self.metrics.increment_aggregations(),
            DispatchKind::Count => self.metrics.increment_count_queries(),
        }

        let started = Instant::now();
        let response = self.transport.execute(command);
        self.finish(command.index().unwrap_or(""), &command.to_string(), kind.event(), started, response)
    }

    pub(crate) fn read_cursor(
        &self,
        index: &str,
        cursor_id: i64,
        count: usize,
    ) -> SearchResult<RawResponse> {
        self.metrics.increment_cursor_reads();

        let started = Instant::now();
        let response = self.transport.read_cursor(index, cursor_id, count);
        let description = format!("FT.CURSOR READ {} {} COUNT {}", index, cursor_id, count);
        self.finish(index, &description, Event::CursorRead, started, response)
    }

    fn finish(
        &self,
        index: &str,
        command: &str,
        event: Event,
        started: Instant,
        response: TransportResult<RawResponse>,
    ) -> SearchResult<RawResponse> {
        let elapsed_ms = started.elapsed().as_millis().to_string();
        match response {
            Ok(response) => {
                let rows = response.rows.len().to_string();
                let cursor = response.cursor_id.to_string();
                log_event(
                    Severity::Trace,
                    event,
                    &[
                        ("index", index),
                        ("command", command),
                        ("rows", rows.as_str()),
                        ("cursor_id", cursor.as_str()),
                        ("elapsed_ms", elapsed_ms.as_str()),
                    ],
                );
                self.metrics.add_rows(response.rows.len() as u64);
                Ok(response)
            }
            Err(err) => {
                let err = err.reclassify();
                self.metrics.increment_rejected();
                let reason = err.to_string();
                log_event(
                    Severity::Warn,
                    Event::QueryRejected,
                    &[
                        ("index", index),
                        ("command", command),
                        ("code", err.code()),
                        ("reason", reason.as_str()),
                        ("elapsed_ms", elapsed_ms.as_str()),
                    ],
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ResultRow;
    use crate::transport::{ScriptedTransport, TransportError};

    #[test]
    fn test_dispatch_counts_and_returns_rows() {
        let transport = ScriptedTransport::new()
            .reply(RawResponse::with_rows(vec![ResultRow::with_id("p:1")]));
        let ctx = SearchContext::new(transport);

        let response = ctx
            .dispatch(&Command::new("FT.SEARCH").arg("idx").arg("*"), DispatchKind::Search)
            .unwrap();
        assert_eq!(response.rows.len(), 1);

        let snapshot = ctx.metrics().snapshot();
        assert_eq!(snapshot.searches, 1);
        assert_eq!(snapshot.rows_returned, 1);
    }

    #[test]
    fn test_dispatch_reclassifies_unknown_field() {
        let transport =
            ScriptedTransport::new().fail(TransportError::Rejected("Unknown field `colour`".into()));
        let ctx = SearchContext::new(transport);

        let err = ctx
            .dispatch(&Command::new("FT.AGGREGATE").arg("idx").arg("*"), DispatchKind::Aggregate)
            .unwrap_err();
        assert_eq!(err.code(), "SEARCH_FIELD_NOT_IN_SCHEMA");
        assert_eq!(ctx.metrics().snapshot().rejected, 1);
    }

    #[test]
    fn test_read_cursor_sends_cursor_command() {
        let ctx = SearchContext::new(ScriptedTransport::new());
        ctx.read_cursor("idx", 42, 10).unwrap();

        let sent = ctx.transport().last_sent().unwrap();
        assert_eq!(sent.to_string(), "FT.CURSOR READ idx 42 COUNT 10");
        assert_eq!(ctx.metrics().snapshot().cursor_reads, 1);
    }
}
