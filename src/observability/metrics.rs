//! Query metrics
//!
//! Counters only. Monotonic, reset only when the owning context is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for commands issued through a search context
#[derive(Debug, Default)]
pub struct QueryMetrics {
    searches: AtomicU64,
    aggregations: AtomicU64,
    cursor_reads: AtomicU64,
    count_queries: AtomicU64,
    rejected: AtomicU64,
    rows_returned: AtomicU64,
}

impl QueryMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment FT.SEARCH count
    pub fn increment_searches(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment FT.AGGREGATE count
    pub fn increment_aggregations(&self) {
        self.aggregations.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment cursor read count
    pub fn increment_cursor_reads(&self) {
        self.cursor_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment count query count
    pub fn increment_count_queries(&self) {
        self.count_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected command count
    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the number of rows handed back to callers
    pub fn add_rows(&self, rows: u64) {
        self.rows_returned.fetch_add(rows, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            aggregations: self.aggregations.load(Ordering::Relaxed),
            cursor_reads: self.cursor_reads.load(Ordering::Relaxed),
            count_queries: self.count_queries.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the counters at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub aggregations: u64,
    pub cursor_reads: u64,
    pub count_queries: u64,
    pub rejected: u64,
    pub rows_returned: u64,
}

impl MetricsSnapshot {
    /// Total commands sent to the engine
    pub fn commands_issued(&self) -> u64 {
        self.searches + self.aggregations + self.cursor_reads + self.count_queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = QueryMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_increment() {
        let metrics = QueryMetrics::new();
        metrics.increment_searches();
        metrics.increment_aggregations();
        metrics.increment_aggregations();
        metrics.increment_count_queries();
        metrics.add_rows(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.searches, 1);
        assert_eq!(snapshot.aggregations, 2);
        assert_eq!(snapshot.rows_returned, 7);
        assert_eq!(snapshot.commands_issued(), 4);
    }
}
