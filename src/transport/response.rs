//! Raw engine responses

use crate::mapper::ResultRow;

/// Rows plus metadata returned for one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Result rows in engine order
    pub rows: Vec<ResultRow>,
    /// Cursor id; 0 when exhausted or no cursor was requested
    pub cursor_id: i64,
    /// Engine-reported total result count
    pub total: u64,
}

impl RawResponse {
    /// Response with no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Response carrying rows; total defaults to the row count
    pub fn with_rows(rows: Vec<ResultRow>) -> Self {
        let total = rows.len() as u64;
        Self {
            rows,
            cursor_id: 0,
            total,
        }
    }

    /// Set the engine-reported total
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// Set the cursor id
    pub fn with_cursor(mut self, cursor_id: i64) -> Self {
        self.cursor_id = cursor_id;
        self
    }
}
