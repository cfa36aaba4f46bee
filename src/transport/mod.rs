//! Transport seam
//!
//! The query engine never opens connections. Callers supply a
//! [`SearchTransport`] that sends one command and returns rows plus cursor
//! and total metadata. Commands are sent once; there are no retries.

mod command;
mod errors;
mod memory;
mod response;

pub use command::Command;
pub use errors::{TransportError, TransportResult};
pub use memory::{OfflineTransport, ScriptedTransport};
pub use response::RawResponse;

/// A synchronous, single round-trip command channel to the search engine
pub trait SearchTransport {
    /// Send one command and wait for its reply
    fn execute(&self, command: &Command) -> TransportResult<RawResponse>;

    /// Read the next batch from an open aggregation cursor
    fn read_cursor(
        &self,
        index: &str,
        cursor_id: i64,
        count: usize,
    ) -> TransportResult<RawResponse> {
        let command = Command::new("FT.CURSOR")
            .arg("READ")
            .arg(index)
            .arg(cursor_id.to_string())
            .arg("COUNT")
            .arg(count.to_string());
        self.execute(&command)
    }
}

impl<T: SearchTransport + ?Sized> SearchTransport for &T {
    fn execute(&self, command: &Command) -> TransportResult<RawResponse> {
        (**self).execute(command)
    }

    fn read_cursor(
        &self,
        index: &str,
        cursor_id: i64,
        count: usize,
    ) -> TransportResult<RawResponse> {
        (**self).read_cursor(index, cursor_id, count)
    }
}
