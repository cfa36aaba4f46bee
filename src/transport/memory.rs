//! In-memory transports
//!
//! `ScriptedTransport` records every command and answers from a queue of
//! prepared replies. `OfflineTransport` refuses everything and is used where
//! commands are only compiled.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::command::Command;
use super::errors::{TransportError, TransportResult};
use super::response::RawResponse;
use super::SearchTransport;

/// Transport answering from a FIFO of prepared replies
///
/// An empty queue answers with an empty response.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<TransportResult<RawResponse>>>,
    sent: RefCell<Vec<Command>>,
}

impl ScriptedTransport {
    /// Create a transport with no prepared replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, response: RawResponse) -> Self {
        self.replies.borrow_mut().push_back(Ok(response));
        self
    }

    /// Queue a failure
    pub fn fail(self, error: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    /// Queue a successful reply through a shared reference
    pub fn push_reply(&self, response: RawResponse) {
        self.replies.borrow_mut().push_back(Ok(response));
    }

    /// Every command sent so far, in order
    pub fn sent(&self) -> Vec<Command> {
        self.sent.borrow().clone()
    }

    /// Most recent command
    pub fn last_sent(&self) -> Option<Command> {
        self.sent.borrow().last().cloned()
    }

    /// Number of replies not yet consumed
    pub fn pending_replies(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl SearchTransport for ScriptedTransport {
    fn execute(&self, command: &Command) -> TransportResult<RawResponse> {
        self.sent.borrow_mut().push(command.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::empty()))
    }
}

/// Transport that refuses every command
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl SearchTransport for OfflineTransport {
    fn execute(&self, command: &Command) -> TransportResult<RawResponse> {
        Err(TransportError::Connection(format!(
            "offline, cannot send {}",
            command.name()
        )))
    }
}
