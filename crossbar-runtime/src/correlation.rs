//! Pending-request correlation.
//!
//! The correlation table is the only shared mutable structure in the
//! forwarder: a map from token to the single-slot reply channel of the
//! caller waiting on that token. Insert happens at issue time, removal on
//! reply, timeout, or shutdown - whichever comes first. Removal under the
//! lock is the race arbiter: exactly one of `complete` and `cancel` takes
//! the entry, the loser is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::oneshot;

use crossbar_core::CorrelationId;

/// Maps in-flight correlation tokens to their reply channels.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    /// Next token to allocate. Process-local and monotonic.
    next_token: AtomicU64,
    /// Reply channels for pending requests.
    entries: Mutex<HashMap<CorrelationId, oneshot::Sender<Bytes>>>,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending request.
    ///
    /// Returns the freshly allocated token and the receiver the caller
    /// awaits exactly one reply on.
    pub fn register(&self) -> (CorrelationId, oneshot::Receiver<Bytes>) {
        let token = CorrelationId::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (reply_tx, reply_rx) = oneshot::channel();

        self.entries
            .lock()
            .expect("correlation table lock poisoned")
            .insert(token, reply_tx);

        (token, reply_rx)
    }

    /// Delivers a reply to the caller waiting on `token`.
    ///
    /// Returns true if the reply reached a waiting caller. Returns false -
    /// a pure no-op - if the token is unknown, already timed out, or the
    /// waiter has gone away; late replies are discarded here.
    pub fn complete(&self, token: CorrelationId, payload: Bytes) -> bool {
        let reply_tx = self
            .entries
            .lock()
            .expect("correlation table lock poisoned")
            .remove(&token);

        match reply_tx {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Removes a pending request without delivering a reply.
    ///
    /// Called on timeout and on delivery failure. Returns false if the
    /// entry was already taken by a reply.
    pub fn cancel(&self, token: CorrelationId) -> bool {
        self.entries
            .lock()
            .expect("correlation table lock poisoned")
            .remove(&token)
            .is_some()
    }

    /// Drops every pending entry. Waiting callers observe their reply
    /// channel closing.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("correlation table lock poisoned")
            .clear();
    }

    /// Returns the number of in-flight requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("correlation table lock poisoned")
            .len()
    }

    /// Returns true if no requests are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
