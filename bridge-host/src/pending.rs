//! Clients waiting for the browser's answer.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Parked clients keyed by the correlation key of their `requestId`.
///
/// Dropping a sender (replacement, [`PendingClients::drain`]) closes the
/// matching client without an answer.
#[derive(Debug, Default)]
pub struct PendingClients {
    waiting: Mutex<HashMap<String, oneshot::Sender<Vec<u8>>>>,
}

impl PendingClients {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a client under `key`. A client already parked under the same key
    /// is released without an answer.
    pub fn park(&self, key: String) -> oneshot::Receiver<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        if self.waiting.lock().insert(key.clone(), tx).is_some() {
            tracing::warn!(request_id = %key, "Duplicate requestId, releasing earlier client");
        }
        rx
    }

    /// Hand `response` to the client parked under `key`.
    ///
    /// Returns false when nobody is waiting or the client already left.
    pub fn deliver(&self, key: &str, response: Vec<u8>) -> bool {
        let sender = self.waiting.lock().remove(key);
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Forget the client parked under `key`.
    pub fn cancel(&self, key: &str) {
        self.waiting.lock().remove(key);
    }

    /// Release every parked client. Returns how many there were.
    pub fn drain(&self) -> usize {
        let drained: Vec<_> = self.waiting.lock().drain().collect();
        drained.len()
    }

    /// Number of parked clients.
    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// True when no client is parked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
