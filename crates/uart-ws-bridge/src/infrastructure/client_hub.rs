//! Table of live WebSocket sessions, keyed by [`ConnectionId`].
//!
//! Every session gets a bounded outbound queue when it attaches.  The bridge
//! pump reaches sessions only through [`ClientSink::try_send_text`], which
//! never waits: the frame is queued, or it is refused and dropped.
//!
//! Sessions detach themselves when they end.  The connection registry is
//! left alone, so the pump may keep targeting the departed id; those sends
//! come back as [`SendError::NoSuchConnection`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

use uart_bridge_core::{ClientSink, ConnectionId, SendError};

/// Live sessions and their outbound queues.
#[derive(Debug)]
pub struct ClientHub {
    sessions: Mutex<HashMap<ConnectionId, mpsc::Sender<String>>>,
    queue_depth: usize,
}

impl ClientHub {
    /// Creates an empty hub whose sessions buffer up to `queue_depth` frames.
    /// A depth of zero is raised to one.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Registers a session and returns the receiving end of its queue.
    ///
    /// Attaching an id twice replaces the earlier queue, which then closes.
    pub fn attach(&self, id: ConnectionId) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        self.lock().insert(id, tx);
        rx
    }

    /// Removes a session.  Its queue closes once drained.
    pub fn detach(&self, id: ConnectionId) {
        self.lock().remove(&id);
    }

    pub fn is_attached(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<String>>> {
        // Map operations cannot leave the table half-updated.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClientSink for ClientHub {
    fn try_send_text(&self, id: ConnectionId, text: String) -> Result<(), SendError> {
        let tx = self
            .lock()
            .get(&id)
            .cloned()
            .ok_or(SendError::NoSuchConnection(id))?;

        tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull(id),
            TrySendError::Closed(_) => SendError::Closed(id),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
