//! Connection registry: which client the bridge pump talks to.
//!
//! The registry is a single mutable slot holding either "no connection" or
//! the [`ConnectionId`] of the most recently connected client.  It is the
//! only state shared between the two directions of the bridge:
//!
//! - the inbound frame handler writes it when a client connects;
//! - the bridge pump reads it before every send.
//!
//! # Last connected client wins
//!
//! [`ConnectionRegistry::set`] overwrites the slot unconditionally.  A second
//! client connecting while the first is still open takes over the serial →
//! client direction; the first client is not rejected or closed.
//!
//! # Stale identifiers
//!
//! Nothing clears the slot when a client disconnects.  The id stays in place
//! until the next client overwrites it, and sends against it are dropped by
//! the serving layer (see [`crate::sink::SendError::NoSuchConnection`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Opaque handle for one client transport session.
///
/// The serving infrastructure owns the connection object; this id is only a
/// weak reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Hands out fresh, monotonically increasing connection ids.
///
/// Ids start at 1 so that a zero value never looks like a valid session in
/// log output.
///
/// # Examples
///
/// ```rust
/// use uart_bridge_core::{ConnectionId, ConnectionIdAllocator};
///
/// let ids = ConnectionIdAllocator::new();
/// assert_eq!(ids.next(), ConnectionId(1));
/// assert_eq!(ids.next(), ConnectionId(2));
/// ```
#[derive(Debug)]
pub struct ConnectionIdAllocator {
    inner: AtomicU64,
}

impl ConnectionIdAllocator {
    /// Creates an allocator whose first id is `ConnectionId(1)`.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(1),
        }
    }

    /// Returns the next id.
    ///
    /// `Relaxed` ordering is enough: ids only need to be unique, they do not
    /// publish any other memory.
    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.inner.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-protected single slot holding the current client connection.
///
/// Shared as `Arc<ConnectionRegistry>` between the pump thread and the
/// request-serving tasks.  Every read and write goes through the mutex, so
/// the pump can never observe a half-written id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    slot: Mutex<Option<ConnectionId>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry ("no connection").
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as the current connection, replacing any previous one.
    ///
    /// Returns the id that was replaced, if any.
    pub fn set(&self, id: ConnectionId) -> Option<ConnectionId> {
        // The slot is a plain `Option<ConnectionId>`; a panic while holding
        // the lock cannot leave it half-written, so a poisoned lock is safe
        // to reuse.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.replace(id)
    }

    /// Returns the current connection id, or `None` if no client has ever
    /// connected.
    pub fn get(&self) -> Option<ConnectionId> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
