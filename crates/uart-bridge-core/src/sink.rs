//! The serving layer's outbound capability, as seen by the bridge pump.
//!
//! The pump never owns a socket.  It hands a text frame and a
//! [`ConnectionId`] to a [`ClientSink`], which either enqueues the frame for
//! that connection or refuses immediately.  There is no acknowledgement and
//! no waiting: a slow or dead client must never stall the serial read loop.

use thiserror::Error;

use crate::registry::ConnectionId;

/// Why a frame could not be enqueued.
///
/// The pump treats every variant as "message dropped" and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The id does not name a live session (client disconnected).
    #[error("no live connection for {0}")]
    NoSuchConnection(ConnectionId),

    /// The session's outbound queue is full.
    #[error("outbound queue full for {0}")]
    QueueFull(ConnectionId),

    /// The session is shutting down and no longer accepts frames.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// Non-blocking, fire-and-forget delivery of text frames to one client.
#[cfg_attr(test, mockall::automock)]
pub trait ClientSink: Send + Sync {
    /// Enqueues `text` as one text frame for connection `id`, or fails
    /// without blocking.
    fn try_send_text(&self, id: ConnectionId, text: String) -> Result<(), SendError>;
}

impl<T: ClientSink + ?Sized> ClientSink for std::sync::Arc<T> {
    fn try_send_text(&self, id: ConnectionId, text: String) -> Result<(), SendError> {
        (**self).try_send_text(id, text)
    }
}
