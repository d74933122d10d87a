//! Inbound frame handler: the client → serial direction.
//!
//! The serving infrastructure calls [`InboundFrameHandler::handle`] once per
//! event on a client connection:
//!
//! - [`InboundEvent::Connected`] records the connection in the
//!   [`ConnectionRegistry`].  This is the only place the registry is written.
//! - [`InboundEvent::Frame`] carries one complete client frame.  A frame with
//!   a declared length of zero is a no-op; otherwise the payload (cut at the
//!   first NUL under the default policy) is written to the serial port.
//! - [`InboundEvent::ReceiveFailed`] reports that the frame could not be
//!   received.  Processing stops for this event and the failure is returned
//!   to the caller, which decides whether to close the connection.  There
//!   is no retry here.
//!
//! # Frame reception
//!
//! Receiving a frame is the serving layer's job.  Whatever steps it needs
//! to learn the frame length and fetch the payload, it hands the handler a
//! [`ReceivedFrame`] that carries both together.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::payload::NulPolicy;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::serial::{SerialError, SerialWriter};

/// Boxed error from the serving layer's receive path.
pub type ReceiveError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned to the serving layer for a single inbound event.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The frame could not be received.
    #[error("failed to receive frame: {0}")]
    Receive(#[source] ReceiveError),

    /// The payload could not be written to the serial port.
    #[error("failed to write {len} bytes to serial: {source}")]
    SerialWrite {
        len: usize,
        #[source]
        source: SerialError,
    },
}

/// One complete client frame: its payload and declared length together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceivedFrame {
    payload: Vec<u8>,
}

impl ReceivedFrame {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Length the frame declared on the wire.
    pub fn declared_len(&self) -> usize {
        self.payload.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl From<Vec<u8>> for ReceivedFrame {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

impl From<String> for ReceivedFrame {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<&str> for ReceivedFrame {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

/// An event on a client connection, as delivered by the serving layer.
#[derive(Debug)]
pub enum InboundEvent {
    /// Connection established; no payload.
    Connected(ConnectionId),
    /// A data frame arrived.
    Frame(ReceivedFrame),
    /// Receiving the next frame failed.
    ReceiveFailed(ReceiveError),
}

/// Result of a successfully handled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The connection is now the pump's target.  `replaced` is the
    /// previously registered connection, if any.
    Registered {
        id: ConnectionId,
        replaced: Option<ConnectionId>,
    },
    /// Zero-length frame; nothing was written.
    Empty,
    /// `len` bytes were written to the serial port.
    Written { len: usize },
}

/// Forwards client frames to the serial port and registers new clients.
///
/// Shared as `Arc<InboundFrameHandler<_>>` by every client session.  Several
/// sessions can briefly coexist (last connected wins, older ones are not
/// closed), so the serial write half sits behind a mutex: writes from two
/// sessions never interleave within one payload.
pub struct InboundFrameHandler<W> {
    writer: Mutex<W>,
    registry: Arc<ConnectionRegistry>,
    nul_policy: NulPolicy,
}

impl<W: SerialWriter> InboundFrameHandler<W> {
    pub fn new(writer: W, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            writer: Mutex::new(writer),
            registry,
            nul_policy: NulPolicy::default(),
        }
    }

    pub fn with_nul_policy(mut self, policy: NulPolicy) -> Self {
        self.nul_policy = policy;
        self
    }

    /// Handles one connection event.
    ///
    /// Blocks while the payload is written to the serial port.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Receive`] for [`InboundEvent::ReceiveFailed`], and
    /// [`BridgeError::SerialWrite`] if the serial write fails.
    pub fn handle(&self, event: InboundEvent) -> Result<FrameOutcome, BridgeError> {
        match event {
            InboundEvent::Connected(id) => Ok(self.on_connect(id)),
            InboundEvent::Frame(frame) => self.on_frame(&frame),
            InboundEvent::ReceiveFailed(e) => {
                error!("websocket frame receive failed: {e}");
                Err(BridgeError::Receive(e))
            }
        }
    }

    /// Records `id` as the connection the bridge pump sends to.
    pub fn on_connect(&self, id: ConnectionId) -> FrameOutcome {
        let replaced = self.registry.set(id);
        match replaced {
            Some(old) if old != id => info!("websocket client {id} connected (replaces {old})"),
            _ => info!("websocket client {id} connected"),
        }
        FrameOutcome::Registered { id, replaced }
    }

    /// Writes the payload of one data frame to the serial port.
    pub fn on_frame(&self, frame: &ReceivedFrame) -> Result<FrameOutcome, BridgeError> {
        if frame.declared_len() == 0 {
            return Ok(FrameOutcome::Empty);
        }

        let payload = self.nul_policy.apply(frame.payload());
        let len = payload.len();
        if len == 0 {
            debug!(
                "client frame of {} bytes starts with NUL; nothing to write",
                frame.declared_len()
            );
            return Ok(FrameOutcome::Written { len });
        }

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write(payload)
            .map_err(|source| BridgeError::SerialWrite { len, source })?;
        debug!("client → serial: {len} bytes");
        Ok(FrameOutcome::Written { len })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
