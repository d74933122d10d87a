//! Bridge pump: the serial → client direction.
//!
//! The pump runs on its own long-lived thread and loops:
//!
//! 1. Read from the serial port into a 2048-byte scratch buffer (one byte
//!    reserved, so at most 2047 bytes per read), waiting up to 1000 ms.
//! 2. On timeout, loop again.  A timeout is routine, not an error.
//! 3. Otherwise apply the [`NulPolicy`], turn the bytes into UTF-8 text and
//!    hand it to the [`ClientSink`] for whichever connection the
//!    [`ConnectionRegistry`] currently holds.
//!
//! "No client connected" and "send refused" are steady states: the frame is
//! dropped and the loop carries on.  The only way out of [`BridgePump::run`]
//! is clearing the `running` flag, which the pump checks between reads, so
//! the 1000 ms read timeout bounds how long shutdown takes.
//!
//! Byte order from the serial line is preserved: there is one pump, one
//! stream and no reordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::payload::{NulPolicy, Utf8Assembler};
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::serial::{SerialError, SerialReader};
use crate::sink::{ClientSink, SendError};

/// Size of the pump's scratch buffer.  One byte is reserved for the string
/// terminator, so a single read never returns more than
/// `SCRATCH_BUFFER_SIZE - 1` bytes.
pub const SCRATCH_BUFFER_SIZE: usize = 2048;

/// How long one serial read waits for data.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Pause after a failed serial read before trying again.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// What one iteration of the pump did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The read timed out with nothing to forward.
    Idle,
    /// Bytes were read but produced no text yet (an incomplete UTF-8
    /// sequence, or a payload truncated to nothing by a leading NUL).
    NoText { read: usize },
    /// Text was enqueued for `id`.
    Forwarded { id: ConnectionId, len: usize },
    /// Text was ready but no client has ever connected.
    NoClient { len: usize },
    /// The sink refused the frame; it is gone.
    Dropped { id: ConnectionId, reason: SendError },
}

/// The serial → client forwarding loop.
///
/// Generic over the serial read half and the sink so that tests can drive
/// it with [`crate::mock`] doubles.
pub struct BridgePump<R, S> {
    reader: R,
    registry: Arc<ConnectionRegistry>,
    sink: S,
    nul_policy: NulPolicy,
    read_timeout: Duration,
    buffer: Box<[u8; SCRATCH_BUFFER_SIZE]>,
    assembler: Utf8Assembler,
}

impl<R: SerialReader, S: ClientSink> BridgePump<R, S> {
    /// Creates a pump with the default 1000 ms read timeout and the legacy
    /// NUL-truncating policy.
    pub fn new(reader: R, registry: Arc<ConnectionRegistry>, sink: S) -> Self {
        Self {
            reader,
            registry,
            sink,
            nul_policy: NulPolicy::default(),
            read_timeout: READ_TIMEOUT,
            buffer: Box::new([0u8; SCRATCH_BUFFER_SIZE]),
            assembler: Utf8Assembler::new(),
        }
    }

    pub fn with_nul_policy(mut self, policy: NulPolicy) -> Self {
        self.nul_policy = policy;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Runs one read-and-forward iteration.
    ///
    /// # Errors
    ///
    /// Returns the serial error if the read failed.  Delivery problems are
    /// never errors; they are reported as [`PumpOutcome::NoClient`] or
    /// [`PumpOutcome::Dropped`].
    pub fn step(&mut self) -> Result<PumpOutcome, SerialError> {
        let capacity = SCRATCH_BUFFER_SIZE - 1;
        let read = self
            .reader
            .read(&mut self.buffer[..capacity], self.read_timeout)?;

        if read == 0 {
            // The line went quiet: an incomplete character will not be
            // completed any more.
            return Ok(match self.assembler.flush() {
                Some(text) => self.forward(text),
                None => PumpOutcome::Idle,
            });
        }

        let payload = self.nul_policy.apply(&self.buffer[..read]);
        match self.assembler.push(payload) {
            Some(text) => Ok(self.forward(text)),
            None => Ok(PumpOutcome::NoText { read }),
        }
    }

    /// Loops over [`step`](Self::step) until `running` is cleared.
    ///
    /// Read errors are logged and retried after a short pause; nothing that
    /// happens on the serial line or the client side ends the loop.
    pub fn run(&mut self, running: &AtomicBool) {
        info!(
            "bridge pump started (read timeout {:?}, NUL policy {:?})",
            self.read_timeout, self.nul_policy
        );

        while running.load(Ordering::Relaxed) {
            if let Err(e) = self.step() {
                warn!("serial read failed: {e}");
                std::thread::sleep(READ_ERROR_BACKOFF);
            }
        }

        info!("bridge pump stopped");
    }

    fn forward(&mut self, text: String) -> PumpOutcome {
        let len = text.len();
        info!("serial: {len} bytes received");
        let Some(id) = self.registry.get() else {
            debug!("serial: {len} bytes with no client connected; dropped");
            return PumpOutcome::NoClient { len };
        };

        debug!("serial → {id}: {text:?}");
        match self.sink.try_send_text(id, text) {
            Ok(()) => PumpOutcome::Forwarded { id, len },
            Err(reason) => {
                debug!("serial → {id}: frame dropped: {reason}");
                PumpOutcome::Dropped { id, reason }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
