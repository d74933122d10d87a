//! Serial transport contract.
//!
//! The bridge talks to a byte-oriented UART with fixed line parameters
//! (9600 baud, 8 data bits, no parity, 1 stop bit, no hardware flow
//! control).  The transport is split by direction:
//!
//! - [`SerialReader`] is owned by the bridge pump (serial → client);
//! - [`SerialWriter`] is owned by the inbound frame handler (client → serial).
//!
//! Each half has exactly one user, so neither needs its own lock.  The
//! concrete implementation lives in the binary crate
//! (`infrastructure::serial_port`); tests use [`crate::mock::MockSerialPort`].

use std::time::Duration;

use thiserror::Error;

/// Errors produced by a serial transport.
///
/// A read timeout is *not* an error: [`SerialReader::read`] returns `Ok(0)`.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The port could not be opened or configured.  Fatal at startup.
    #[error("failed to open serial port {path}: {reason}")]
    Open { path: String, reason: String },

    /// An I/O error occurred on an open port.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The port has been closed (device unplugged, test double exhausted).
    #[error("serial port closed")]
    Closed,
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// Line parameters for the UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// Baud rate the bridge device is wired for.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// 8-N-1 at `baud_rate`, no flow control.
    pub fn eight_n_one(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl Default for SerialSettings {
    /// 9600 baud, 8-N-1, no flow control.
    fn default() -> Self {
        Self::eight_n_one(Self::DEFAULT_BAUD_RATE)
    }
}

/// Read half of a serial transport.
pub trait SerialReader: Send {
    /// Blocks up to `timeout` waiting for at least one byte.
    ///
    /// Returns the number of bytes written into `buf` (possibly fewer than
    /// `buf.len()`), or `Ok(0)` if the timeout elapsed with no data.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError>;
}

/// Write half of a serial transport.
pub trait SerialWriter: Send {
    /// Writes all of `bytes`, blocking until the transport accepted them.
    ///
    /// Either the full sequence is delivered or an error is returned.
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError>;
}

impl<T: SerialReader + ?Sized> SerialReader for Box<T> {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        (**self).read(buf, timeout)
    }
}

impl<T: SerialWriter + ?Sized> SerialWriter for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        (**self).write(bytes)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
