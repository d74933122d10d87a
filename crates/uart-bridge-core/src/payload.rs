//! Text payload rules shared by both bridge directions.
//!
//! The bridge is a text pass-through: serial bytes become WebSocket text
//! frames, and client text frames become serial bytes.  Two rules shape the
//! bytes on the way through.
//!
//! # NUL handling
//!
//! The bridge historically treated every payload as a NUL-terminated
//! string, so an embedded `0x00` byte cut the payload short.  This is kept
//! as the default ([`NulPolicy::Truncate`]) in both directions.
//! [`NulPolicy::Preserve`] forwards the exact byte count instead; selecting
//! it is a deliberate behaviour change.
//!
//! # UTF-8 assembly
//!
//! WebSocket text frames must carry valid UTF-8, but a serial read can end
//! in the middle of a multi-byte character.  [`Utf8Assembler`] holds such an
//! incomplete tail back until the next read completes it.  Bytes that can
//! never form valid UTF-8 are replaced with U+FFFD.

use std::char::REPLACEMENT_CHARACTER;

/// What to do with a `0x00` byte inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NulPolicy {
    /// The payload ends at the first NUL byte; everything from it onward is
    /// dropped.
    #[default]
    Truncate,
    /// The payload is forwarded in full, NUL bytes included.
    Preserve,
}

impl NulPolicy {
    /// Returns the part of `bytes` that is forwarded under this policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uart_bridge_core::NulPolicy;
    ///
    /// assert_eq!(NulPolicy::Truncate.apply(b"ab\0cd"), b"ab");
    /// assert_eq!(NulPolicy::Preserve.apply(b"ab\0cd"), b"ab\0cd");
    /// ```
    pub fn apply(self, bytes: &[u8]) -> &[u8] {
        match self {
            NulPolicy::Truncate => match bytes.iter().position(|&b| b == 0) {
                Some(end) => &bytes[..end],
                None => bytes,
            },
            NulPolicy::Preserve => bytes,
        }
    }
}

/// Builds valid UTF-8 text out of arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct Utf8Assembler {
    /// Bytes of an incomplete multi-byte sequence from the previous chunk.
    /// Never longer than 3 bytes.
    pending: Vec<u8>,
}

impl Utf8Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns all text that is complete so far.
    ///
    /// Returns `None` when nothing printable is ready yet (empty chunk, or a
    /// chunk that only extends an incomplete sequence).
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(chunk);

        let mut text = String::with_capacity(self.pending.len());
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    text.push_str(valid);
                    start = self.pending.len();
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match err.error_len() {
                        Some(invalid_len) => {
                            text.push(REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        None => {
                            // Incomplete sequence at the very end: keep it.
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Gives up on a held-back incomplete sequence and returns it as U+FFFD.
    ///
    /// Called when the serial line goes quiet: the missing bytes are not
    /// coming.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }

    /// `true` while an incomplete sequence is held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
