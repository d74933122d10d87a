//! In-memory test doubles for the serial transport and the client sink.
//!
//! [`MockSerialPort`] plays the UART: tests queue the chunks the "device"
//! will deliver and inspect what the bridge wrote back.  Its read and write
//! halves share state, the same way two handles cloned from one real port
//! share the device.  [`RecordingSink`] captures every frame the pump
//! enqueues.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::registry::ConnectionId;
use crate::serial::{SerialError, SerialReader, SerialWriter};
use crate::sink::{ClientSink, SendError};

/// Upper bound on how long an idle mock read sleeps, so tests stay fast.
const IDLE_READ_SLEEP: Duration = Duration::from_millis(5);

enum ReadStep {
    Data(Vec<u8>),
    Error,
}

#[derive(Default)]
struct PortState {
    reads: VecDeque<ReadStep>,
    writes: Vec<Vec<u8>>,
    fail_writes: bool,
    failed_writes: usize,
    read_calls: usize,
}

/// A scripted, in-memory serial port.
#[derive(Clone, Default)]
pub struct MockSerialPort {
    state: Arc<Mutex<PortState>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `bytes` to be returned by a future read, as if the device had
    /// sent them.
    pub fn push_read(&self, bytes: &[u8]) {
        self.lock().reads.push_back(ReadStep::Data(bytes.to_vec()));
    }

    /// Makes a future read fail with an I/O error.
    pub fn push_read_error(&self) {
        self.lock().reads.push_back(ReadStep::Error);
    }

    /// When `true`, every write fails with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Every successful write call, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// All successfully written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.lock().writes.concat()
    }

    /// Number of write calls that failed because of [`set_fail_writes`].
    ///
    /// [`set_fail_writes`]: MockSerialPort::set_fail_writes
    pub fn failed_writes(&self) -> usize {
        self.lock().failed_writes
    }

    /// Number of read calls made so far.
    pub fn read_calls(&self) -> usize {
        self.lock().read_calls
    }

    /// A read half sharing this port's state.
    pub fn reader(&self) -> MockSerialReader {
        MockSerialReader { port: self.clone() }
    }

    /// A write half sharing this port's state.
    pub fn writer(&self) -> MockSerialWriter {
        MockSerialWriter { port: self.clone() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PortState> {
        self.state.lock().expect("mock serial port lock poisoned")
    }
}

/// Read half of a [`MockSerialPort`].
pub struct MockSerialReader {
    port: MockSerialPort,
}

impl SerialReader for MockSerialReader {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        let step = {
            let mut state = self.port.lock();
            state.read_calls += 1;
            state.reads.pop_front()
        };

        match step {
            Some(ReadStep::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    // The rest stays in the "driver buffer" for the next read.
                    let rest = bytes.split_off(n);
                    self.port.lock().reads.push_front(ReadStep::Data(rest));
                }
                Ok(n)
            }
            Some(ReadStep::Error) => Err(SerialError::Io(io::Error::new(
                io::ErrorKind::Other,
                "scripted read failure",
            ))),
            None => {
                std::thread::sleep(timeout.min(IDLE_READ_SLEEP));
                Ok(0)
            }
        }
    }
}

/// Write half of a [`MockSerialPort`].
pub struct MockSerialWriter {
    port: MockSerialPort,
}

impl SerialWriter for MockSerialWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut state = self.port.lock();
        if state.fail_writes {
            state.failed_writes += 1;
            return Err(SerialError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }
}

/// A [`ClientSink`] that records every frame it accepts.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ConnectionId, String)>>,
    refuse: Mutex<Option<SendError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following send fail with `err` (or succeed again with
    /// `None`).
    pub fn refuse_with(&self, err: Option<SendError>) {
        *self.refuse.lock().expect("recording sink lock poisoned") = err;
    }

    /// Every accepted frame, in order.
    pub fn sent(&self) -> Vec<(ConnectionId, String)> {
        self.sent.lock().expect("recording sink lock poisoned").clone()
    }

    /// Accepted frame texts concatenated.
    pub fn concatenated(&self) -> String {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }
}

impl ClientSink for RecordingSink {
    fn try_send_text(&self, id: ConnectionId, text: String) -> Result<(), SendError> {
        if let Some(err) = self
            .refuse
            .lock()
            .expect("recording sink lock poisoned")
            .clone()
        {
            return Err(err);
        }
        self.sent
            .lock()
            .expect("recording sink lock poisoned")
            .push((id, text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_returns_queued_chunk() {
        // Arrange
        let port = MockSerialPort::new();
        port.push_read(b"abc");
        let mut reader = port.reader();
        let mut buf = [0u8; 16];

        // Act
        let n = reader.read(&mut buf, Duration::from_millis(1)).unwrap();

        // Assert
        assert_eq!(&buf[..n], b"abc");
    }

    #[test]
    fn test_mock_read_splits_chunk_larger_than_buffer() {
        let port = MockSerialPort::new();
        port.push_read(b"abcdef");
        let mut reader = port.reader();
        let mut buf = [0u8; 4];

        let first = reader.read(&mut buf, Duration::from_millis(1)).unwrap();
        assert_eq!(&buf[..first], b"abcd");
        let second = reader.read(&mut buf, Duration::from_millis(1)).unwrap();
        assert_eq!(&buf[..second], b"ef");
    }

    #[test]
    fn test_mock_read_times_out_with_zero_when_empty() {
        let port = MockSerialPort::new();
        let mut reader = port.reader();
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf, Duration::from_millis(1)).unwrap(), 0);
        assert_eq!(port.read_calls(), 1);
    }

    #[test]
    fn test_mock_writer_records_and_can_fail() {
        // Arrange
        let port = MockSerialPort::new();
        let mut writer = port.writer();

        // Act
        writer.write(b"one").unwrap();
        port.set_fail_writes(true);
        let failed = writer.write(b"two");

        // Assert
        assert!(failed.is_err());
        assert_eq!(port.writes(), vec![b"one".to_vec()]);
    }

    #[test]
    fn test_mock_writer_counts_failed_writes() {
        // Arrange
        let port = MockSerialPort::new();
        let mut writer = port.writer();
        port.set_fail_writes(true);

        // Act
        let _ = writer.write(b"a");
        let _ = writer.write(b"b");
        port.set_fail_writes(false);
        writer.write(b"c").unwrap();

        // Assert
        assert_eq!(port.failed_writes(), 2);
        assert_eq!(port.written(), b"c");
    }

    #[test]
    fn test_recording_sink_refuses_when_told() {
        let sink = RecordingSink::new();
        sink.try_send_text(ConnectionId(1), "a".into()).unwrap();
        sink.refuse_with(Some(SendError::QueueFull(ConnectionId(1))));
        assert!(sink.try_send_text(ConnectionId(1), "b".into()).is_err());
        assert_eq!(sink.concatenated(), "a");
    }
}
