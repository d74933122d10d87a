//! UART access through the `serialport` crate.
//!
//! [`open`] configures the device once and returns two handles onto it: a
//! [`UartReader`] for the bridge pump and a [`UartWriter`] for the inbound
//! frame handler.  Each handle has a single owner, so neither is locked.
//!
//! `serialport` reports an expired read timeout as
//! `io::ErrorKind::TimedOut`; the reader turns that into `Ok(0)` as the
//! [`SerialReader`] contract requires.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use uart_bridge_core::{
    DataBits, FlowControl, Parity, SerialError, SerialReader, SerialSettings, SerialWriter,
    StopBits,
};

/// Upper bound for one blocking write.  At 9600 baud the driver drains
/// roughly 960 bytes per second, so this leaves room for a full frame.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `path` with `settings` and splits it into read and write handles.
///
/// # Errors
///
/// Returns [`SerialError::Open`] if the device cannot be opened, configured
/// or cloned.  Callers treat this as fatal.
pub fn open(
    path: &str,
    settings: &SerialSettings,
    read_timeout: Duration,
) -> Result<(UartReader, UartWriter), SerialError> {
    let open_error = |e: serialport::Error| SerialError::Open {
        path: path.to_string(),
        reason: e.to_string(),
    };

    let port = serialport::new(path, settings.baud_rate)
        .data_bits(data_bits(settings.data_bits))
        .parity(parity(settings.parity))
        .stop_bits(stop_bits(settings.stop_bits))
        .flow_control(flow_control(settings.flow_control))
        .timeout(read_timeout)
        .open()
        .map_err(open_error)?;

    let mut write_port = port.try_clone().map_err(open_error)?;
    write_port.set_timeout(WRITE_TIMEOUT).map_err(open_error)?;

    info!(
        "opened serial port {path} at {} baud ({:?}, {:?}, {:?}, flow {:?})",
        settings.baud_rate,
        settings.data_bits,
        settings.parity,
        settings.stop_bits,
        settings.flow_control
    );

    Ok((
        UartReader {
            port,
            timeout: read_timeout,
        },
        UartWriter { port: write_port },
    ))
}

/// Read half of an opened UART.
pub struct UartReader {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialReader for UartReader {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        if timeout != self.timeout {
            self.port.set_timeout(timeout).map_err(io::Error::from)?;
            self.timeout = timeout;
        }
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write half of an opened UART.
pub struct UartWriter {
    port: Box<dyn SerialPort>,
}

impl SerialWriter for UartWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

fn flow_control(flow: FlowControl) -> serialport::FlowControl {
    match flow {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Software => serialport::FlowControl::Software,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
