//! Bridge assembly.
//!
//! Builds the two halves of the bridge from a [`BridgeConfig`]:
//!
//! ```text
//! serial read half  → BridgePump          → ClientSink  (serial → client)
//! client frames     → InboundFrameHandler → serial write half
//! ```
//!
//! Both halves share one [`ConnectionRegistry`]: the handler records the
//! most recently connected client there and the pump sends to whoever it
//! holds.
//!
//! The pump blocks on serial reads, so [`spawn_pump`] gives it a dedicated
//! OS thread rather than a Tokio task.

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use uart_bridge_core::{
    BridgePump, ClientSink, ConnectionRegistry, InboundFrameHandler, SerialReader, SerialWriter,
};

use crate::domain::BridgeConfig;

/// Name of the thread running the bridge pump.
pub const PUMP_THREAD_NAME: &str = "uart-rx";

/// Builds the client → serial handler with the configured NUL policy.
pub fn build_inbound_handler<W: SerialWriter>(
    writer: W,
    registry: Arc<ConnectionRegistry>,
    config: &BridgeConfig,
) -> InboundFrameHandler<W> {
    InboundFrameHandler::new(writer, registry).with_nul_policy(config.nul_policy)
}

/// Builds the serial → client pump with the configured NUL policy and read
/// timeout.
pub fn build_pump<R: SerialReader, S: ClientSink>(
    reader: R,
    registry: Arc<ConnectionRegistry>,
    sink: S,
    config: &BridgeConfig,
) -> BridgePump<R, S> {
    BridgePump::new(reader, registry, sink)
        .with_nul_policy(config.nul_policy)
        .with_read_timeout(config.read_timeout)
}

/// Starts `pump` on its own thread.  The thread exits once `running` is
/// cleared, within one read timeout.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_pump<R, S>(
    mut pump: BridgePump<R, S>,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    R: SerialReader + 'static,
    S: ClientSink + 'static,
{
    std::thread::Builder::new()
        .name(PUMP_THREAD_NAME.to_string())
        .spawn(move || pump.run(&running))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
