//! # uart-bridge-core
//!
//! Platform-agnostic core of the serial-to-WebSocket bridge.
//!
//! The bridge relays bytes between one UART and one connected WebSocket
//! client.  This crate contains everything that has real behaviour and none
//! of the I/O: there is no async runtime, no socket and no device file in
//! here.  The binary crate (`uart-ws-bridge`) plugs concrete transports into
//! the traits defined below.
//!
//! # Architecture overview
//!
//! ```text
//!              ┌──────────────┐   try_send_text(id, text)   ┌──────────┐
//!  UART RX ──▶ │  BridgePump  │ ──────────────────────────▶ │  Client  │
//!              └──────┬───────┘                             │   sink   │
//!                     │ get()                               └──────────┘
//!              ┌──────▼─────────────┐
//!              │ ConnectionRegistry │  (the only shared state)
//!              └──────▲─────────────┘
//!                     │ set(id)
//!              ┌──────┴──────────────┐
//!  UART TX ◀── │ InboundFrameHandler │ ◀── client frames
//!              └─────────────────────┘
//! ```
//!
//! - **`registry`** – single-slot, lock-protected record of the current
//!   client connection.  Last connected client wins.
//! - **`serial`** – the serial transport contract, split into a read half
//!   (owned by the pump) and a write half (owned by the handler).
//! - **`payload`** – text rules shared by both directions: NUL handling and
//!   UTF-8 assembly of raw serial chunks.
//! - **`sink`** – the serving layer's non-blocking "enqueue or drop"
//!   capability used by the pump.
//! - **`pump`** – serial → client direction.
//! - **`inbound`** – client → serial direction.
//! - **`mock`** – in-memory doubles for tests.

pub mod inbound;
pub mod mock;
pub mod payload;
pub mod pump;
pub mod registry;
pub mod serial;
pub mod sink;

pub use inbound::{
    BridgeError, FrameOutcome, InboundEvent, InboundFrameHandler, ReceiveError, ReceivedFrame,
};
pub use payload::{NulPolicy, Utf8Assembler};
pub use pump::{BridgePump, PumpOutcome, READ_TIMEOUT, SCRATCH_BUFFER_SIZE};
pub use registry::{ConnectionId, ConnectionIdAllocator, ConnectionRegistry};
pub use serial::{
    DataBits, FlowControl, Parity, SerialError, SerialReader, SerialSettings, SerialWriter,
    StopBits,
};
pub use sink::{ClientSink, SendError};
