//! Application layer for uart-ws-bridge.
//!
//! Assembles the core bridge pieces from a [`BridgeConfig`] and runs the
//! serial pump.  It works against the core traits only; `main.rs` supplies
//! the real UART and the client hub.
//!
//! [`BridgeConfig`]: crate::domain::BridgeConfig

pub mod bridge_service;

pub use bridge_service::{build_inbound_handler, build_pump, spawn_pump, PUMP_THREAD_NAME};
