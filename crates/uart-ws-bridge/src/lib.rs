//! uart-ws-bridge library crate.
//!
//! Relays a UART to a single browser over WebSocket and serves the chat page
//! that talks to it.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser  (GET /chat, WebSocket /ws "chat")
//!         ↕
//! [uart-ws-bridge]
//!   ├── domain/           BridgeConfig, AccessPointConfig
//!   ├── application/      Pump and inbound handler wiring, pump thread
//!   └── infrastructure/
//!         ├── http_server/   axum router, WebSocket sessions
//!         ├── client_hub/    per-session outbound queues
//!         ├── serial_port/   UART via serialport
//!         ├── static_page/   chat page loaded at startup
//!         └── provisioning/  hostapd configuration
//!         ↕
//! UART (9600 8-N-1)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `uart-bridge-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `axum` and
//!   `serialport`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: bridge assembly and the pump thread.
pub mod application;

/// Infrastructure layer: UART, HTTP/WebSocket server, client queues.
pub mod infrastructure;
