//! Domain layer for uart-ws-bridge.
//!
//! Plain configuration types with no I/O: what the bridge is set up to do,
//! not how it does it.

pub mod access_point;
pub mod config;

pub use access_point::{AccessPointConfig, AccessPointError, AuthMode};
pub use config::{BridgeConfig, CHAT_ROUTE, WS_ROUTE, WS_SUBPROTOCOL};
