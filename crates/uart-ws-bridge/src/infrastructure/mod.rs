//! Infrastructure layer for uart-ws-bridge.
//!
//! Everything that touches the outside world lives here.
//!
//! # Responsibilities
//!
//! - Opening and configuring the UART ([`serial_port`])
//! - Serving the chat page and the WebSocket endpoint ([`http_server`])
//! - Holding per-client outbound queues ([`client_hub`])
//! - Loading the chat page from disk ([`static_page`])
//! - Writing the access point configuration for hostapd ([`provisioning`])
//!
//! # What does NOT belong here?
//!
//! - Framing, NUL handling and target selection (that is `uart-bridge-core`)
//! - Configuration parsing (that is done in `main.rs`)

pub mod client_hub;
pub mod http_server;
pub mod provisioning;
pub mod serial_port;
pub mod static_page;

pub use client_hub::ClientHub;
pub use http_server::{router, run_server, serve, AppState, SharedHandler, SharedState};
pub use provisioning::write_hostapd_conf;
pub use static_page::{StaticPage, StaticPageError};
