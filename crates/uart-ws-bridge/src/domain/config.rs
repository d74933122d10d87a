//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! Its defaults reproduce the device exactly (9600 8-N-1, 1000 ms reads,
//! chat page on port 80, the `ESP32 LoRa Chat 1` access point); `main.rs`
//! only overrides what a particular host needs, such as the serial device
//! path.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use uart_bridge_core::{NulPolicy, SerialSettings, READ_TIMEOUT};

use super::access_point::AccessPointConfig;

/// Route serving the chat page.
pub const CHAT_ROUTE: &str = "/chat";

/// Route accepting the WebSocket upgrade.
pub const WS_ROUTE: &str = "/ws";

/// WebSocket subprotocol the chat page asks for.
pub const WS_SUBPROTOCOL: &str = "chat";

/// All runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM3`.
    pub serial_path: String,

    /// UART line parameters.
    pub serial: SerialSettings,

    /// How long one pump read waits for serial data.
    pub read_timeout: Duration,

    /// Address the HTTP/WebSocket server binds to.
    pub http_bind_addr: SocketAddr,

    /// File served at [`CHAT_ROUTE`].  Read once at startup.
    pub chat_page_path: PathBuf,

    /// Frames buffered per client before further frames are dropped.
    pub outbound_queue_depth: usize,

    /// NUL handling for both directions.
    pub nul_policy: NulPolicy,

    /// Access point the browser joins.
    pub access_point: AccessPointConfig,

    /// Wireless interface named in the rendered hostapd configuration.
    pub ap_interface: String,

    /// When set, a hostapd configuration is written here at startup.
    pub hostapd_conf_path: Option<PathBuf>,
}

impl BridgeConfig {
    pub const DEFAULT_SERIAL_PATH: &'static str = "/dev/ttyUSB0";
    pub const DEFAULT_HTTP_PORT: u16 = 80;
    pub const DEFAULT_CHAT_PAGE: &'static str = "/usr/share/uart-ws-bridge/chat.html";
    pub const DEFAULT_OUTBOUND_QUEUE_DEPTH: usize = 64;
    pub const DEFAULT_AP_INTERFACE: &'static str = "wlan0";
}

impl Default for BridgeConfig {
    /// | Field                | Default               |
    /// |----------------------|-----------------------|
    /// | serial_path          | `/dev/ttyUSB0`        |
    /// | serial               | 9600 8-N-1, no flow   |
    /// | read_timeout         | 1000 ms               |
    /// | http_bind_addr       | `0.0.0.0:80`          |
    /// | chat_page_path       | `/usr/share/uart-ws-bridge/chat.html` |
    /// | outbound_queue_depth | 64                    |
    /// | nul_policy           | truncate              |
    /// | ap_interface         | `wlan0`               |
    /// | hostapd_conf_path    | none                  |
    fn default() -> Self {
        Self {
            serial_path: Self::DEFAULT_SERIAL_PATH.to_string(),
            serial: SerialSettings::default(),
            read_timeout: READ_TIMEOUT,
            http_bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, Self::DEFAULT_HTTP_PORT)),
            chat_page_path: PathBuf::from(Self::DEFAULT_CHAT_PAGE),
            outbound_queue_depth: Self::DEFAULT_OUTBOUND_QUEUE_DEPTH,
            nul_policy: NulPolicy::Truncate,
            access_point: AccessPointConfig::default(),
            ap_interface: Self::DEFAULT_AP_INTERFACE.to_string(),
            hostapd_conf_path: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
