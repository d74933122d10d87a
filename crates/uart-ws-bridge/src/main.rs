//! UART ↔ WebSocket bridge: entry point.
//!
//! Relays bytes between a serial line and one browser.  The browser joins
//! the bridge's Wi-Fi access point, loads the chat page from `GET /chat` and
//! opens a WebSocket to `/ws` with the `chat` subprotocol.  Whatever arrives
//! on the UART is pushed to the most recently connected client as text
//! frames; every frame the client sends is written to the UART.
//!
//! # Usage
//!
//! ```text
//! uart-ws-bridge [OPTIONS]
//!
//! Options:
//!   --serial-port <PATH>     Serial device [default: /dev/ttyUSB0]
//!   --chat-page <PATH>       Chat page served at /chat
//!                            [default: /usr/share/uart-ws-bridge/chat.html]
//!   --ap-interface <IFACE>   Wireless interface for hostapd [default: wlan0]
//!   --hostapd-conf <PATH>    Write a hostapd configuration here at startup
//! ```
//!
//! Only where the bridge finds things on the host can be changed.  Line
//! settings (9600 8-N-1), the HTTP port, the routes, the access point
//! identity and the NUL handling are fixed in [`BridgeConfig`].
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                   | Default                                |
//! |----------------------------|----------------------------------------|
//! | `UART_BRIDGE_SERIAL_PORT`  | `/dev/ttyUSB0`                         |
//! | `UART_BRIDGE_CHAT_PAGE`    | `/usr/share/uart-ws-bridge/chat.html`  |
//! | `UART_BRIDGE_AP_INTERFACE` | `wlan0`                                |
//! | `UART_BRIDGE_HOSTAPD_CONF` | unset                                  |
//!
//! # Architecture overview
//!
//! ```text
//! Browser  (GET /chat, WebSocket /ws)
//!       ↕
//! uart-ws-bridge  ← this process
//!   http_server   axum router, one task per WebSocket session
//!   client_hub    bounded outbound queue per session
//!   uart-rx       pump thread: serial → registered client
//!       ↕
//! UART  (9600 8-N-1)
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uart_bridge_core::{ConnectionRegistry, SerialWriter};
use uart_ws_bridge::application::{build_inbound_handler, build_pump, spawn_pump};
use uart_ws_bridge::domain::{BridgeConfig, CHAT_ROUTE, WS_ROUTE};
use uart_ws_bridge::infrastructure::{
    run_server, serial_port, write_hostapd_conf, AppState, ClientHub, SharedHandler, StaticPage,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// UART to WebSocket bridge with a browser chat page.
#[derive(Debug, Parser)]
#[command(
    name = "uart-ws-bridge",
    about = "Relays a serial line to a browser chat page over WebSocket",
    version
)]
struct Cli {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM3`.
    #[arg(
        long,
        default_value = BridgeConfig::DEFAULT_SERIAL_PATH,
        env = "UART_BRIDGE_SERIAL_PORT"
    )]
    serial_port: String,

    /// HTML file served at `/chat`.  Read once at startup.
    #[arg(
        long,
        default_value = BridgeConfig::DEFAULT_CHAT_PAGE,
        env = "UART_BRIDGE_CHAT_PAGE"
    )]
    chat_page: PathBuf,

    /// Wireless interface named in the hostapd configuration.
    #[arg(
        long,
        default_value = BridgeConfig::DEFAULT_AP_INTERFACE,
        env = "UART_BRIDGE_AP_INTERFACE"
    )]
    ap_interface: String,

    /// Write a hostapd configuration for the access point to this path.
    #[arg(long, env = "UART_BRIDGE_HOSTAPD_CONF")]
    hostapd_conf: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].  Every
    /// setting the CLI does not name keeps its fixed value.
    fn into_bridge_config(self) -> BridgeConfig {
        BridgeConfig {
            serial_path: self.serial_port,
            chat_page_path: self.chat_page,
            ap_interface: self.ap_interface,
            hostapd_conf_path: self.hostapd_conf,
            ..BridgeConfig::default()
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. Logging is initialised from `RUST_LOG` (default `info`).
/// 2. CLI arguments become a [`BridgeConfig`].
/// 3. The access point settings are validated and, if asked, written out
///    for hostapd.
/// 4. The UART is opened and the chat page is loaded.  Any failure in
///    steps 3 and 4 stops the bridge before it serves anything.
/// 5. The pump thread starts and the HTTP server runs until Ctrl+C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_bridge_config();

    info!(
        "UART WebSocket bridge starting: serial={} http={}",
        config.serial_path, config.http_bind_addr
    );

    // ── Access point ──────────────────────────────────────────────────────────
    let ap = &config.access_point;
    ap.validate().context("invalid access point settings")?;
    info!(
        "access point: SSID {:?}, channel {}, max {} station(s), {:?}",
        ap.ssid,
        ap.channel,
        ap.max_stations,
        ap.auth_mode()
    );
    if let Some(path) = &config.hostapd_conf_path {
        write_hostapd_conf(ap, &config.ap_interface, path)?;
    }

    // ── Fatal resources ───────────────────────────────────────────────────────
    let (reader, writer) =
        serial_port::open(&config.serial_path, &config.serial, config.read_timeout)
            .context("failed to open the serial port")?;

    let chat_page = StaticPage::load_html(&config.chat_page_path)
        .context("failed to load the chat page")?;

    // ── Bridge wiring ─────────────────────────────────────────────────────────
    let registry = Arc::new(ConnectionRegistry::new());
    let hub = Arc::new(ClientHub::new(config.outbound_queue_depth));

    let writer: Box<dyn SerialWriter> = Box::new(writer);
    let handler: SharedHandler = Arc::new(build_inbound_handler(
        writer,
        Arc::clone(&registry),
        &config,
    ));
    let pump = build_pump(reader, registry, Arc::clone(&hub), &config);
    let state = Arc::new(AppState::new(handler, hub, chat_page));

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    let pump_thread =
        spawn_pump(pump, Arc::clone(&running)).context("failed to start the pump thread")?;

    info!("chat page at http://{}{CHAT_ROUTE}, websocket at {WS_ROUTE}", config.http_bind_addr);

    // ── Main server loop ──────────────────────────────────────────────────────
    let served = run_server(&config, state, Arc::clone(&running)).await;

    // The server may also stop on its own (bind failure); the pump must
    // follow it either way.
    running.store(false, Ordering::Relaxed);
    tokio::task::spawn_blocking(move || pump_thread.join())
        .await
        .context("failed to join the pump thread")?
        .map_err(|_| anyhow::anyhow!("pump thread panicked"))?;

    served?;
    info!("UART WebSocket bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
