//! End-to-end tests for the bridge.
//!
//! # Purpose
//!
//! These tests run the real axum router on a loopback listener, the real
//! pump thread and the real client hub.  Only the UART is replaced, by the
//! in-memory [`MockSerialPort`].  They verify:
//!
//! - `GET /chat` serves the bundled page byte for byte as `text/html`.
//! - A text frame from the browser reaches the serial port unchanged.
//! - Serial input reaches the connected browser as text frames.
//! - The most recently connected browser is the one the pump talks to.
//! - A failing serial write costs the frame but not the session.
//! - A browser that vanishes leaves a stale registry entry; the pump's sends
//!   to it are refused and the pump keeps running.
//!
//! ```text
//! tungstenite client ──ws /ws "chat"──► axum ──► InboundFrameHandler ──► MockSerialPort
//!        ▲                                                                    │
//!        └────────── ClientHub queue ◄────────── BridgePump (uart-rx) ◄───────┘
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use uart_bridge_core::mock::MockSerialPort;
use uart_bridge_core::{ClientSink, ConnectionId, ConnectionRegistry, SendError, SerialWriter};
use uart_ws_bridge::application::{build_inbound_handler, build_pump, spawn_pump};
use uart_ws_bridge::domain::BridgeConfig;
use uart_ws_bridge::infrastructure::{
    router, serve, AppState, ClientHub, SharedHandler, SharedState, StaticPage,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

// ── Harness ───────────────────────────────────────────────────────────────────

/// A running bridge on a loopback port, backed by a mock UART.
struct Bridge {
    addr: std::net::SocketAddr,
    port: MockSerialPort,
    registry: Arc<ConnectionRegistry>,
    hub: Arc<ClientHub>,
    running: Arc<AtomicBool>,
    server: tokio::task::JoinHandle<anyhow::Result<()>>,
    pump: std::thread::JoinHandle<()>,
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        read_timeout: Duration::from_millis(20),
        ..BridgeConfig::default()
    }
}

fn build_state(
    port: &MockSerialPort,
    config: &BridgeConfig,
) -> (SharedState, Arc<ConnectionRegistry>, Arc<ClientHub>) {
    let registry = Arc::new(ConnectionRegistry::new());
    let hub = Arc::new(ClientHub::new(config.outbound_queue_depth));
    let writer: Box<dyn SerialWriter> = Box::new(port.writer());
    let handler: SharedHandler = Arc::new(build_inbound_handler(
        writer,
        Arc::clone(&registry),
        config,
    ));
    let page = StaticPage::from_bytes(StaticPage::HTML, &b"<h1>chat</h1>"[..]);
    let state = Arc::new(AppState::new(handler, Arc::clone(&hub), page));
    (state, registry, hub)
}

impl Bridge {
    async fn start() -> Self {
        let config = test_config();
        let port = MockSerialPort::new();
        let (state, registry, hub) = build_state(&port, &config);
        let running = Arc::new(AtomicBool::new(true));

        let pump = build_pump(port.reader(), Arc::clone(&registry), Arc::clone(&hub), &config);
        let pump = spawn_pump(pump, Arc::clone(&running)).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, state, Arc::clone(&running)));

        Self {
            addr,
            port,
            registry,
            hub,
            running,
            server,
            pump,
        }
    }

    async fn connect(&self) -> Client {
        let mut request = format!("ws://{}/ws", self.addr)
            .into_client_request()
            .unwrap();
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("chat"));

        let (client, response) = tokio_tungstenite::connect_async(request).await.unwrap();
        assert_eq!(
            response.headers().get("Sec-WebSocket-Protocol").unwrap(),
            "chat"
        );
        client
    }

    /// Waits until the mock UART has received exactly `expected`.
    async fn wait_for_serial(&self, expected: &[u8]) {
        let deadline = Instant::now() + WAIT;
        while self.port.written() != expected {
            assert!(
                Instant::now() < deadline,
                "serial received {:?}, expected {:?}",
                self.port.written(),
                expected
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Waits until the hub no longer holds a queue for `id`.
    async fn wait_for_detach(&self, id: ConnectionId) {
        let deadline = Instant::now() + WAIT;
        while self.hub.is_attached(id) {
            assert!(Instant::now() < deadline, "{id} still attached");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        tokio::time::timeout(WAIT, self.server)
            .await
            .expect("server must stop")
            .unwrap()
            .unwrap();
        tokio::task::spawn_blocking(move || self.pump.join().unwrap())
            .await
            .unwrap();
    }
}

/// Reads text frames until their concatenation is `expected`.
async fn receive_text(client: &mut Client, expected: &str) {
    let mut received = String::new();
    while received.len() < expected.len() {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        match frame {
            Message::Text(text) => received.push_str(&text),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
    assert_eq!(received, expected);
}

// ── HTTP ──────────────────────────────────────────────────────────────────────

/// The page shipped in the package is served exactly as stored.
#[tokio::test]
async fn test_get_chat_serves_bundled_page() {
    // Arrange
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/chat.html");
    let expected = std::fs::read(&path).unwrap();
    let port = MockSerialPort::new();
    let (mut state, _, _) = build_state(&port, &test_config());
    Arc::get_mut(&mut state).unwrap().chat_page = StaticPage::load_html(&path).unwrap();

    // Act
    let response = router(state)
        .oneshot(Request::get("/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], &expected[..]);
}

// ── WebSocket ─────────────────────────────────────────────────────────────────

/// Client sends `LED_ON`: the UART receives exactly those six bytes.
#[tokio::test(flavor = "multi_thread")]
async fn test_text_frame_is_written_to_serial() {
    // Arrange
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;

    // Act
    client.send(Message::Text("LED_ON".into())).await.unwrap();

    // Assert
    bridge.wait_for_serial(b"LED_ON").await;
    assert_eq!(bridge.port.writes(), vec![b"LED_ON".to_vec()]);

    client.close(None).await.unwrap();
    bridge.stop().await;
}

/// Binary frames are forwarded like text frames.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_frame_is_written_to_serial() {
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;

    client
        .send(Message::Binary(b"AT+SEND".to_vec()))
        .await
        .unwrap();

    bridge.wait_for_serial(b"AT+SEND").await;
    bridge.stop().await;
}

/// With the default policy the payload ends at the first NUL byte.
#[tokio::test(flavor = "multi_thread")]
async fn test_frame_is_truncated_at_nul_by_default() {
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;

    client.send(Message::Text("LED\0OFF".into())).await.unwrap();
    client.send(Message::Text("!".into())).await.unwrap();

    // The second frame marks the end of the first.
    bridge.wait_for_serial(b"LED!").await;
    bridge.stop().await;
}

/// Serial emits `hello\n` while a client is connected: the client receives
/// it as text.
#[tokio::test(flavor = "multi_thread")]
async fn test_serial_input_reaches_connected_client() {
    // Arrange: a round trip proves the session is registered
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;
    client.send(Message::Text("ping".into())).await.unwrap();
    bridge.wait_for_serial(b"ping").await;

    // Act
    bridge.port.push_read(b"hello\n");

    // Assert
    receive_text(&mut client, "hello\n").await;
    bridge.stop().await;
}

/// A second client takes over; the first stops receiving serial data but
/// is not disconnected.
#[tokio::test(flavor = "multi_thread")]
async fn test_last_connected_client_receives_serial_data() {
    // Arrange
    let bridge = Bridge::start().await;
    let mut first = bridge.connect().await;
    first.send(Message::Text("a".into())).await.unwrap();
    bridge.wait_for_serial(b"a").await;

    let mut second = bridge.connect().await;
    second.send(Message::Text("b".into())).await.unwrap();
    bridge.wait_for_serial(b"ab").await;

    // Act
    bridge.port.push_read(b"to second");

    // Assert
    receive_text(&mut second, "to second").await;
    let nothing = tokio::time::timeout(Duration::from_millis(200), first.next()).await;
    assert!(nothing.is_err(), "first client must not receive serial data");

    // The first session is still open and can still write to the UART.
    first.send(Message::Text("c".into())).await.unwrap();
    bridge.wait_for_serial(b"abc").await;

    bridge.stop().await;
}

/// Serial data with no client ever connected is dropped and the pump keeps
/// running.
#[tokio::test(flavor = "multi_thread")]
async fn test_serial_input_without_client_is_dropped() {
    // Arrange
    let bridge = Bridge::start().await;

    // Act
    bridge.port.push_read(b"nobody listening");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Assert: a client connecting afterwards only sees new data
    let mut client = bridge.connect().await;
    client.send(Message::Text("x".into())).await.unwrap();
    bridge.wait_for_serial(b"x").await;
    bridge.port.push_read(b"fresh");
    receive_text(&mut client, "fresh").await;

    bridge.stop().await;
}

/// While the UART refuses writes the session stays open; once writes work
/// again the next frame goes through.
#[tokio::test(flavor = "multi_thread")]
async fn test_failed_serial_write_keeps_session_open() {
    // Arrange
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;
    bridge.port.set_fail_writes(true);

    // Act: this frame is lost to the failing UART
    client.send(Message::Text("lost".into())).await.unwrap();
    let deadline = Instant::now() + WAIT;
    while bridge.port.failed_writes() == 0 {
        assert!(Instant::now() < deadline, "write was never attempted");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bridge.port.set_fail_writes(false);
    client.send(Message::Text("kept".into())).await.unwrap();

    // Assert: same session, later frame delivered, serial data still flows
    bridge.wait_for_serial(b"kept").await;
    assert_eq!(bridge.port.failed_writes(), 1);
    bridge.port.push_read(b"still here");
    receive_text(&mut client, "still here").await;

    bridge.stop().await;
}

/// A client that disappears without a close frame is detached from the hub
/// but stays in the registry.  Sends to it are refused and the pump goes on.
#[tokio::test(flavor = "multi_thread")]
async fn test_abruptly_dropped_client_leaves_stale_id_and_pump_running() {
    // Arrange
    let bridge = Bridge::start().await;
    let mut client = bridge.connect().await;
    client.send(Message::Text("hi".into())).await.unwrap();
    bridge.wait_for_serial(b"hi").await;
    let stale = bridge.registry.get().expect("client registered");

    // Act: drop the TCP connection without closing the WebSocket
    drop(client);
    bridge.wait_for_detach(stale).await;
    bridge.port.push_read(b"into the void");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Assert
    assert_eq!(bridge.registry.get(), Some(stale));
    assert_eq!(
        bridge.hub.try_send_text(stale, "x".to_string()),
        Err(SendError::NoSuchConnection(stale))
    );

    // The pump survived: a new client receives fresh serial data.
    let mut next = bridge.connect().await;
    next.send(Message::Text("x".into())).await.unwrap();
    bridge.wait_for_serial(b"hix").await;
    bridge.port.push_read(b"fresh");
    receive_text(&mut next, "fresh").await;

    bridge.stop().await;
}
