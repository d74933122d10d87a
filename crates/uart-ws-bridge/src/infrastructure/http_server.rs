//! HTTP server: the chat page and the WebSocket endpoint.
//!
//! Routes:
//!
//! - `GET /chat` → 200, `Content-Type: text/html`, the chat page bytes.
//! - `GET /ws`   → WebSocket upgrade, subprotocol `chat`.
//!
//! # WebSocket sessions
//!
//! Each accepted WebSocket becomes a session with a fresh [`ConnectionId`]:
//!
//! 1. The session attaches an outbound queue to the [`ClientHub`] and hands
//!    [`InboundEvent::Connected`] to the inbound handler, which makes it the
//!    bridge pump's target.
//! 2. A writer task drains the queue into the socket as text frames.
//! 3. The session loop turns every incoming text or binary frame into an
//!    [`InboundEvent::Frame`] for the handler.  Serial writes block, so the
//!    handler runs on the blocking pool.
//! 4. A receive failure ends the session.  A failed serial write is logged
//!    and the session carries on.
//!
//! Ping and pong frames are left to the WebSocket implementation.
//!
//! # Shutdown
//!
//! The server stops accepting once the shared `running` flag is cleared.
//! The flag is polled every 200 ms.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use uart_bridge_core::{
    BridgeError, ConnectionId, ConnectionIdAllocator, InboundEvent, InboundFrameHandler,
    SerialWriter,
};

use crate::domain::{BridgeConfig, CHAT_ROUTE, WS_ROUTE, WS_SUBPROTOCOL};
use crate::infrastructure::client_hub::ClientHub;
use crate::infrastructure::static_page::StaticPage;

/// How often the shutdown watcher checks the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// The inbound handler as the server holds it: any serial write half.
pub type SharedHandler = Arc<InboundFrameHandler<Box<dyn SerialWriter>>>;

/// Everything the route handlers need.
pub struct AppState {
    pub handler: SharedHandler,
    pub hub: Arc<ClientHub>,
    pub chat_page: StaticPage,
    ids: ConnectionIdAllocator,
}

impl AppState {
    pub fn new(handler: SharedHandler, hub: Arc<ClientHub>, chat_page: StaticPage) -> Self {
        Self {
            handler,
            hub,
            chat_page,
            ids: ConnectionIdAllocator::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Builds the router with both routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(CHAT_ROUTE, get(chat_page))
        .route(WS_ROUTE, get(ws_upgrade))
        .with_state(state)
}

/// Binds `config.http_bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run_server(
    config: &BridgeConfig,
    state: SharedState,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.http_bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_bind_addr))?;

    info!(
        "HTTP server listening on {} (page {CHAT_ROUTE}, websocket {WS_ROUTE})",
        config.http_bind_addr
    );

    serve(listener, state, running).await
}

/// Serves on an already bound listener until `running` is cleared.
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown(running))
        .await
        .context("HTTP server failed")
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(SHUTDOWN_POLL);
    while running.load(Ordering::Relaxed) {
        ticker.tick().await;
    }
    info!("shutdown flag set; HTTP server no longer accepting connections");
}

// ── Route handlers ────────────────────────────────────────────────────────────

async fn chat_page(State(state): State<SharedState>) -> Response {
    (
        [(header::CONTENT_TYPE, state.chat_page.content_type())],
        state.chat_page.body(),
    )
        .into_response()
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.protocols([WS_SUBPROTOCOL])
        .on_upgrade(move |socket| handle_client(socket, state))
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_client(socket: WebSocket, state: SharedState) {
    let id = state.ids.next();
    let mut outbound = state.hub.attach(id);
    state.handler.on_connect(id);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Serial → client: drain the hub queue into the socket.
    let writer_task = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if ws_tx.send(Message::Text(text)).await.is_err() {
                debug!("{id}: websocket send failed (client gone)");
                break;
            }
        }
    });

    // Client → serial.
    loop {
        let event = match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => InboundEvent::Frame(text.into()),
            Some(Ok(Message::Binary(bytes))) => InboundEvent::Frame(bytes.into()),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => {
                debug!("{id}: websocket closed by client");
                break;
            }
            Some(Err(e)) => InboundEvent::ReceiveFailed(e.into()),
        };

        if !dispatch(&state.handler, id, event).await {
            break;
        }
    }

    state.hub.detach(id);
    writer_task.abort();
    info!("websocket client {id} disconnected");
}

/// Runs one event through the handler.  Returns `false` when the session
/// should end.
async fn dispatch(handler: &SharedHandler, id: ConnectionId, event: InboundEvent) -> bool {
    let handler = Arc::clone(handler);
    match tokio::task::spawn_blocking(move || handler.handle(event)).await {
        Ok(Ok(_)) => true,
        Ok(Err(BridgeError::Receive(_))) => false,
        Ok(Err(e)) => {
            warn!("{id}: {e}");
            true
        }
        Err(e) => {
            error!("{id}: inbound handler task failed: {e}");
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
