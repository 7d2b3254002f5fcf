//! Single WebSocket connection with auto-reconnect and ping keep-alive.
//!
//! Each `WsConnection` runs as a tokio task that:
//! 1. Connects to the venue WebSocket endpoint (TLS).
//! 2. Runs the on-connect hook with a fresh [`WsWriter`] for this session
//!    (authenticate, then subscribe).
//! 3. Reads messages and forwards them to a callback, one at a time.
//! 4. Sends periodic WebSocket pings.
//! 5. Automatically reconnects on disconnection with exponential backoff.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::ConnectionHandle;
use crate::error::FeedError;

/// Callback invoked for each received text message.
///
/// Parameters: `(connection_id, message_text)`
pub type OnMessageCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Hook run after every successful (re)connect.
///
/// The writer is only valid for the session it was handed out for; frames
/// written after a disconnect fail with [`FeedError::Transport`].
pub type OnConnectCallback = Arc<dyn Fn(WsWriter) -> BoxFuture<'static, Result<(), FeedError>> + Send + Sync>;

/// Configuration for a single WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsConnConfig {
    /// Full WebSocket URL (e.g. `wss://socket.polygon.io/forex`).
    pub url: String,
    /// Extra HTTP headers for the handshake.
    pub extra_headers: HashMap<String, String>,
    /// Interval between WebSocket ping frames.
    pub ping_interval: Option<Duration>,
    /// Connection identifier used in logs (e.g. `polygon_md-0`).
    pub id: String,
}

// ---------------------------------------------------------------------------
// WsWriter: per-session write handle
// ---------------------------------------------------------------------------

/// Write half of one connection session.
///
/// Frames are queued on an mpsc channel drained by the connection task, so
/// they go out in the order they were written.
#[derive(Debug, Clone)]
pub struct WsWriter {
    id: Arc<str>,
    tx: mpsc::Sender<String>,
}

impl WsWriter {
    pub fn new(id: &str, tx: mpsc::Sender<String>) -> Self {
        Self { id: Arc::from(id), tx }
    }
}

#[async_trait]
impl ConnectionHandle for WsWriter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn write(&self, frame: String) -> Result<(), FeedError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| FeedError::Transport(format!("[{}] connection session closed", self.id)))
    }
}

// ---------------------------------------------------------------------------
// WsConnection
// ---------------------------------------------------------------------------

/// A single WebSocket connection managed by a background tokio task.
pub struct WsConnection {
    /// Connection configuration.
    pub config: WsConnConfig,
    /// Shutdown signal sender.
    shutdown_tx: Option<watch::Sender<bool>>,
    /// Task join handle.
    task: Option<tokio::task::JoinHandle<()>>,
}

impl WsConnection {
    /// Create a new (not yet started) connection.
    pub fn new(config: WsConnConfig) -> Self {
        Self { config, shutdown_tx: None, task: None }
    }

    /// Start the connection task.
    ///
    /// Text frames are forwarded to `on_text`; `on_connect` runs once per
    /// established session.
    pub fn start(&mut self, on_text: OnMessageCallback, on_connect: Option<OnConnectCallback>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            connection_loop(config, on_text, on_connect, shutdown_rx).await;
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Stop the connection and wait for the task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Main connection loop: connects, runs the hook, reads, pings, reconnects.
async fn connection_loop(
    config: WsConnConfig,
    on_text: OnMessageCallback,
    on_connect: Option<OnConnectCallback>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(30);
    let conn_id = config.id.as_str();

    loop {
        if *shutdown_rx.borrow() {
            info!("[{conn_id}] shutdown requested");
            return;
        }

        info!("[{conn_id}] connecting to {}", config.url);

        let ws_stream = match connect_ws(&config).await {
            Ok(s) => {
                backoff = Duration::from_millis(100);
                info!("[{conn_id}] connected");
                s
            }
            Err(e) => {
                error!("[{conn_id}] connection failed: {e}, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {},
                    _ = shutdown_rx.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        // Fresh outbound queue per session so frames from a dead session are
        // never replayed ahead of the next session's auth frame.
        let (session_tx, mut session_rx) = mpsc::channel::<String>(64);
        if let Some(ref hook) = on_connect {
            let fut = hook(WsWriter::new(conn_id, session_tx));
            let hook_id = conn_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = fut.await {
                    error!("[{hook_id}] on-connect hook failed: {e}");
                }
            });
        } else {
            drop(session_tx);
        }

        let ping_interval = config.ping_interval;
        tokio::pin! {
            let ping_tick = async {
                if let Some(d) = ping_interval {
                    let mut interval = tokio::time::interval(d);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                    }
                } else {
                    std::future::pending::<()>().await
                }
            };
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("[{conn_id}] shutdown signal received");
                    let _ = ws_write.close().await;
                    return;
                }

                msg = ws_read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            on_text(conn_id, &text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("[{conn_id}] received close frame");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("[{conn_id}] read error: {e}");
                            break;
                        }
                        None => {
                            warn!("[{conn_id}] stream ended");
                            break;
                        }
                        _ => {} // Binary, Pong, Frame: ignore
                    }
                }

                Some(frame) = session_rx.recv() => {
                    debug!("[{conn_id}] sending: {frame}");
                    if let Err(e) = ws_write.send(Message::Text(frame.into())).await {
                        error!("[{conn_id}] send error: {e}");
                        break;
                    }
                }

                _ = &mut ping_tick => {
                    if let Err(e) = ws_write.send(Message::Ping(vec![].into())).await {
                        error!("[{conn_id}] ping send error: {e}");
                        break;
                    }
                }
            }
        }

        warn!("[{conn_id}] disconnected, reconnecting in {backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {},
            _ = shutdown_rx.changed() => return,
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

/// Establish a TLS WebSocket connection.
async fn connect_ws(
    config: &WsConnConfig,
) -> Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    FeedError,
> {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| FeedError::WebSocket(format!("bad url {}: {e}", config.url)))?;

    for (key, value) in &config.extra_headers {
        let name = tokio_tungstenite::tungstenite::http::HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| FeedError::WebSocket(format!("bad header name {key}: {e}")))?;
        let value = value
            .parse()
            .map_err(|e| FeedError::WebSocket(format!("bad header value for {key}: {e}")))?;
        request.headers_mut().insert(name, value);
    }

    debug!("[{}] handshake host={}", config.id, extract_host(&config.url));

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| FeedError::WebSocket(e.to_string()))?;
    Ok(stream)
}

/// Extract the host from a URL string.
fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("").to_string())
        .unwrap_or_default()
}
