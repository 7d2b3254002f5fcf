//! WebSocket client with auto-reconnect, and the write-handle abstraction the
//! venue protocol code talks to.

pub mod client;

use async_trait::async_trait;

use crate::error::FeedError;

pub use client::{OnConnectCallback, OnMessageCallback, WsConnConfig, WsConnection, WsWriter};

/// A write-capable connection owned by the feed layer.
///
/// Protocol code only ever writes frames through this; it never opens,
/// closes or times out the underlying connection.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Diagnostic identifier used in log lines.
    fn id(&self) -> &str;

    /// Queue one text frame for sending.
    async fn write(&self, frame: String) -> Result<(), FeedError>;
}
