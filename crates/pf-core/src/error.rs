//! Typed error definitions for the feed.
//!
//! Two channels are kept apart:
//!
//! - [`FeedError`]: hard failures surfaced to whoever called the operation
//!   (bad config, transport failure, unsupported symbol).
//! - [`EventError`]: soft, per-event failures in the streaming path. They are
//!   logged and the event is dropped; the stream carries on.
//!
//! All variants implement `std::error::Error` via `thiserror`, so they
//! integrate with `anyhow::Result`.

use thiserror::Error;

/// Hard errors for the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Outbound send failed (REST or WebSocket).
    #[error("transport error: {0}")]
    Transport(String),

    /// WebSocket connection or handshake error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// A requested symbol is not listed in the venue's catalog.
    #[error("{exchange}: symbol {symbol} is not supported")]
    UnsupportedSymbol { exchange: String, symbol: String },

    /// A requested candle interval is not offered by the venue.
    #[error("{exchange}: candle interval {interval} is not supported")]
    UnsupportedInterval { exchange: String, interval: String },
}

/// Soft errors raised while normalizing a single inbound event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// The event has a known kind but does not have the expected shape.
    #[error("malformed {kind} event: {reason}: {raw}")]
    Malformed { kind: &'static str, reason: String, raw: String },

    /// The discriminator is not one of the known kinds.
    #[error("unrecognized event type {ev:?}: {raw}")]
    Unrecognized { ev: String, raw: String },

    /// The vendor symbol is not present in the active catalog.
    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },
}

impl EventError {
    pub fn malformed(kind: &'static str, reason: impl Into<String>, raw: &serde_json::Value) -> Self {
        Self::Malformed { kind, reason: reason.into(), raw: raw.to_string() }
    }
}
