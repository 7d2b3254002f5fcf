//! # pf-core
//!
//! Core crate for the Polygon FX feed, providing:
//!
//! - **Types** (`types`): enums, symbol value type, normalized quote/candle records
//! - **Configuration** (`config`): JSON config deserialization
//! - **Error types** (`error`): hard `FeedError` and soft `EventError` via thiserror
//! - **WebSocket** (`ws`): WS client with auto-reconnect and the `ConnectionHandle` trait
//! - **Time utilities** (`time_util`): epoch-millisecond to seconds conversion
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod time_util;
pub mod types;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
