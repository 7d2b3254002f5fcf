//! Configuration parsing.
//!
//! The runner reads its settings from a single JSON config file. The top-level
//! structure contains logging metadata and a `connections` array where each
//! entry describes one feed instance.
//!
//! # Example config
//!
//! ```json
//! {
//!   "module": { "module_name": "polygon_md", "log_path": "/tmp/log" },
//!   "connections": [{
//!     "exchange": "polygon",
//!     "api_key": "…",
//!     "l1_book": ["EUR-USD", "GBP-USD"],
//!     "candles": ["EUR-USD"],
//!     "candle_interval": "1m",
//!     "symbols_per_connection": 100
//!   }]
//! }
//! ```
//!
//! Venue-specific defaults and validation live next to the venue module
//! (see `pf_md::polygon::config`).

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Module metadata (name, log path).
    pub module: Option<ModuleMeta>,

    /// One entry per feed instance.
    pub connections: Vec<ConnectionConfig>,
}

/// Module metadata block.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleMeta {
    pub module_name: Option<String>,
    pub log_path: Option<String>,
}

/// A single feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Module metadata override (per-connection).
    pub module: Option<ModuleMeta>,

    /// Exchange identifier, currently only `"polygon"`.
    pub exchange: String,

    /// Opaque credential forwarded to REST and the WebSocket auth frame.
    pub api_key: Option<String>,

    /// REST base URL override.
    pub rest_url: Option<String>,

    /// WebSocket URL override.
    pub ws_url: Option<String>,

    /// Page size for the reference-data crawl.
    pub page_limit: Option<u32>,

    /// Upper bound on pages followed in one crawl.
    pub max_pages: Option<u32>,

    /// Force a fresh reference-data crawl even if a catalog is cached.
    pub refresh_symbols: Option<bool>,

    /// Whether the venue expects an auth frame before subscribing.
    pub requires_auth: Option<bool>,

    /// Candle interval (the venue only offers `"1m"`).
    pub candle_interval: Option<String>,

    /// Canonical symbols for the top-of-book channel.
    pub l1_book: Option<Vec<String>>,

    /// Canonical symbols for the candle channel.
    pub candles: Option<Vec<String>>,

    /// Shard symbols across connections of at most this many symbols.
    pub symbols_per_connection: Option<usize>,

    /// Ping interval in seconds (WebSocket-level keep-alive).
    pub ping_interval_sec: Option<u64>,

    /// Extra HTTP headers for the WebSocket handshake.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ConnectionConfig {
    /// Returns the module name from the per-connection config, falling back
    /// to `<exchange>_md`.
    pub fn module_name(&self) -> String {
        self.module
            .as_ref()
            .and_then(|m| m.module_name.clone())
            .unwrap_or_else(|| format!("{}_md", self.exchange.to_lowercase()))
    }

    /// Returns the log path.
    pub fn log_path(&self) -> Option<String> {
        self.module.as_ref().and_then(|m| m.log_path.clone())
    }
}

/// Parse a JSON config string.
pub fn parse_config(content: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
