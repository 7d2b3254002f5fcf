//! Polygon-specific configuration extraction.
//!
//! Converts the generic [`ConnectionConfig`] into an immutable
//! [`PolygonConfig`] with production defaults for every endpoint and
//! template. Built once at startup and passed around by reference.

use std::collections::{BTreeMap, HashMap};

use pf_core::config::ConnectionConfig;
use pf_core::error::FeedError;
use pf_core::{Channel, Exchange, ONE_MINUTE};

/// Default REST base URL.
pub const DEFAULT_REST_URL: &str = "https://api.polygon.io";

/// Default forex WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://socket.polygon.io/forex";

/// Reference-data route; `market=fx` restricts the crawl to currency pairs.
pub const TICKERS_ROUTE: &str = "/v3/reference/tickers?market=fx";

/// Candle intervals the venue streams.
pub const VALID_CANDLE_INTERVALS: &[&str] = &[ONE_MINUTE];

/// Parsed Polygon configuration.
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    /// Module name used as the log label.
    pub name: String,
    /// Opaque API key. Sent as `apiKey` on REST and in the auth frame.
    pub api_key: String,
    /// Whether an auth frame must precede subscriptions.
    pub requires_auth: bool,
    /// REST base URL (e.g. `https://api.polygon.io`).
    pub rest_url: String,
    /// WebSocket URL.
    pub ws_url: String,
    /// Records per reference-data page.
    pub page_limit: u32,
    /// Abort the crawl after this many pages.
    pub max_pages: u32,
    /// Force a fresh crawl even when a catalog is cached.
    pub refresh_symbols: bool,
    /// Requested candle interval.
    pub candle_interval: String,
    /// Requested canonical symbols per channel.
    pub subscriptions: BTreeMap<Channel, Vec<String>>,
    /// Wire template per channel; `{}` is replaced by the wire symbol.
    pub channel_templates: BTreeMap<Channel, String>,
    /// Max symbols per WebSocket connection (`None` = single connection).
    pub symbols_per_connection: Option<usize>,
    /// Ping interval in seconds (default: 30).
    pub ping_interval_sec: u64,
    /// Extra HTTP headers for the WebSocket handshake.
    pub extra_headers: HashMap<String, String>,
}

impl PolygonConfig {
    pub const EXCHANGE: Exchange = Exchange::Polygon;

    /// Extract and validate Polygon config from a [`ConnectionConfig`].
    pub fn from_connection(conn: &ConnectionConfig) -> Result<Self, FeedError> {
        let mut subscriptions = BTreeMap::new();
        if let Some(ref syms) = conn.l1_book {
            subscriptions.insert(Channel::L1Book, normalize_symbols(syms));
        }
        if let Some(ref syms) = conn.candles {
            subscriptions.insert(Channel::Candles, normalize_symbols(syms));
        }
        subscriptions.retain(|_, syms: &mut Vec<String>| !syms.is_empty());

        let cfg = Self {
            name: conn.module_name(),
            api_key: conn.api_key.clone().unwrap_or_default(),
            requires_auth: conn.requires_auth.unwrap_or(true),
            rest_url: conn
                .rest_url
                .clone()
                .unwrap_or_else(|| DEFAULT_REST_URL.into())
                .trim_end_matches('/')
                .to_string(),
            ws_url: conn.ws_url.clone().unwrap_or_else(|| DEFAULT_WS_URL.into()),
            page_limit: conn.page_limit.unwrap_or(1000),
            max_pages: conn.max_pages.unwrap_or(1000),
            refresh_symbols: conn.refresh_symbols.unwrap_or(false),
            candle_interval: conn.candle_interval.clone().unwrap_or_else(|| ONE_MINUTE.into()),
            subscriptions,
            channel_templates: default_channel_templates(),
            symbols_per_connection: conn.symbols_per_connection,
            ping_interval_sec: conn.ping_interval_sec.unwrap_or(30),
            extra_headers: conn.extra_headers.clone().unwrap_or_default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the feed cannot run with.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.requires_auth && self.api_key.trim().is_empty() {
            return Err(FeedError::Config(format!("{}: api_key is required", self.name)));
        }
        if !VALID_CANDLE_INTERVALS.contains(&self.candle_interval.as_str()) {
            return Err(FeedError::UnsupportedInterval {
                exchange: Self::EXCHANGE.to_string(),
                interval: self.candle_interval.clone(),
            });
        }
        if self.symbols_per_connection == Some(0) {
            return Err(FeedError::Config(format!("{}: symbols_per_connection must be > 0", self.name)));
        }
        if self.page_limit == 0 || self.max_pages == 0 {
            return Err(FeedError::Config(format!("{}: page_limit and max_pages must be > 0", self.name)));
        }
        if self.subscriptions.is_empty() {
            return Err(FeedError::Config(format!("{}: no channels requested", self.name)));
        }
        Ok(())
    }

    /// URL of the first reference-data page.
    pub fn tickers_url(&self) -> String {
        format!("{}{TICKERS_ROUTE}&limit={}", self.rest_url, self.page_limit)
    }
}

/// `C.{}` for quotes, `CA.{}` for minute aggregates.
pub fn default_channel_templates() -> BTreeMap<Channel, String> {
    BTreeMap::from([(Channel::L1Book, "C.{}".to_string()), (Channel::Candles, "CA.{}".to_string())])
}

/// Upper-case, trim and de-duplicate while keeping first-seen order.
fn normalize_symbols(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.trim().to_uppercase();
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    out
}
