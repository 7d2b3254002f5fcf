//! Generic market data pipeline engine.
//!
//! Provides [`GenericMd`], a data-driven implementation of [`MdModule`]. A
//! venue only describes its streams as a `Vec<StreamDef>`; the engine wires
//! the dispatch channel, the dispatch worker and one WebSocket connection per
//! stream.
//!
//! # Architecture
//!
//! ```text
//! StreamDef ──► GenericMd.start() ──► [WS connection ─► channel ─► dispatch worker] per stream
//!          ──► GenericMd.stop()  ──► stop connections, drain and join workers
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use pf_core::types::{Channel, MarketRecord};
use pf_core::ws::{OnConnectCallback, WsConnection};
use tracing::{info, warn};

use crate::dispatch_worker::{self, Envelope};
use crate::ws_helper::{self, TextStreamParams};

// ---------------------------------------------------------------------------
// StreamDef: describes one WS-to-callback pipeline
// ---------------------------------------------------------------------------

/// A text message parser: `raw_json -> Vec<MarketRecord>`.
pub type TextParser = Box<dyn Fn(&str) -> Vec<MarketRecord> + Send + Sync>;

/// Downstream sink for one channel: `(channel, record, receipt_timestamp)`.
pub type RecordCallback = Arc<dyn Fn(Channel, &MarketRecord, f64) + Send + Sync>;

/// Callbacks keyed by channel. Records on a channel without a callback are
/// discarded by the dispatch worker.
pub type Callbacks = HashMap<Channel, RecordCallback>;

/// Capacity of each stream's dispatch channel.
pub const DISPATCH_CAPACITY: usize = 8192;

/// Everything needed to set up one WS-to-callback pipeline.
pub struct StreamDef {
    /// Human-readable label, also used as the connection id (e.g. `"polygon_md-0"`).
    pub label: String,
    /// WebSocket URL.
    pub ws_url: String,
    /// WebSocket ping interval.
    pub ping_interval: Option<Duration>,
    /// Extra HTTP headers for the WS handshake.
    pub extra_headers: HashMap<String, String>,
    /// Canonical symbols this stream is subscribed to, per channel.
    pub subscriptions: BTreeMap<Channel, Vec<String>>,
    /// Run after every (re)connect; authenticates and subscribes.
    pub on_connect: OnConnectCallback,
    /// Frame parser.
    pub text_parser: TextParser,
}

// ---------------------------------------------------------------------------
// GenericMd: the engine
// ---------------------------------------------------------------------------

/// Generic market data module driven by [`StreamDef`] descriptors.
pub struct GenericMd {
    name: String,
    streams: Vec<StreamDef>,
    callbacks: Arc<Callbacks>,
    connections: Vec<WsConnection>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl GenericMd {
    pub fn new(name: String, streams: Vec<StreamDef>, callbacks: Callbacks) -> Self {
        Self {
            name,
            streams,
            callbacks: Arc::new(callbacks),
            connections: Vec::new(),
            workers: Vec::new(),
        }
    }
}

#[async_trait]
impl crate::MdModule for GenericMd {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<()> {
        for stream in self.streams.drain(..) {
            let StreamDef { label, ws_url, ping_interval, extra_headers, subscriptions, on_connect, text_parser } =
                stream;

            let symbols: usize = subscriptions.values().map(Vec::len).sum();
            info!("[{label}] starting stream ({symbols} subscriptions)");

            let (tx, rx) = crossbeam_channel::bounded::<Envelope>(DISPATCH_CAPACITY);

            let callbacks = self.callbacks.clone();
            let worker_label = label.clone();
            self.workers.push(tokio::task::spawn_blocking(move || {
                dispatch_worker::run_dispatch_loop(&worker_label, rx, &callbacks);
            }));

            self.connections.push(ws_helper::spawn_text_stream(TextStreamParams {
                url: ws_url,
                extra_headers,
                ping_interval,
                on_connect,
                tx,
                parser: text_parser,
                label,
            }));
        }

        info!("[{}] started {} stream(s)", self.name, self.connections.len());
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        // Stopping a connection drops its sender, which ends its worker.
        for mut conn in self.connections.drain(..) {
            conn.stop().await;
        }
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!("[{}] dispatch worker ended abnormally: {e}", self.name);
            }
        }
        info!("[{}] stopped", self.name);
        Ok(())
    }
}
