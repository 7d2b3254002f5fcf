//! Shared WebSocket connection helpers for market data modules.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use pf_core::time_util::now_secs;
use pf_core::ws::{OnConnectCallback, OnMessageCallback, WsConnConfig, WsConnection};
use tracing::warn;

use crate::dispatch_worker::Envelope;
use crate::pipeline::TextParser;

/// Parameters for a text-mode WebSocket MD stream.
pub struct TextStreamParams {
    pub url: String,
    pub extra_headers: HashMap<String, String>,
    pub ping_interval: Option<Duration>,
    pub on_connect: OnConnectCallback,
    pub tx: Sender<Envelope>,
    pub parser: TextParser,
    pub label: String,
}

/// Build the per-frame callback: stamp the receipt time, parse, and push
/// every record to the dispatch channel.
pub fn text_forwarder(label: String, parser: TextParser, tx: Sender<Envelope>) -> OnMessageCallback {
    Arc::new(move |_conn_id, text| {
        let receipt = now_secs();
        for record in parser(text) {
            if tx.try_send((record, receipt)).is_err() {
                warn!("[{label}] dispatch channel full or closed");
            }
        }
    })
}

/// Start a text-mode WebSocket connection that parses frames and feeds the
/// dispatch channel. The returned connection runs until stopped.
pub fn spawn_text_stream(params: TextStreamParams) -> WsConnection {
    let TextStreamParams { url, extra_headers, ping_interval, on_connect, tx, parser, label } = params;

    let config = WsConnConfig { url, extra_headers, ping_interval, id: label.clone() };
    let mut conn = WsConnection::new(config);
    conn.start(text_forwarder(label, parser, tx), Some(on_connect));
    conn
}

#[cfg(test)]
mod tests {
    use pf_core::{Exchange, MarketRecord, Quote};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn forwarder_stamps_every_record_of_a_frame() {
        let parser: TextParser = Box::new(|text| {
            text.split(',')
                .map(|s| {
                    MarketRecord::Quote(Quote {
                        exchange: Exchange::Polygon,
                        symbol: s.to_string(),
                        bid_price: Decimal::ONE,
                        bid_size: Decimal::ZERO,
                        ask_price: Decimal::ONE,
                        ask_size: Decimal::ZERO,
                        timestamp: 0.0,
                        raw: serde_json::Value::Null,
                    })
                })
                .collect()
        });
        let (tx, rx) = crossbeam_channel::bounded(4);
        let forward = text_forwarder("test".into(), parser, tx);

        forward("test-0", "EUR-USD,GBP-USD");

        let (a, ta) = rx.try_recv().unwrap();
        let (b, tb) = rx.try_recv().unwrap();
        assert_eq!(a.symbol(), "EUR-USD");
        assert_eq!(b.symbol(), "GBP-USD");
        assert_eq!(ta, tb);
        assert!(ta > 0.0);
    }

    #[test]
    fn empty_frame_forwards_nothing() {
        let parser: TextParser = Box::new(|_| Vec::new());
        let (tx, rx) = crossbeam_channel::bounded(1);
        let forward = text_forwarder("test".into(), parser, tx);
        forward("test-0", "ignored");
        assert!(rx.try_recv().is_err());
    }
}
