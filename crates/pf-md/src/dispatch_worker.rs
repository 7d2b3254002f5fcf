//! Dispatch worker that runs on a dedicated blocking thread.
//!
//! Receives normalized records from a crossbeam channel and hands each to the
//! callback registered for its channel, in arrival order.

use crossbeam_channel::Receiver;
use pf_core::types::MarketRecord;
use tracing::{debug, info};

use crate::pipeline::Callbacks;

/// A record together with the time its frame was received (epoch seconds).
pub type Envelope = (MarketRecord, f64);

/// Run a dispatch loop on the calling thread until every sender is dropped.
///
/// Returns the number of records handed to a callback.
pub fn run_dispatch_loop(label: &str, rx: Receiver<Envelope>, callbacks: &Callbacks) -> u64 {
    let mut dispatched = 0u64;
    let mut unrouted = 0u64;

    info!("[{label}] dispatch loop started");

    while let Ok((record, receipt)) = rx.recv() {
        let channel = record.channel();
        match callbacks.get(&channel) {
            Some(cb) => {
                cb(channel, &record, receipt);
                dispatched += 1;
            }
            None => {
                unrouted += 1;
                debug!("[{label}] no callback for {channel}, dropping {}", record.symbol());
            }
        }
    }

    info!("[{label}] dispatch loop exited ({dispatched} dispatched, {unrouted} unrouted)");
    dispatched
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pf_core::{Channel, Exchange, Quote};
    use rust_decimal::Decimal;

    use super::*;
    use crate::pipeline::RecordCallback;

    fn quote(symbol: &str, ts: f64) -> MarketRecord {
        MarketRecord::Quote(Quote {
            exchange: Exchange::Polygon,
            symbol: symbol.to_string(),
            bid_price: Decimal::ONE,
            bid_size: Decimal::ZERO,
            ask_price: Decimal::TWO,
            ask_size: Decimal::ZERO,
            timestamp: ts,
            raw: serde_json::Value::Null,
        })
    }

    #[test]
    fn dispatches_in_order_to_channel_callback() {
        let seen: Arc<Mutex<Vec<(Channel, String, f64)>>> = Arc::default();
        let sink = seen.clone();
        let cb: RecordCallback = Arc::new(move |ch, rec, receipt| {
            sink.lock().unwrap().push((ch, rec.symbol().to_string(), receipt));
        });
        let callbacks = Callbacks::from([(Channel::L1Book, cb)]);

        let (tx, rx) = crossbeam_channel::bounded(8);
        tx.send((quote("EUR-USD", 1.0), 10.0)).unwrap();
        tx.send((quote("GBP-USD", 2.0), 11.0)).unwrap();
        drop(tx);

        assert_eq!(run_dispatch_loop("test", rx, &callbacks), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (Channel::L1Book, "EUR-USD".to_string(), 10.0),
                (Channel::L1Book, "GBP-USD".to_string(), 11.0),
            ]
        );
    }

    #[test]
    fn records_without_callback_are_skipped() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send((quote("EUR-USD", 1.0), 1.0)).unwrap();
        drop(tx);
        assert_eq!(run_dispatch_loop("test", rx, &Callbacks::new()), 0);
    }
}
