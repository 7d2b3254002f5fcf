//! Polygon WebSocket message classifier.
//!
//! A frame is a JSON array of events, each tagged by `ev`:
//!
//! - `status` → connection/auth/subscription lifecycle, logged only
//! - `C`      → [`Quote`](pf_core::Quote)
//! - `CA`     → [`Candle`](pf_core::Candle)
//!
//! Every event is handled on its own. An event that cannot be normalized is
//! logged at warn level with its body and dropped; the rest of the frame is
//! still processed. Nothing in here returns a hard error.

use std::sync::Arc;

use pf_core::error::EventError;
use pf_core::{Exchange, MarketRecord};
use tracing::{info, warn};

use super::normalize::{normalize_candle, normalize_quote};
use crate::catalog::{CatalogStore, SymbolCatalog};

/// Event kind decoded from the `ev` discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Status,
    Quote,
    Candle,
    Unrecognized(String),
}

impl EventKind {
    pub fn from_ev(ev: &str) -> Self {
        match ev {
            "status" => Self::Status,
            "C" => Self::Quote,
            "CA" => Self::Candle,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// Interpretation of a `status` event.
///
/// The venue sends them in the order connected → auth_success → success, but
/// nothing here depends on that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Connected,
    Authenticated,
    /// Subscription accepted; carries the venue's message (e.g. `C.EUR/USD`).
    Subscribed(String),
    /// Any other status, e.g. a rejected auth or subscribe request.
    Failed { status: String, message: String },
}

impl StatusKind {
    fn from_event(ev: &serde_json::Value) -> Self {
        let status = ev.get("status").and_then(|s| s.as_str()).unwrap_or_default();
        let message = ev.get("message").and_then(|m| m.as_str()).unwrap_or_default().to_string();
        match status {
            "connected" => Self::Connected,
            "auth_success" => Self::Authenticated,
            "success" => Self::Subscribed(message),
            other => Self::Failed { status: other.to_string(), message },
        }
    }
}

/// What one event turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Record(MarketRecord),
    Status(StatusKind),
}

/// Everything produced from one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameOutcome {
    pub records: Vec<MarketRecord>,
    pub statuses: Vec<StatusKind>,
    pub dropped: Vec<EventError>,
}

/// Classifies frames and normalizes their events.
///
/// Symbols are resolved against whatever catalog the store holds when the
/// frame arrives, so a refresh is picked up by running streams.
pub struct MessageClassifier {
    label: String,
    store: Arc<dyn CatalogStore>,
    interval: String,
}

impl MessageClassifier {
    pub fn new(label: impl Into<String>, store: Arc<dyn CatalogStore>, interval: impl Into<String>) -> Self {
        Self { label: label.into(), store, interval: interval.into() }
    }

    /// Classify a raw text frame.
    pub fn classify(&self, text: &str) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        let events = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Array(events)) => events,
            Ok(obj @ serde_json::Value::Object(_)) => vec![obj],
            Ok(other) => {
                self.drop_event(&mut outcome, EventError::malformed("frame", "not an array or object", &other));
                return outcome;
            }
            Err(e) => {
                let err = EventError::Malformed { kind: "frame", reason: e.to_string(), raw: text.to_string() };
                self.drop_event(&mut outcome, err);
                return outcome;
            }
        };

        let catalog = self.store.get(Exchange::Polygon).unwrap_or_default();
        for ev in &events {
            match self.classify_event(ev, &catalog) {
                Ok(Classified::Record(rec)) => outcome.records.push(rec),
                Ok(Classified::Status(status)) => {
                    self.log_status(&status);
                    outcome.statuses.push(status);
                }
                Err(e) => self.drop_event(&mut outcome, e),
            }
        }
        outcome
    }

    /// Classify and normalize a single event.
    pub fn classify_event(&self, ev: &serde_json::Value, catalog: &SymbolCatalog) -> Result<Classified, EventError> {
        let Some(tag) = ev.get("ev").and_then(|t| t.as_str()) else {
            return Err(EventError::malformed("event", "missing ev", ev));
        };

        match EventKind::from_ev(tag) {
            EventKind::Status => Ok(Classified::Status(StatusKind::from_event(ev))),
            EventKind::Quote => normalize_quote(ev, catalog).map(|q| Classified::Record(MarketRecord::Quote(q))),
            EventKind::Candle => normalize_candle(ev, catalog, &self.interval)
                .map(|c| Classified::Record(MarketRecord::Candle(c))),
            EventKind::Unrecognized(tag) => Err(EventError::Unrecognized { ev: tag, raw: ev.to_string() }),
        }
    }

    fn log_status(&self, status: &StatusKind) {
        let label = &self.label;
        match status {
            StatusKind::Connected => info!("[{label}] connected"),
            StatusKind::Authenticated => info!("[{label}] authenticated"),
            StatusKind::Subscribed(sub) => info!("[{label}] subscribed to {sub}"),
            StatusKind::Failed { status, message } => warn!("[{label}] status {status}: {message}"),
        }
    }

    fn drop_event(&self, outcome: &mut FrameOutcome, err: EventError) {
        warn!("[{}] dropping event: {err}", self.label);
        outcome.dropped.push(err);
    }
}
