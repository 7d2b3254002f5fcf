//! Enumerations used throughout the feed.
//!
//! These identify the venue, the instrument category and the logical
//! channels a consumer can subscribe to.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Exchange identifiers
// ---------------------------------------------------------------------------

/// Supported venues.
///
/// Also the key of the process-wide catalog store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Polygon,
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polygon => write!(f, "POLYGON"),
        }
    }
}

// ---------------------------------------------------------------------------
// Instrument types
// ---------------------------------------------------------------------------

/// Instrument category recorded per symbol in the catalog.
///
/// Forex pairs from the reference-data crawl are all `Spot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    #[default]
    Spot,
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Logical data channel. Callbacks are keyed by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Top-of-book quotes.
    L1Book,
    /// Fixed-interval OHLCV candles.
    Candles,
}

impl Channel {
    /// All channels, in subscription order.
    pub const ALL: [Channel; 2] = [Channel::L1Book, Channel::Candles];

    /// Tag passed to callbacks alongside each record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1Book => "l1_book",
            Self::Candles => "candles",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_display_is_upper_case() {
        assert_eq!(Exchange::Polygon.to_string(), "POLYGON");
    }

    #[test]
    fn channel_deserializes_from_snake_case() {
        let ch: Channel = serde_json::from_str("\"l1_book\"").unwrap();
        assert_eq!(ch, Channel::L1Book);
        assert_eq!(Channel::Candles.to_string(), "candles");
    }
}
