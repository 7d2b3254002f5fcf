//! Normalized market data records handed to callbacks.
//!
//! # Timestamp convention
//!
//! All timestamps are **seconds since Unix epoch** as `f64`. The venue sends
//! milliseconds; the fractional part is preserved on conversion.
//!
//! Prices and volumes are [`Decimal`] so no binary floating-point rounding
//! ever touches them.

use rust_decimal::Decimal;
use serde::Serialize;

use super::enums::{Channel, Exchange};

/// Candle interval emitted by this venue.
pub const ONE_MINUTE: &str = "1m";

/// Width of a one-minute candle window in seconds.
pub const ONE_MINUTE_SECS: f64 = 60.0;

// ---------------------------------------------------------------------------
// Quote (best bid / offer)
// ---------------------------------------------------------------------------

/// Top-of-book quote.
///
/// The venue does not report sizes, so `bid_size` and `ask_size` are always
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub exchange: Exchange,
    /// Canonical symbol (`"EUR-USD"`).
    pub symbol: String,
    pub bid_price: Decimal,
    pub bid_size: Decimal,
    pub ask_price: Decimal,
    pub ask_size: Decimal,
    pub timestamp: f64,
    /// The event object exactly as received.
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Candle
// ---------------------------------------------------------------------------

/// Aggregated OHLCV record over a fixed window.
///
/// `trades` is zero and `vwap` is `None` because the venue does not report
/// either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub exchange: Exchange,
    pub symbol: String,
    /// Window start (seconds).
    pub start: f64,
    /// Window end (seconds), `start + 60` for one-minute candles.
    pub stop: f64,
    pub interval: String,
    pub trades: u64,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub vwap: Option<Decimal>,
    /// Whether the window is complete. Aggregates arrive once per closed
    /// window, so this is always `true` here.
    pub closed: bool,
    pub timestamp: f64,
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// MarketRecord: tagged union for channel passing
// ---------------------------------------------------------------------------

/// A tagged union of all normalized record types.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketRecord {
    Quote(Quote),
    Candle(Candle),
}

impl MarketRecord {
    /// The channel this record is delivered on.
    pub fn channel(&self) -> Channel {
        match self {
            Self::Quote(_) => Channel::L1Book,
            Self::Candle(_) => Channel::Candles,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Quote(q) => &q.symbol,
            Self::Candle(c) => &c.symbol,
        }
    }
}

// ---------------------------------------------------------------------------
// Display impls
// ---------------------------------------------------------------------------

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Quote({} {} bid={} ask={} ts={:.3})",
            self.exchange, self.symbol, self.bid_price, self.ask_price, self.timestamp
        )
    }
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Candle({} {} {} o={} h={} l={} c={} v={} start={:.0})",
            self.exchange,
            self.symbol,
            self.interval,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.start
        )
    }
}

impl std::fmt::Display for MarketRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quote(q) => q.fmt(f),
            Self::Candle(c) => c.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn quote() -> Quote {
        Quote {
            exchange: Exchange::Polygon,
            symbol: "EUR-USD".into(),
            bid_price: dec!(1.1),
            bid_size: Decimal::ZERO,
            ask_price: dec!(1.1002),
            ask_size: Decimal::ZERO,
            timestamp: 1_610_000_000.0,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn record_channel_routing() {
        let rec = MarketRecord::Quote(quote());
        assert_eq!(rec.channel(), Channel::L1Book);
        assert_eq!(rec.symbol(), "EUR-USD");
    }

    #[test]
    fn quote_display_keeps_decimal_digits() {
        let text = quote().to_string();
        assert!(text.contains("bid=1.1 "));
        assert!(text.contains("ask=1.1002"));
    }
}
