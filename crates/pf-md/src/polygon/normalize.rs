//! Field mapping from Polygon events to normalized records.
//!
//! ```text
//! quote  {"ev":"C","p":"EUR/USD","x":48,"a":1.1002,"b":1.1,"t":1610000000000}
//! candle {"ev":"CA","pair":"USD/EUR","o":0.8687,"c":0.86889,"h":0.86889,
//!         "l":0.8686,"v":20,"s":1539145740000}
//! ```

use pf_core::error::EventError;
use pf_core::time_util::ms_to_secs;
use pf_core::{Candle, Exchange, ONE_MINUTE_SECS, Quote};
use rust_decimal::Decimal;

use crate::catalog::SymbolCatalog;
use crate::json_util::{parse_decimal_field, parse_u64, str_field};

const QUOTE: &str = "quote";
const CANDLE: &str = "candle";

/// Map a `C` event to a [`Quote`].
pub fn normalize_quote(ev: &serde_json::Value, catalog: &SymbolCatalog) -> Result<Quote, EventError> {
    let pair = str_field(ev, "p").ok_or_else(|| EventError::malformed(QUOTE, "missing p", ev))?;
    let symbol = canonical(catalog, pair)?;
    let bid_price = decimal(ev, "b", QUOTE)?;
    let ask_price = decimal(ev, "a", QUOTE)?;
    let ts_ms = parse_u64(ev.get("t")).ok_or_else(|| EventError::malformed(QUOTE, "missing or invalid t", ev))?;

    Ok(Quote {
        exchange: Exchange::Polygon,
        symbol,
        bid_price,
        bid_size: Decimal::ZERO,
        ask_price,
        ask_size: Decimal::ZERO,
        timestamp: ms_to_secs(ts_ms),
        raw: ev.clone(),
    })
}

/// Map a `CA` event to a one-minute [`Candle`].
pub fn normalize_candle(
    ev: &serde_json::Value,
    catalog: &SymbolCatalog,
    interval: &str,
) -> Result<Candle, EventError> {
    let pair = str_field(ev, "pair").ok_or_else(|| EventError::malformed(CANDLE, "missing pair", ev))?;
    let symbol = canonical(catalog, pair)?;
    let start_ms = parse_u64(ev.get("s")).ok_or_else(|| EventError::malformed(CANDLE, "missing or invalid s", ev))?;
    let start = ms_to_secs(start_ms);

    Ok(Candle {
        exchange: Exchange::Polygon,
        symbol,
        start,
        stop: start + ONE_MINUTE_SECS,
        interval: interval.to_string(),
        trades: 0,
        open: decimal(ev, "o", CANDLE)?,
        close: decimal(ev, "c", CANDLE)?,
        high: decimal(ev, "h", CANDLE)?,
        low: decimal(ev, "l", CANDLE)?,
        volume: decimal(ev, "v", CANDLE)?,
        vwap: None,
        closed: true,
        timestamp: start,
        raw: ev.clone(),
    })
}

fn canonical(catalog: &SymbolCatalog, pair: &str) -> Result<String, EventError> {
    catalog
        .to_canonical(pair)
        .map(str::to_string)
        .ok_or_else(|| EventError::UnknownSymbol { symbol: pair.to_string() })
}

fn decimal(ev: &serde_json::Value, key: &str, kind: &'static str) -> Result<Decimal, EventError> {
    parse_decimal_field(ev, key).ok_or_else(|| EventError::malformed(kind, format!("missing or invalid {key}"), ev))
}
