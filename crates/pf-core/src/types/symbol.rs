//! Canonical symbol value type.
//!
//! A [`Symbol`] is built from the base/quote currency codes the venue reports
//! and carries the derived canonical form (`"EUR-USD"`). The venue's wire
//! syntax uses a slash instead (`"EUR/USD"`); [`to_wire`] converts a
//! canonical string without needing a catalog.

use serde::Serialize;

use super::enums::InstrumentType;

/// Separator used by canonical symbols.
pub const CANONICAL_SEP: char = '-';

/// Separator used by the venue's WebSocket symbols.
pub const WIRE_SEP: char = '/';

/// An immutable instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Symbol {
    base: String,
    quote: String,
    canonical: String,
    instrument_type: InstrumentType,
}

impl Symbol {
    /// Create a spot symbol from base and quote currency codes.
    pub fn new(base: &str, quote: &str) -> Self {
        let base = base.trim().to_uppercase();
        let quote = quote.trim().to_uppercase();
        let canonical = format!("{base}{CANONICAL_SEP}{quote}");
        Self { base, quote, canonical, instrument_type: InstrumentType::Spot }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Canonical form, e.g. `"EUR-USD"`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument_type
    }

    /// Venue wire form, e.g. `"EUR/USD"`.
    pub fn wire(&self) -> String {
        format!("{}{WIRE_SEP}{}", self.base, self.quote)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Convert a canonical symbol to the venue's wire syntax.
#[inline]
pub fn to_wire(canonical: &str) -> String {
    canonical.replace(CANONICAL_SEP, &WIRE_SEP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let sym = Symbol::new("EUR", "USD");
        assert_eq!(sym.canonical(), "EUR-USD");
        assert_eq!(sym.wire(), "EUR/USD");
        assert_eq!(sym.instrument_type(), InstrumentType::Spot);
    }

    #[test]
    fn codes_are_normalized() {
        let sym = Symbol::new(" eur", "usd ");
        assert_eq!(sym.base(), "EUR");
        assert_eq!(sym.quote(), "USD");
        assert_eq!(sym.to_string(), "EUR-USD");
    }

    #[test]
    fn wire_conversion() {
        assert_eq!(to_wire("EUR-USD"), "EUR/USD");
        assert_eq!(to_wire("USD-JPY"), "USD/JPY");
    }
}
