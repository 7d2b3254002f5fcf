//! Symbol catalog and the process-wide catalog store.
//!
//! A [`SymbolCatalog`] maps canonical symbols (`EUR-USD`) to the venue's
//! reference-data tickers (`C:EURUSD`) and back, and records each symbol's
//! instrument type. The reverse index also knows the WebSocket wire form
//! (`EUR/USD`), which is how streamed events name their pair.
//!
//! Catalogs are immutable once built. A refresh produces a new instance and
//! swaps the `Arc` held by the [`CatalogStore`]; readers holding the old
//! `Arc` keep a consistent snapshot.

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use pf_core::{Exchange, InstrumentType, Symbol};
use tracing::warn;

/// Immutable canonical ↔ vendor symbol snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolCatalog {
    /// Canonical → vendor ticker (e.g. `EUR-USD` → `C:EURUSD`).
    canonical_to_vendor: AHashMap<String, String>,
    /// Canonical → instrument type.
    instrument_types: AHashMap<String, InstrumentType>,
    /// Vendor ticker or wire symbol → canonical.
    vendor_to_canonical: AHashMap<String, String>,
}

impl SymbolCatalog {
    /// Assemble a catalog from `(symbol, vendor ticker)` pairs.
    ///
    /// Later entries for the same canonical symbol replace earlier ones.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Symbol, String)>,
    {
        let mut catalog = Self::default();
        for (symbol, ticker) in entries {
            catalog.insert(symbol, ticker);
        }
        catalog
    }

    fn insert(&mut self, symbol: Symbol, ticker: String) {
        let canonical = symbol.canonical().to_string();
        if let Some(prev) = self.canonical_to_vendor.insert(canonical.clone(), ticker.clone()) {
            warn!("[catalog] duplicate symbol {canonical}: {prev} replaced by {ticker}");
            self.vendor_to_canonical.remove(&prev);
        }
        self.instrument_types.insert(canonical.clone(), symbol.instrument_type());
        self.vendor_to_canonical.insert(symbol.wire(), canonical.clone());
        self.vendor_to_canonical.insert(ticker, canonical);
    }

    /// Vendor ticker for a canonical symbol.
    pub fn to_vendor(&self, canonical: &str) -> Option<&str> {
        self.canonical_to_vendor.get(canonical).map(|s| s.as_str())
    }

    /// Canonical symbol for a vendor ticker or wire symbol.
    pub fn to_canonical(&self, vendor: &str) -> Option<&str> {
        self.vendor_to_canonical.get(vendor).map(|s| s.as_str())
    }

    /// Instrument type recorded for a canonical symbol.
    pub fn instrument_type(&self, canonical: &str) -> Option<InstrumentType> {
        self.instrument_types.get(canonical).copied()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.canonical_to_vendor.contains_key(canonical)
    }

    /// All canonical symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.canonical_to_vendor.keys().map(|s| s.as_str()).collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.canonical_to_vendor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_to_vendor.is_empty()
    }

    /// Whether the catalog holds any symbols.
    pub fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

/// Process-wide cache of catalogs keyed by exchange.
pub trait CatalogStore: Send + Sync {
    fn get(&self, exchange: Exchange) -> Option<Arc<SymbolCatalog>>;
    fn set(&self, exchange: Exchange, catalog: Arc<SymbolCatalog>);
}

/// Default [`CatalogStore`]: a map of `Arc`s behind a short-lived lock.
///
/// `set` swaps the whole `Arc`; `get` clones it out, so a reader never sees
/// a catalog that is still being built.
#[derive(Debug, Default)]
pub struct SharedCatalogStore {
    inner: RwLock<AHashMap<Exchange, Arc<SymbolCatalog>>>,
}

impl SharedCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for SharedCatalogStore {
    fn get(&self, exchange: Exchange) -> Option<Arc<SymbolCatalog>> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(&exchange).cloned()
    }

    fn set(&self, exchange: Exchange, catalog: Arc<SymbolCatalog>) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(exchange, catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SymbolCatalog {
        SymbolCatalog::from_entries([
            (Symbol::new("EUR", "USD"), "C:EURUSD".to_string()),
            (Symbol::new("USD", "JPY"), "C:USDJPY".to_string()),
        ])
    }

    #[test]
    fn both_directions() {
        let cat = sample();
        assert_eq!(cat.to_vendor("EUR-USD"), Some("C:EURUSD"));
        assert_eq!(cat.to_canonical("C:USDJPY"), Some("USD-JPY"));
        assert_eq!(cat.to_canonical("EUR/USD"), Some("EUR-USD"));
        assert_eq!(cat.instrument_type("EUR-USD"), Some(InstrumentType::Spot));
        assert_eq!(cat.symbols(), vec!["EUR-USD", "USD-JPY"]);
        assert!(cat.is_populated());
    }

    #[test]
    fn unknown_lookups() {
        let cat = sample();
        assert_eq!(cat.to_vendor("GBP-USD"), None);
        assert_eq!(cat.to_canonical("GBP/USD"), None);
        assert!(!cat.contains("GBP-USD"));
        assert!(!SymbolCatalog::default().is_populated());
    }

    #[test]
    fn duplicate_keeps_later_record() {
        let cat = SymbolCatalog::from_entries([
            (Symbol::new("EUR", "USD"), "C:OLD".to_string()),
            (Symbol::new("EUR", "USD"), "C:EURUSD".to_string()),
        ]);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.to_vendor("EUR-USD"), Some("C:EURUSD"));
        assert_eq!(cat.to_canonical("C:OLD"), None);
    }

    #[test]
    fn store_swaps_whole_catalog() {
        let store = SharedCatalogStore::new();
        assert!(store.get(Exchange::Polygon).is_none());

        let first = Arc::new(sample());
        store.set(Exchange::Polygon, first.clone());
        let held = store.get(Exchange::Polygon).unwrap();
        assert!(Arc::ptr_eq(&held, &first));

        let second = Arc::new(SymbolCatalog::from_entries([(Symbol::new("GBP", "USD"), "C:GBPUSD".to_string())]));
        store.set(Exchange::Polygon, second.clone());
        assert!(Arc::ptr_eq(&store.get(Exchange::Polygon).unwrap(), &second));
        // Old readers still see their snapshot.
        assert_eq!(held.len(), 2);
    }
}
