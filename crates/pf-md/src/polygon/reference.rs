//! Reference-data crawl that builds the Polygon [`SymbolCatalog`].
//!
//! # REST endpoint
//!
//! | Operation    | Method | Path                                        |
//! |--------------|--------|---------------------------------------------|
//! | List tickers | GET    | `/v3/reference/tickers?market=fx&limit=N`   |
//!
//! Each page looks like
//!
//! ```json
//! {"results": [{"ticker": "C:EURUSD", "base_currency_symbol": "EUR",
//!               "currency_symbol": "USD"}],
//!  "next_url": "https://api.polygon.io/v3/reference/tickers?cursor=..."}
//! ```
//!
//! `next_url` is followed verbatim until a page comes back without one. The
//! catalog is only published to the store once every page has been fetched
//! and parsed; any failure leaves the store exactly as it was.

use std::sync::Arc;

use pf_core::Symbol;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use super::config::PolygonConfig;
use crate::catalog::{CatalogStore, SymbolCatalog};
use crate::json_util::str_field;

/// Hard failures of a catalog build. Nothing is published when one occurs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request for a page could not be completed.
    #[error("reference page {page}: request failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("reference page {page}: HTTP {status}")]
    Status { page: u32, status: u16 },

    /// The page body or one of its records has an unexpected shape.
    #[error("reference page {page}: {reason}")]
    Malformed { page: u32, reason: String },

    /// The crawl finished without a single record.
    #[error("reference data returned no symbols")]
    Empty,

    /// The crawl kept receiving continuation links.
    #[error("reference data exceeded {0} pages")]
    TooManyPages(u32),
}

/// One page of `/v3/reference/tickers`.
#[derive(Debug, Deserialize)]
struct TickerPage {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    next_url: Option<String>,
}

/// Builds and caches the Polygon symbol catalog.
pub struct CatalogBuilder {
    http: reqwest::Client,
    store: Arc<dyn CatalogStore>,
    first_url: String,
    api_key: String,
    max_pages: u32,
}

impl CatalogBuilder {
    pub fn new(cfg: &PolygonConfig, store: Arc<dyn CatalogStore>) -> Self {
        Self::with_client(reqwest::Client::new(), cfg, store)
    }

    /// Use a caller-supplied HTTP client (shared pools, custom timeouts).
    pub fn with_client(http: reqwest::Client, cfg: &PolygonConfig, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            http,
            store,
            first_url: cfg.tickers_url(),
            api_key: cfg.api_key.clone(),
            max_pages: cfg.max_pages,
        }
    }

    /// Return the cached catalog, or crawl and publish a new one.
    ///
    /// With `refresh == false` a populated cached catalog is returned without
    /// any network I/O.
    pub async fn build(&self, refresh: bool) -> Result<Arc<SymbolCatalog>, CatalogError> {
        let exchange = PolygonConfig::EXCHANGE;
        if !refresh {
            if let Some(cached) = self.store.get(exchange).filter(|c| c.is_populated()) {
                debug!("[{exchange}] symbol catalog cache hit ({} symbols)", cached.len());
                return Ok(cached);
            }
        }

        match self.crawl().await {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                self.store.set(exchange, catalog.clone());
                info!("[{exchange}] symbol catalog published ({} symbols)", catalog.len());
                Ok(catalog)
            }
            Err(e) => {
                error!("[{exchange}] symbol catalog build failed: {e:?}");
                Err(e)
            }
        }
    }

    /// Fetch every page into local state and assemble the catalog.
    async fn crawl(&self) -> Result<SymbolCatalog, CatalogError> {
        let mut entries = Vec::new();
        let mut next = Some(self.first_url.clone());
        let mut page = 0u32;

        while let Some(url) = next.take() {
            page += 1;
            if page > self.max_pages {
                return Err(CatalogError::TooManyPages(self.max_pages));
            }

            let body = self.fetch_page(&url, page).await?;
            debug!("[{}] page {page}: {} records", PolygonConfig::EXCHANGE, body.results.len());
            for record in &body.results {
                entries.push(parse_record(record, page)?);
            }
            next = body.next_url.filter(|u| !u.is_empty());
        }

        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(SymbolCatalog::from_entries(entries))
    }

    async fn fetch_page(&self, url: &str, page: u32) -> Result<TickerPage, CatalogError> {
        let mut request = self.http.get(url);
        if !self.api_key.is_empty() && !url.contains("apiKey=") {
            request = request.query(&[("apiKey", self.api_key.as_str())]);
        }

        let response = request.send().await.map_err(|e| transport_error(page, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { page, status: status.as_u16() });
        }

        let text = response.text().await.map_err(|e| transport_error(page, e))?;
        serde_json::from_str(&text).map_err(|e| CatalogError::Malformed { page, reason: format!("invalid body: {e}") })
    }
}

/// The request URL carries `apiKey`, so it is stripped from the error.
fn transport_error(page: u32, source: reqwest::Error) -> CatalogError {
    CatalogError::Transport { page, source: source.without_url() }
}

/// Turn one reference record into a `(Symbol, ticker)` pair.
fn parse_record(record: &serde_json::Value, page: u32) -> Result<(Symbol, String), CatalogError> {
    let field = |key: &str| {
        str_field(record, key).ok_or_else(|| CatalogError::Malformed {
            page,
            reason: format!("record missing {key}: {record}"),
        })
    };
    let ticker = field("ticker")?;
    let base = field("base_currency_symbol")?;
    let quote = field("currency_symbol")?;
    Ok((Symbol::new(base, quote), ticker.to_string()))
}
