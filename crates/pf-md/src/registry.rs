//! Module registry: factory for creating MD modules from config.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use pf_core::config::ConnectionConfig;

use crate::MdModule;
use crate::catalog::CatalogStore;
use crate::pipeline::Callbacks;
use crate::polygon::PolygonMd;

/// Create an `MdModule` based on the `exchange` field in the config.
///
/// Every module shares `store`, so a catalog crawled once is reused by later
/// connections to the same venue.
pub fn create_md_module(
    config: &ConnectionConfig,
    store: Arc<dyn CatalogStore>,
    callbacks: Callbacks,
) -> Result<Box<dyn MdModule>> {
    match config.exchange.to_lowercase().as_str() {
        "polygon" => Ok(Box::new(PolygonMd::new(config, store, callbacks)?)),
        other => Err(anyhow!("Unknown exchange: {other}")),
    }
}
