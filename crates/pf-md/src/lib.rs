//! # pf-md
//!
//! Polygon FX market data connector.
//!
//! ## Architecture
//!
//! The venue module resolves its symbol catalog, then describes its WebSocket
//! streams as `Vec<StreamDef>`. The generic [`pipeline::GenericMd`] engine
//! wires each stream to a connection, a dispatch channel and a dispatch
//! worker that hands records to the registered callbacks.
//!
//! ## Shared infrastructure
//!
//! - [`catalog`]: `SymbolCatalog` snapshot and the `CatalogStore` cache
//! - [`pipeline`]: `StreamDef` + `GenericMd` data-driven engine
//! - [`dispatch_worker`]: callback dispatch loop
//! - [`ws_helper`]: WebSocket connection helpers
//! - [`json_util`]: JSON parsing helpers

pub mod catalog;
pub mod dispatch_worker;
pub mod json_util;
pub mod pipeline;
pub mod polygon;
pub mod registry;
pub mod ws_helper;

use anyhow::Result;
use async_trait::async_trait;

/// Trait implemented by all market data modules.
///
/// Only `Send` is required (not `Sync`) because modules are accessed
/// sequentially by the runner, never concurrently.
#[async_trait]
pub trait MdModule: Send {
    /// Human-readable module name.
    fn name(&self) -> &str;
    /// Resolve reference data, connect and begin dispatching market data.
    async fn start(&mut self) -> Result<()>;
    /// Gracefully stop all connections and tasks.
    async fn stop(&mut self) -> Result<()>;
}
