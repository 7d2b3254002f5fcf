//! # pf-runner
//!
//! Main entry point for the Polygon FX feed.
//!
//! Loads a JSON configuration file, creates one market data module per
//! configured connection, logs every normalized record and manages the
//! modules' lifecycle.
//!
//! # Usage
//!
//! ```bash
//! pf-runner config.json --log-level info --refresh-symbols
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pf_core::{Channel, MarketRecord};
use pf_md::catalog::{CatalogStore, SharedCatalogStore};
use pf_md::pipeline::{Callbacks, RecordCallback};
use tracing::{error, info};

/// Polygon FX Market Data Runner.
#[derive(Parser)]
#[command(name = "pf-runner", about = "Polygon FX Market Data Runner")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Re-crawl reference data even when a catalog is cached.
    #[arg(long)]
    refresh_symbols: bool,
}

/// Callbacks that write every record to the log.
fn logging_callbacks() -> Callbacks {
    let log_record: RecordCallback = Arc::new(|channel: Channel, record: &MarketRecord, receipt: f64| {
        info!("{channel} {record} receipt={receipt:.3}");
    });
    Channel::ALL.iter().map(|ch| (*ch, log_record.clone())).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let mut config = pf_core::config::load_config(&cli.config)?;

    // 2. Initialize logging
    let log_dir = cli.log_dir.clone().or_else(|| config.module.as_ref().and_then(|m| m.log_path.clone()));
    pf_core::logging::init_logging(&cli.log_level, log_dir.as_deref(), "pf-runner")?;

    info!("pf-runner starting: config={}, log_level={}", cli.config.display(), cli.log_level);
    info!("config loaded: {} connection(s)", config.connections.len());

    if cli.refresh_symbols {
        for conn in &mut config.connections {
            conn.refresh_symbols = Some(true);
        }
    }

    // 3. Create MD modules from the connections array
    let store: Arc<dyn CatalogStore> = Arc::new(SharedCatalogStore::new());
    let mut md_modules: Vec<Box<dyn pf_md::MdModule>> = Vec::new();

    for (idx, conn_config) in config.connections.iter().enumerate() {
        match pf_md::registry::create_md_module(conn_config, store.clone(), logging_callbacks()) {
            Ok(module) => {
                info!("connection[{idx}]: created MD module '{}' (exchange={})", module.name(), conn_config.exchange);
                md_modules.push(module);
            }
            Err(e) => {
                error!("connection[{idx}]: failed to create module for '{}': {e}", conn_config.exchange);
            }
        }
    }

    // 4. Start all modules
    for module in &mut md_modules {
        module.start().await?;
        info!("module '{}' started", module.name());
    }

    info!("all {} module(s) started, press Ctrl+C to stop", md_modules.len());

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // 6. Stop all modules gracefully
    for module in &mut md_modules {
        info!("stopping module '{}'", module.name());
        if let Err(e) = module.stop().await {
            error!("error stopping '{}': {e}", module.name());
        }
    }

    info!("all modules stopped");
    Ok(())
}
