//! Polygon FX market data.
//!
//! Channels:
//! - `l1_book` ← `C` quote events
//! - `candles` ← `CA` one-minute aggregate events
//!
//! Startup resolves the symbol catalog (cached or crawled), validates the
//! requested symbols against it and produces one [`StreamDef`] per shard of
//! at most `symbols_per_connection` symbols.

pub mod classifier;
pub mod config;
pub mod normalize;
pub mod protocol;
pub mod reference;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::FutureExt;
use pf_core::config::ConnectionConfig;
use pf_core::error::FeedError;
use pf_core::ws::OnConnectCallback;
use pf_core::Channel;
use tracing::info;

use self::classifier::MessageClassifier;
use self::config::PolygonConfig;
use self::protocol::SubscriptionProtocol;
use self::reference::CatalogBuilder;
use crate::catalog::{CatalogStore, SymbolCatalog};
use crate::pipeline::{Callbacks, GenericMd, StreamDef};
use crate::MdModule;

/// Check every requested symbol against the catalog.
pub fn validate_symbols(cfg: &PolygonConfig, catalog: &SymbolCatalog) -> Result<(), FeedError> {
    for symbol in cfg.subscriptions.values().flatten() {
        if !catalog.contains(symbol) {
            return Err(FeedError::UnsupportedSymbol {
                exchange: PolygonConfig::EXCHANGE.to_string(),
                symbol: symbol.clone(),
            });
        }
    }
    Ok(())
}

/// Split the requested subscriptions into shards of at most `per_conn`
/// distinct symbols. A symbol stays on one shard for every channel it is
/// requested on.
pub fn shard_subscriptions(
    subscriptions: &BTreeMap<Channel, Vec<String>>,
    per_conn: Option<usize>,
) -> Vec<BTreeMap<Channel, Vec<String>>> {
    let mut symbols: Vec<&String> = Vec::new();
    for s in subscriptions.values().flatten() {
        if !symbols.contains(&s) {
            symbols.push(s);
        }
    }
    let size = per_conn.unwrap_or(symbols.len()).max(1);

    symbols
        .chunks(size)
        .map(|chunk| {
            subscriptions
                .iter()
                .map(|(ch, syms)| (*ch, syms.iter().filter(|s| chunk.contains(s)).cloned().collect::<Vec<_>>()))
                .filter(|(_, syms)| !syms.is_empty())
                .collect()
        })
        .collect()
}

/// Build Polygon stream definitions. The catalog must already be validated
/// against `cfg`.
pub fn build(cfg: &PolygonConfig, store: Arc<dyn CatalogStore>) -> Vec<StreamDef> {
    let protocol = Arc::new(SubscriptionProtocol::new(cfg));
    let ping_interval = (cfg.ping_interval_sec > 0).then(|| Duration::from_secs(cfg.ping_interval_sec));

    shard_subscriptions(&cfg.subscriptions, cfg.symbols_per_connection)
        .into_iter()
        .enumerate()
        .map(|(i, subscriptions)| {
            let label = format!("{}-{i}", cfg.name);

            let hook_proto = protocol.clone();
            let hook_subs = subscriptions.clone();
            let on_connect: OnConnectCallback = Arc::new(move |writer| {
                let proto = hook_proto.clone();
                let subs = hook_subs.clone();
                async move { proto.on_connect(&writer, &subs).await }.boxed()
            });

            let classifier = MessageClassifier::new(label.clone(), store.clone(), cfg.candle_interval.clone());

            StreamDef {
                label,
                ws_url: cfg.ws_url.clone(),
                ping_interval,
                extra_headers: cfg.extra_headers.clone(),
                subscriptions,
                on_connect,
                text_parser: Box::new(move |text| classifier.classify(text).records),
            }
        })
        .collect()
}

/// Polygon feed module: catalog, validation and streams behind [`MdModule`].
pub struct PolygonMd {
    cfg: PolygonConfig,
    store: Arc<dyn CatalogStore>,
    callbacks: Option<Callbacks>,
    engine: Option<GenericMd>,
}

impl PolygonMd {
    pub fn new(conn: &ConnectionConfig, store: Arc<dyn CatalogStore>, callbacks: Callbacks) -> Result<Self> {
        let cfg = PolygonConfig::from_connection(conn)?;
        Ok(Self { cfg, store, callbacks: Some(callbacks), engine: None })
    }

    pub fn config(&self) -> &PolygonConfig {
        &self.cfg
    }
}

#[async_trait]
impl MdModule for PolygonMd {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    async fn start(&mut self) -> Result<()> {
        if self.callbacks.is_none() {
            anyhow::bail!("[{}] module already started", self.cfg.name);
        }

        let catalog = CatalogBuilder::new(&self.cfg, self.store.clone())
            .build(self.cfg.refresh_symbols)
            .await
            .with_context(|| format!("[{}] loading symbol catalog", self.cfg.name))?;
        validate_symbols(&self.cfg, &catalog)?;

        let callbacks = self.callbacks.take().context("module already started")?;

        let streams = build(&self.cfg, self.store.clone());
        info!("[{}] {} symbols in catalog, {} stream(s)", self.cfg.name, catalog.len(), streams.len());

        let mut engine = GenericMd::new(self.cfg.name.clone(), streams, callbacks);
        engine.start().await?;
        self.engine = Some(engine);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(mut engine) = self.engine.take() {
            engine.stop().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pf_core::{Exchange, Symbol};

    use super::*;
    use crate::catalog::SharedCatalogStore;

    fn cfg(extra: serde_json::Value) -> PolygonConfig {
        let mut base = serde_json::json!({
            "exchange": "polygon",
            "api_key": "k",
            "l1_book": ["EUR-USD", "GBP-USD", "USD-JPY"],
            "candles": ["EUR-USD"],
        });
        if let (Some(b), Some(e)) = (base.as_object_mut(), extra.as_object()) {
            b.extend(e.clone());
        }
        let conn: ConnectionConfig = serde_json::from_value(base).unwrap();
        PolygonConfig::from_connection(&conn).unwrap()
    }

    fn catalog() -> SymbolCatalog {
        SymbolCatalog::from_entries(
            [("EUR", "USD"), ("GBP", "USD"), ("USD", "JPY")]
                .map(|(b, q)| (Symbol::new(b, q), format!("C:{b}{q}"))),
        )
    }

    #[test]
    fn unknown_symbol_rejected() {
        let bad = cfg(serde_json::json!({"candles": ["XAU-USD"]}));
        let err = validate_symbols(&bad, &catalog()).unwrap_err();
        assert!(matches!(err, FeedError::UnsupportedSymbol { ref symbol, .. } if symbol == "XAU-USD"));
        assert!(validate_symbols(&cfg(serde_json::json!({})), &catalog()).is_ok());
    }

    #[test]
    fn single_shard_by_default() {
        let shards = shard_subscriptions(&cfg(serde_json::json!({})).subscriptions, None);
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0][&Channel::L1Book].len(), 3);
        assert_eq!(shards[0][&Channel::Candles], vec!["EUR-USD"]);
    }

    #[test]
    fn shards_keep_a_symbol_together() {
        let shards = shard_subscriptions(&cfg(serde_json::json!({})).subscriptions, Some(2));
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0][&Channel::Candles], vec!["EUR-USD"]);
        assert!(shards[0][&Channel::L1Book].contains(&"EUR-USD".to_string()));
        assert_eq!(shards[1][&Channel::L1Book], vec!["USD-JPY"]);
        assert!(!shards[1].contains_key(&Channel::Candles));
    }

    #[test]
    fn build_labels_and_parsers() {
        let store = Arc::new(SharedCatalogStore::new());
        store.set(Exchange::Polygon, Arc::new(catalog()));
        let streams = build(&cfg(serde_json::json!({"symbols_per_connection": 1})), store);

        assert_eq!(streams.len(), 3);
        assert_eq!(streams[0].label, "polygon_md-0");
        assert_eq!(streams[2].label, "polygon_md-2");
        assert_eq!(streams[0].ping_interval, Some(Duration::from_secs(30)));

        let records = (streams[0].text_parser)(r#"[{"ev":"C","p":"EUR/USD","b":1.1,"a":1.2,"t":1000}]"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol(), "EUR-USD");
    }

    #[tokio::test]
    async fn on_connect_hook_authenticates_then_subscribes() {
        use pf_core::ws::WsWriter;

        let store = Arc::new(SharedCatalogStore::new());
        let streams = build(&cfg(serde_json::json!({})), store);
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);

        (streams[0].on_connect)(WsWriter::new("polygon_md-0", tx)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), r#"{"action":"auth","params":"k"}"#);
        assert_eq!(rx.recv().await.unwrap(), r#"{"action":"subscribe","params":"C.EUR/USD,C.GBP/USD,C.USD/JPY"}"#);
        assert_eq!(rx.recv().await.unwrap(), r#"{"action":"subscribe","params":"CA.EUR/USD"}"#);
    }

    #[tokio::test]
    async fn failed_catalog_load_can_be_retried() {
        let conn: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "exchange": "polygon",
            "api_key": "k",
            "rest_url": "http://127.0.0.1:1",
            "l1_book": ["EUR-USD"],
        }))
        .unwrap();
        let mut module = PolygonMd::new(&conn, Arc::new(SharedCatalogStore::new()), Callbacks::new()).unwrap();

        for _ in 0..2 {
            let err = format!("{:#}", module.start().await.unwrap_err());
            assert!(err.contains("loading symbol catalog"), "{err}");
            assert!(!err.contains("already started"), "{err}");
        }
    }
}
