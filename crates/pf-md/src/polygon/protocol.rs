//! Authenticate / subscribe frames for the Polygon WebSocket.
//!
//! ```text
//! {"action":"auth","params":"<key>"}
//! {"action":"subscribe","params":"C.EUR/USD,C.GBP/USD"}
//! {"action":"subscribe","params":"CA.EUR/USD"}
//! ```
//!
//! When the venue requires authentication, [`SubscriptionProtocol::authenticate`]
//! must be called before [`SubscriptionProtocol::subscribe`]. The protocol
//! does not enforce this; [`SubscriptionProtocol::on_connect`] is the helper
//! that sequences the two. Outcomes of both are only observable later as
//! inbound `status` events.

use std::collections::BTreeMap;

use pf_core::error::FeedError;
use pf_core::ws::ConnectionHandle;
use pf_core::{Channel, to_wire};
use tracing::{debug, info};

use super::config::PolygonConfig;

/// Builds and sends protocol frames.
#[derive(Debug, Clone)]
pub struct SubscriptionProtocol {
    api_key: String,
    requires_auth: bool,
    templates: BTreeMap<Channel, String>,
}

impl SubscriptionProtocol {
    pub fn new(cfg: &PolygonConfig) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            requires_auth: cfg.requires_auth,
            templates: cfg.channel_templates.clone(),
        }
    }

    /// The auth frame, or `None` when the venue does not need one.
    pub fn auth_frame(&self) -> Option<String> {
        self.requires_auth
            .then(|| serde_json::json!({"action": "auth", "params": self.api_key}).to_string())
    }

    /// One `subscribe` frame per channel with at least one symbol.
    pub fn subscribe_frames(&self, requested: &BTreeMap<Channel, Vec<String>>) -> Vec<String> {
        self.action_frames("subscribe", requested)
    }

    /// One `unsubscribe` frame per channel with at least one symbol.
    pub fn unsubscribe_frames(&self, requested: &BTreeMap<Channel, Vec<String>>) -> Vec<String> {
        self.action_frames("unsubscribe", requested)
    }

    /// Send the auth frame. Fire-and-forget: success or failure arrives as a
    /// status event.
    pub async fn authenticate(&self, conn: &dyn ConnectionHandle) -> Result<(), FeedError> {
        if let Some(frame) = self.auth_frame() {
            info!("[{}] authenticating", conn.id());
            conn.write(frame).await?;
        }
        Ok(())
    }

    /// Send one subscribe frame per requested channel. Safe to repeat.
    pub async fn subscribe(
        &self,
        conn: &dyn ConnectionHandle,
        requested: &BTreeMap<Channel, Vec<String>>,
    ) -> Result<(), FeedError> {
        for frame in self.subscribe_frames(requested) {
            debug!("[{}] subscribe {frame}", conn.id());
            conn.write(frame).await?;
        }
        Ok(())
    }

    pub async fn unsubscribe(
        &self,
        conn: &dyn ConnectionHandle,
        requested: &BTreeMap<Channel, Vec<String>>,
    ) -> Result<(), FeedError> {
        for frame in self.unsubscribe_frames(requested) {
            conn.write(frame).await?;
        }
        Ok(())
    }

    /// Authenticate, then subscribe.
    pub async fn on_connect(
        &self,
        conn: &dyn ConnectionHandle,
        requested: &BTreeMap<Channel, Vec<String>>,
    ) -> Result<(), FeedError> {
        self.authenticate(conn).await?;
        self.subscribe(conn, requested).await
    }

    /// `C.EUR/USD,C.GBP/USD` for the given channel.
    pub fn params(&self, channel: Channel, symbols: &[String]) -> String {
        let template = self.templates.get(&channel).map(|s| s.as_str()).unwrap_or("{}");
        symbols
            .iter()
            .map(|s| template.replace("{}", &to_wire(s)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn action_frames(&self, action: &str, requested: &BTreeMap<Channel, Vec<String>>) -> Vec<String> {
        requested
            .iter()
            .filter(|(_, symbols)| !symbols.is_empty())
            .map(|(channel, symbols)| {
                serde_json::json!({"action": action, "params": self.params(*channel, symbols)}).to_string()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pf_core::config::ConnectionConfig;

    use super::*;

    /// Records every frame written to it.
    #[derive(Default)]
    struct RecordingConn {
        frames: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ConnectionHandle for RecordingConn {
        fn id(&self) -> &str {
            "rec-0"
        }

        async fn write(&self, frame: String) -> Result<(), FeedError> {
            if self.fail {
                return Err(FeedError::Transport("closed".into()));
            }
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    impl RecordingConn {
        fn frames(&self) -> Vec<serde_json::Value> {
            self.frames
                .lock()
                .unwrap()
                .iter()
                .map(|f| serde_json::from_str(f).unwrap())
                .collect()
        }
    }

    fn protocol(requires_auth: bool) -> SubscriptionProtocol {
        let conn: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "exchange": "polygon",
            "api_key": "secret",
            "requires_auth": requires_auth,
            "l1_book": ["EUR-USD"],
        }))
        .unwrap();
        SubscriptionProtocol::new(&PolygonConfig::from_connection(&conn).unwrap())
    }

    fn requested() -> BTreeMap<Channel, Vec<String>> {
        BTreeMap::from([
            (Channel::L1Book, vec!["EUR-USD".to_string(), "GBP-USD".to_string()]),
            (Channel::Candles, vec!["USD-JPY".to_string()]),
        ])
    }

    #[tokio::test]
    async fn auth_then_one_frame_per_channel() {
        let conn = RecordingConn::default();
        protocol(true).on_connect(&conn, &requested()).await.unwrap();

        let frames = conn.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], serde_json::json!({"action": "auth", "params": "secret"}));
        assert_eq!(frames[1], serde_json::json!({"action": "subscribe", "params": "C.EUR/USD,C.GBP/USD"}));
        assert_eq!(frames[2], serde_json::json!({"action": "subscribe", "params": "CA.USD/JPY"}));
    }

    #[tokio::test]
    async fn no_auth_frame_when_not_required() {
        let conn = RecordingConn::default();
        let proto = protocol(false);
        proto.authenticate(&conn).await.unwrap();
        assert!(conn.frames().is_empty());
        assert!(proto.auth_frame().is_none());
    }

    #[tokio::test]
    async fn resubscribe_only_resends() {
        let conn = RecordingConn::default();
        let proto = protocol(true);
        proto.subscribe(&conn, &requested()).await.unwrap();
        proto.subscribe(&conn, &requested()).await.unwrap();
        let frames = conn.frames();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], frames[2]);
        assert_eq!(frames[1], frames[3]);
    }

    #[test]
    fn empty_channels_are_skipped() {
        let req = BTreeMap::from([(Channel::L1Book, vec![]), (Channel::Candles, vec!["EUR-USD".to_string()])]);
        let frames = protocol(true).subscribe_frames(&req);
        assert_eq!(frames, vec![r#"{"action":"subscribe","params":"CA.EUR/USD"}"#.to_string()]);
    }

    #[test]
    fn unsubscribe_uses_same_params() {
        let frames = protocol(true).unsubscribe_frames(&requested());
        assert_eq!(frames[0], r#"{"action":"unsubscribe","params":"C.EUR/USD,C.GBP/USD"}"#);
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let conn = RecordingConn { fail: true, ..Default::default() };
        let err = protocol(true).on_connect(&conn, &requested()).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }
}
