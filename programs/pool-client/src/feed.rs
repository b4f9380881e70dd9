//! Recent-winners feed.
//!
//! The backend pushes `{"type":"new-winner","data":{...}}` text frames over a
//! WebSocket. New winners are prepended, de-duplicated by id and the list is
//! capped at [`WINNER_FEED_CAP`]. While the socket is down the feed is
//! refilled from `GET /api/winners/feed` every [`WINNER_FEED_FALLBACK_POLL`].

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::constants::*;
use crate::error::ClientError;
use crate::query::PollHandle;
use crate::records::WinnerFeedEntry;
use crate::transport::Transport;

pub const NEW_WINNER: &str = "new-winner";

#[derive(Debug, Default)]
pub struct WinnerFeed {
    entries: Mutex<Vec<WinnerFeedEntry>>,
}

impl WinnerFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<WinnerFeedEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Adds a winner at the front. Returns `false` for an id already shown.
    pub fn push(&self, entry: WinnerFeedEntry) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|e| e.id == entry.id) {
            return false;
        }
        entries.insert(0, entry);
        entries.truncate(WINNER_FEED_CAP);
        true
    }

    /// Replaces the feed with a polled snapshot, kept in server order.
    pub fn replace(&self, snapshot: Vec<WinnerFeedEntry>) {
        let mut deduped: Vec<WinnerFeedEntry> = Vec::with_capacity(WINNER_FEED_CAP);
        for entry in snapshot {
            if deduped.len() == WINNER_FEED_CAP {
                break;
            }
            if !deduped.iter().any(|e| e.id == entry.id) {
                deduped.push(entry);
            }
        }
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = deduped;
    }

    /// Applies one socket text frame. Frames of other types are ignored.
    pub fn apply_frame(&self, text: &str) -> Result<bool, ClientError> {
        let frame: Value = serde_json::from_str(text).map_err(|e| ClientError::Decode {
            what: "feed frame",
            reason: e.to_string(),
        })?;
        if frame.get("type").and_then(Value::as_str) != Some(NEW_WINNER) {
            debug!(frame_type = ?frame.get("type"), "ignoring feed frame");
            return Ok(false);
        }
        let data = frame.get("data").cloned().unwrap_or(Value::Null);
        let entry: WinnerFeedEntry = serde_json::from_value(data).map_err(|e| ClientError::Decode {
            what: "winner feed entry",
            reason: e.to_string(),
        })?;
        Ok(self.push(entry))
    }
}

/// Runs the socket listener, dropping to polling whenever the socket closes
/// or fails to connect.
pub fn spawn_feed<T: Transport>(feed: Arc<WinnerFeed>, api: Arc<ApiClient<T>>, ws_url: String) -> PollHandle {
    PollHandle::new(tokio::spawn(async move {
        loop {
            match listen(&feed, &ws_url).await {
                Ok(()) => info!("winner feed socket closed"),
                Err(e) => warn!(error = %e, "winner feed socket unavailable"),
            }
            poll_once(&feed, &api).await;
            tokio::time::sleep(WINNER_FEED_FALLBACK_POLL).await;
        }
    }))
}

/// Polling-only feed, for when no socket endpoint is configured.
pub fn spawn_feed_poller<T: Transport>(feed: Arc<WinnerFeed>, api: Arc<ApiClient<T>>) -> PollHandle {
    PollHandle::new(tokio::spawn(async move {
        loop {
            poll_once(&feed, &api).await;
            tokio::time::sleep(WINNER_FEED_FALLBACK_POLL).await;
        }
    }))
}

async fn poll_once<T: Transport>(feed: &WinnerFeed, api: &ApiClient<T>) {
    match api.winners_feed().await {
        Ok(entries) => feed.replace(entries),
        Err(e) => warn!(error = %e, "winner feed poll failed"),
    }
}

async fn listen(feed: &WinnerFeed, url: &str) -> Result<(), ClientError> {
    let (mut socket, _) = connect_async(url).await?;
    info!(%url, "winner feed socket connected");
    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => {
                if let Err(e) = feed.apply_frame(&text) {
                    warn!(error = %e, "dropping malformed feed frame");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::ScriptedTransport;

    fn entry(id: &str) -> WinnerFeedEntry {
        serde_json::from_value(json!({
            "id": id,
            "poolId": "p",
            "winnerWallet": "w",
            "amount": 100.0,
            "tokenSymbol": "BONK",
            "createdAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn prepends_and_caps() {
        let feed = WinnerFeed::new();
        for i in 0..20 {
            assert!(feed.push(entry(&i.to_string())));
        }
        let entries = feed.entries();
        assert_eq!(entries.len(), WINNER_FEED_CAP);
        assert_eq!(entries[0].id, "19");
        assert_eq!(entries[WINNER_FEED_CAP - 1].id, "5");
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let feed = WinnerFeed::new();
        assert!(feed.push(entry("a")));
        assert!(!feed.push(entry("a")));
        assert_eq!(feed.entries().len(), 1);
    }

    #[test]
    fn applies_new_winner_frames_only() {
        let feed = WinnerFeed::new();
        let frame = json!({ "type": NEW_WINNER, "data": entry("x") }).to_string();
        assert!(feed.apply_frame(&frame).unwrap());
        assert!(!feed.apply_frame(r#"{"type":"ping"}"#).unwrap());
        assert!(feed.apply_frame("not json").is_err());
        assert!(feed.apply_frame(r#"{"type":"new-winner","data":{}}"#).is_err());
        assert_eq!(feed.entries().len(), 1);
    }

    #[test]
    fn replace_keeps_server_order() {
        let feed = WinnerFeed::new();
        feed.push(entry("old"));
        feed.replace(vec![entry("b"), entry("a"), entry("b")]);
        let ids: Vec<String> = feed.entries().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_refreshes_every_interval() {
        let transport = Arc::new(ScriptedTransport::default());
        transport
            .respond(200, json!([entry("a")]))
            .respond(200, json!({ "winners": [entry("b"), entry("a")] }));
        let api = Arc::new(ApiClient::new(Arc::clone(&transport)));
        let feed = Arc::new(WinnerFeed::new());

        let _handle = spawn_feed_poller(Arc::clone(&feed), api);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(feed.entries().len(), 1);

        tokio::time::sleep(WINNER_FEED_FALLBACK_POLL).await;
        assert_eq!(feed.entries()[0].id, "b");
        assert_eq!(transport.paths(), vec!["/api/winners/feed", "/api/winners/feed"]);
    }
}
