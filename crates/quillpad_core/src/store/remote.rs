//! Remote document store client.
//!
//! Speaks to `quillpad_sync_server`: REST for the point operations
//! (get/set/delete) and a WebSocket per subscription for change pushes.
//! Pushed frames are JSON [`ServerMessage`] values; a `Deleted` frame (or
//! the server closing the socket) ends the subscription.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::{DocumentStore, Subscription};
use crate::document::{DocumentPatch, DocumentRecord};
use crate::error::{QuillpadError, Result};
use crate::protocol::ServerMessage;

/// [`DocumentStore`] backed by a `quillpad_sync_server` instance.
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// Create a client for the server at `base_url`
    /// (e.g. `http://127.0.0.1:3030`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| QuillpadError::Transport(format!("invalid server url: {}", e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/api/documents/{}", self.base_url, id)
    }

    fn ws_url(&self, id: &str) -> String {
        let ws_base = self
            .base_url
            .replace("https://", "wss://")
            .replace("http://", "ws://");
        format!("{}/ws?doc={}", ws_base, id)
    }
}

fn transport_err(e: reqwest::Error) -> QuillpadError {
    QuillpadError::Transport(e.to_string())
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn get(&self, id: &str) -> Result<Option<DocumentRecord>> {
        let resp = self
            .http
            .get(self.doc_url(id))
            .send()
            .await
            .map_err(transport_err)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status().map_err(transport_err)?;
        let record = resp.json::<DocumentRecord>().await.map_err(transport_err)?;
        Ok(Some(record))
    }

    async fn set(&self, id: &str, patch: DocumentPatch) -> Result<DocumentRecord> {
        let resp = self
            .http
            .put(self.doc_url(id))
            .json(&patch)
            .send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?;
        resp.json::<DocumentRecord>().await.map_err(transport_err)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(self.doc_url(id))
            .send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?;
        Ok(())
    }

    async fn subscribe(&self, id: &str) -> Result<Subscription> {
        let ws_url = self.ws_url(id);
        let (stream, _) = connect_async(&ws_url)
            .await
            .map_err(|e| QuillpadError::Transport(format!("websocket connect: {}", e)))?;
        log::debug!("[RemoteStore] Subscribed to {} via {}", id, ws_url);

        let (tx, rx) = mpsc::unbounded_channel();
        let doc_id = id.to_string();
        let task = tokio::spawn(async move {
            let (_write, mut read) = stream.split();
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        log::warn!("[RemoteStore] WebSocket error for {}: {}", doc_id, e);
                        break;
                    }
                };
                match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(ServerMessage::Changed { id, record }) if id == doc_id => {
                        if tx.send(record).is_err() {
                            break;
                        }
                    }
                    Ok(ServerMessage::Deleted { id }) if id == doc_id => {
                        log::debug!("[RemoteStore] {} deleted, ending subscription", doc_id);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("[RemoteStore] Undecodable push for {}: {}", doc_id, e);
                    }
                }
            }
        });

        Ok(Subscription::from_channel(rx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_derive_from_base() {
        let store = RemoteStore::new("http://127.0.0.1:3030/").unwrap();
        assert_eq!(
            store.doc_url("doc_1"),
            "http://127.0.0.1:3030/api/documents/doc_1"
        );
        assert_eq!(store.ws_url("doc_1"), "ws://127.0.0.1:3030/ws?doc=doc_1");
    }

    #[test]
    fn test_https_base_upgrades_to_wss() {
        let store = RemoteStore::new("https://sync.example.com").unwrap();
        assert_eq!(
            store.ws_url("doc_2"),
            "wss://sync.example.com/ws?doc=doc_2"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(RemoteStore::new("not a url").is_err());
    }
}
