//! In-process document store.
//!
//! Records live in a map; each document id gets its own broadcast channel so
//! every committed write fans out to all active subscribers of that id. The
//! channel is dropped along with the record on delete, which ends the
//! subscriptions cleanly.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use super::{DocumentStore, Subscription};
use crate::document::{DocumentPatch, DocumentRecord};
use crate::error::Result;

/// Capacity of each per-document fan-out channel. Listeners that fall
/// further behind than this skip to the latest state.
const FANOUT_CAPACITY: usize = 64;

/// In-memory [`DocumentStore`] with per-document change fan-out.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, DocumentRecord>>,
    feeds: RwLock<HashMap<String, broadcast::Sender<DocumentRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, id: &str, record: DocumentRecord) {
        let feeds = self.feeds.read().unwrap();
        if let Some(sender) = feeds.get(id) {
            // Send only fails when no subscriber is listening
            let _ = sender.send(record);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<DocumentRecord>> {
        Ok(self.docs.read().unwrap().get(id).cloned())
    }

    async fn set(&self, id: &str, patch: DocumentPatch) -> Result<DocumentRecord> {
        let record = {
            let mut docs = self.docs.write().unwrap();
            let existing = docs.get(id).cloned();
            let record = patch.apply(existing, Utc::now());
            docs.insert(id.to_string(), record.clone());
            record
        };
        log::debug!("[MemoryStore] Committed write for {}", id);
        self.publish(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.docs.write().unwrap().remove(id);
        // Dropping the sender closes every open subscription for this id
        self.feeds.write().unwrap().remove(id);
        log::debug!("[MemoryStore] Deleted {}", id);
        Ok(())
    }

    async fn subscribe(&self, id: &str) -> Result<Subscription> {
        let mut feeds = self.feeds.write().unwrap();
        let sender = feeds
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(FANOUT_CAPACITY).0);
        Ok(Subscription::from_broadcast(sender.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::Delta;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("doc_absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_creates_then_merges() {
        let store = MemoryStore::new();

        let first = store
            .set(
                "doc_1",
                DocumentPatch::new().with_content(Delta::from_text("hello")),
            )
            .await
            .unwrap();
        assert_eq!(first.name, crate::document::DEFAULT_DOCUMENT_NAME);

        // Name-only patch must not clobber content
        let second = store
            .set("doc_1", DocumentPatch::new().with_name("Notes"))
            .await
            .unwrap();
        assert_eq!(second.content.plain_text(), "hello");
        assert_eq!(second.name, "Notes");
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_subscription_receives_each_commit() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("doc_1").await.unwrap();

        store
            .set(
                "doc_1",
                DocumentPatch::new().with_content(Delta::from_text("a")),
            )
            .await
            .unwrap();
        store
            .set(
                "doc_1",
                DocumentPatch::new().with_content(Delta::from_text("ab")),
            )
            .await
            .unwrap();

        assert_eq!(sub.recv().await.unwrap().content.plain_text(), "a");
        assert_eq!(sub.recv().await.unwrap().content.plain_text(), "ab");
    }

    #[tokio::test]
    async fn test_subscription_scoped_to_id() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("doc_a").await.unwrap();

        store
            .set(
                "doc_b",
                DocumentPatch::new().with_content(Delta::from_text("other")),
            )
            .await
            .unwrap();
        store
            .set(
                "doc_a",
                DocumentPatch::new().with_content(Delta::from_text("mine")),
            )
            .await
            .unwrap();

        assert_eq!(sub.recv().await.unwrap().content.plain_text(), "mine");
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_ends_subscription() {
        let store = MemoryStore::new();
        store
            .set(
                "doc_1",
                DocumentPatch::new().with_content(Delta::from_text("x")),
            )
            .await
            .unwrap();

        let mut sub = store.subscribe("doc_1").await.unwrap();
        store.delete("doc_1").await.unwrap();

        assert!(store.get("doc_1").await.unwrap().is_none());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_two_subscribers_both_receive() {
        let store = MemoryStore::new();
        let mut a = store.subscribe("doc_1").await.unwrap();
        let mut b = store.subscribe("doc_1").await.unwrap();

        store
            .set(
                "doc_1",
                DocumentPatch::new().with_content(Delta::from_text("foo")),
            )
            .await
            .unwrap();

        assert_eq!(a.recv().await.unwrap().content.plain_text(), "foo");
        assert_eq!(b.recv().await.unwrap().content.plain_text(), "foo");
    }
}
