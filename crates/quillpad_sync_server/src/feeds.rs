//! Per-document change feeds.
//!
//! Every committed write is published to the document's broadcast channel
//! and forwarded to each attached WebSocket. Deleting a document publishes a
//! final `Deleted` frame and drops the channel, which closes the remaining
//! subscriptions.

use dashmap::DashMap;
use quillpad_core::protocol::ServerMessage;
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of each per-document channel. Sockets that fall further behind
/// than this skip ahead to the latest state.
const FEED_CAPACITY: usize = 64;

/// Registry of live change feeds, keyed by document id.
#[derive(Default)]
pub struct ChangeFeeds {
    feeds: DashMap<String, broadcast::Sender<ServerMessage>>,
}

impl ChangeFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to pushes for `id`, creating the feed if needed.
    pub fn subscribe(&self, id: &str) -> broadcast::Receiver<ServerMessage> {
        self.feeds
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    /// Publish a message to every subscriber of `id`.
    pub fn publish(&self, id: &str, message: ServerMessage) {
        if let Some(sender) = self.feeds.get(id) {
            // Send only fails when no subscriber is listening
            let count = sender.send(message).unwrap_or(0);
            debug!("Published change for {} to {} subscriber(s)", id, count);
        }
    }

    /// Drop the feed for `id`, closing all of its subscriptions.
    pub fn close(&self, id: &str) {
        self.feeds.remove(id);
    }

    /// Number of documents with a live feed.
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
