//! Document store abstraction.
//!
//! The store provides four operations over durable per-id document records:
//! point read, merge write, delete, and a real-time change subscription that
//! pushes the committed record to every active listener on each write
//! (including the writer's own subscription).
//!
//! Two implementations:
//! - [`MemoryStore`] - in-process, for tests and embedded use
//! - [`RemoteStore`] - speaks to `quillpad_sync_server` over REST and
//!   WebSocket (behind the `remote-store` feature, native only)

mod memory;
#[cfg(all(feature = "remote-store", not(target_arch = "wasm32")))]
mod remote;

pub use memory::MemoryStore;
#[cfg(all(feature = "remote-store", not(target_arch = "wasm32")))]
pub use remote::RemoteStore;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::document::{DocumentPatch, DocumentRecord};
use crate::error::Result;

/// The remote document store contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `None` when no record exists under `id`.
    async fn get(&self, id: &str) -> Result<Option<DocumentRecord>>;

    /// Merge write: supplied fields overwrite, absent fields are left
    /// untouched; the record is created if absent. Assigns `updated_at` and
    /// returns the committed record after fanning it out to subscribers.
    async fn set(&self, id: &str, patch: DocumentPatch) -> Result<DocumentRecord>;

    /// Remove the record. Subscribers of a deleted id receive no further
    /// pushes.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Subscribe to committed writes for `id`. Dropping the returned
    /// [`Subscription`] unsubscribes.
    async fn subscribe(&self, id: &str) -> Result<Subscription>;
}

/// A live change subscription for one document id.
///
/// Yields the committed record for every write that lands while the
/// subscription is open. `recv()` returns `None` once the stream ends
/// (document deleted, connection closed, or store dropped).
pub struct Subscription {
    inner: SubscriptionInner,
}

enum SubscriptionInner {
    /// Fed directly from a MemoryStore broadcast channel.
    Broadcast(broadcast::Receiver<DocumentRecord>),
    /// Fed by a background task (RemoteStore's WebSocket reader).
    Channel {
        rx: mpsc::UnboundedReceiver<DocumentRecord>,
        task: tokio::task::JoinHandle<()>,
    },
}

impl Subscription {
    pub(crate) fn from_broadcast(rx: broadcast::Receiver<DocumentRecord>) -> Self {
        Self {
            inner: SubscriptionInner::Broadcast(rx),
        }
    }

    #[cfg_attr(not(feature = "remote-store"), allow(dead_code))]
    pub(crate) fn from_channel(
        rx: mpsc::UnboundedReceiver<DocumentRecord>,
        task: tokio::task::JoinHandle<()>,
    ) -> Self {
        Self {
            inner: SubscriptionInner::Channel { rx, task },
        }
    }

    /// Wait for the next pushed record. `None` means the stream ended.
    pub async fn recv(&mut self) -> Option<DocumentRecord> {
        match &mut self.inner {
            SubscriptionInner::Broadcast(rx) => loop {
                match rx.recv().await {
                    Ok(record) => return Some(record),
                    // A slow listener only ever needs the latest state:
                    // skip over anything the channel dropped.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("[Subscription] Lagged, skipped {} pushes", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
            SubscriptionInner::Channel { rx, .. } => rx.recv().await,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let SubscriptionInner::Channel { task, .. } = &self.inner {
            task.abort();
        }
    }
}
