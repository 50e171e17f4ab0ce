//! Editor controller.
//!
//! Owns the active document id, the display name, and the time-boxed
//! `is_editing` flag, and glues the editing surface's change events to the
//! document store's save/subscribe operations:
//!
//! - every local change event sets `is_editing`, issues a save, and arms an
//!   independent settle timer that clears the flag
//! - every subscription push is re-applied silently to the surface, caret
//!   preserved - unless a local edit is in flight, in which case the push is
//!   dropped for this tick
//!
//! That flag is the system's only conflict-avoidance mechanism; writes are
//! whole-document and last-write-wins. Every failure is caught here and
//! logged; nothing is retried and nothing surfaces to the host as an error
//! state - the editor stays usable even when persistence is failing.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::document::{DEFAULT_DOCUMENT_NAME, DocumentPatch, mint_document_id};
use crate::error::Result;
use crate::pointer::PointerStore;
use crate::store::DocumentStore;
use crate::surface::{ApplyMode, EditingSurface};

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long after a local edit remote pushes stay suppressed. Each edit
    /// arms its own timer; the last one to fire wins.
    pub settle_window: Duration,
    /// Where `download_document` writes its `<name>.txt` files.
    pub downloads_dir: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_window: Duration::from_secs(2),
            downloads_dir: std::env::temp_dir(),
        }
    }
}

impl ControllerConfig {
    /// Override the settle window (hosts and tests).
    pub fn with_settle_window(mut self, window: Duration) -> Self {
        self.settle_window = window;
        self
    }

    /// Override the downloads directory.
    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = dir.into();
        self
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    pointer: Arc<dyn PointerStore>,
    surface: Arc<dyn EditingSurface>,
    config: ControllerConfig,

    document_id: RwLock<String>,
    document_name: RwLock<String>,
    is_editing: AtomicBool,
    last_saved: RwLock<Option<DateTime<Utc>>>,

    subscription: Mutex<Option<JoinHandle<()>>>,
}

/// The glue between the editing surface, the document store, and the local
/// document pointer. See the module docs for the behavioral contract.
pub struct EditorController {
    inner: Arc<Inner>,
}

impl EditorController {
    /// Create a controller. Resumes the document id from the pointer store,
    /// minting a fresh one when no pointer is present.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        pointer: Arc<dyn PointerStore>,
        surface: Arc<dyn EditingSurface>,
        config: ControllerConfig,
    ) -> Self {
        let document_id = pointer.load().unwrap_or_else(mint_document_id);
        log::debug!("[EditorController] Active document: {}", document_id);
        Self {
            inner: Arc::new(Inner {
                store,
                pointer,
                surface,
                config,
                document_id: RwLock::new(document_id),
                document_name: RwLock::new(DEFAULT_DOCUMENT_NAME.to_string()),
                is_editing: AtomicBool::new(false),
                last_saved: RwLock::new(None),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Attach to the surface: load the stored document, wire the
    /// local-change handler, and start the change subscription.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn attach(&self) {
        self.inner.load_document().await;

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::runtime::Handle::current();
        self.inner.surface.on_change(Arc::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.on_local_change(&handle);
            }
        }));

        self.inner.clone().start_subscription();
    }

    /// Save the current surface contents and name under the active id.
    pub async fn save_content(&self) {
        self.inner.save_content().await;
    }

    /// Re-read the stored record and apply it to the surface.
    pub async fn load_document(&self) {
        self.inner.load_document().await;
    }

    /// Set the display name and save (the name-submit flow).
    pub async fn rename(&self, name: impl Into<String>) {
        *self.inner.document_name.write().unwrap() = name.into();
        self.inner.save_content().await;
    }

    /// Write the surface's plain text to `<name>.txt` in the configured
    /// downloads directory. Returns the written path.
    pub fn download_document(&self) -> Result<PathBuf> {
        let name = self.inner.document_name.read().unwrap().clone();
        let path = self.inner.config.downloads_dir.join(format!("{}.txt", name));
        std::fs::write(&path, self.inner.surface.plain_text())?;
        log::info!("[EditorController] Downloaded to {}", path.display());
        Ok(path)
    }

    /// Delete the store record, clear the pointer, mint a fresh id, reset
    /// the name to its default, clear the surface, and re-subscribe under
    /// the new id. On failure nothing changes.
    pub async fn delete_document(&self) {
        let inner = &self.inner;
        let old_id = inner.document_id.read().unwrap().clone();
        match inner.store.delete(&old_id).await {
            Ok(()) => {
                if let Err(e) = inner.pointer.clear() {
                    log::warn!("[EditorController] Failed to clear pointer: {}", e);
                }
                let new_id = mint_document_id();
                *inner.document_id.write().unwrap() = new_id.clone();
                *inner.document_name.write().unwrap() = DEFAULT_DOCUMENT_NAME.to_string();
                *inner.last_saved.write().unwrap() = None;
                inner
                    .surface
                    .set_contents(crate::delta::Delta::new(), ApplyMode::Silent);
                inner.surface.set_selection(0, ApplyMode::Silent);
                inner.clone().start_subscription();
                log::info!("[EditorController] Deleted {}, now on {}", old_id, new_id);
            }
            Err(e) => {
                log::error!("[EditorController] Error deleting {}: {}", old_id, e);
            }
        }
    }

    /// Stop the change subscription. The surface stays usable; edits keep
    /// saving, they just stop mirroring remote writers.
    pub fn detach(&self) {
        let mut guard = self.inner.subscription.lock().unwrap();
        if let Some(task) = guard.take() {
            task.abort();
        }
    }

    /// The active document id.
    pub fn document_id(&self) -> String {
        self.inner.document_id.read().unwrap().clone()
    }

    /// The current display name.
    pub fn document_name(&self) -> String {
        self.inner.document_name.read().unwrap().clone()
    }

    /// Whether a local edit is considered in flight (settle window open).
    pub fn is_editing(&self) -> bool {
        self.inner.is_editing.load(Ordering::SeqCst)
    }

    /// Timestamp of the last successful save, for display.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_saved.read().unwrap()
    }
}

impl Drop for EditorController {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Inner {
    /// Local-change handler: flag, save, arm a settle timer.
    ///
    /// Each change event spawns its own independent timer; the last one to
    /// fire wins, so a reset armed by an early keystroke can clear the flag
    /// while a later keystroke's window is still open. This reproduces the
    /// upstream behavior exactly.
    fn on_local_change(self: &Arc<Self>, handle: &tokio::runtime::Handle) {
        self.is_editing.store(true, Ordering::SeqCst);

        let save = self.clone();
        handle.spawn(async move {
            save.save_content().await;
        });

        let settle = self.clone();
        let window = self.config.settle_window;
        handle.spawn(async move {
            tokio::time::sleep(window).await;
            settle.is_editing.store(false, Ordering::SeqCst);
        });
    }

    async fn save_content(&self) {
        let id = self.document_id.read().unwrap().clone();
        let name = self.document_name.read().unwrap().clone();
        let patch = DocumentPatch::new()
            .with_content(self.surface.contents())
            .with_name(name);

        match self.store.set(&id, patch).await {
            Ok(record) => {
                *self.last_saved.write().unwrap() = Some(record.updated_at);
                if let Err(e) = self.pointer.store(&id) {
                    log::warn!("[EditorController] Failed to persist pointer: {}", e);
                }
                log::debug!("[EditorController] Content saved for {}", id);
            }
            Err(e) => {
                log::error!("[EditorController] Error saving content for {}: {}", id, e);
            }
        }
    }

    async fn load_document(&self) {
        let id = self.document_id.read().unwrap().clone();
        match self.store.get(&id).await {
            Ok(Some(record)) => {
                self.surface.set_contents(record.content, ApplyMode::Silent);
                *self.document_name.write().unwrap() = record.name;
                log::debug!("[EditorController] Loaded document {}", id);
            }
            Ok(None) => {
                log::debug!("[EditorController] No record for {}, starting fresh", id);
            }
            Err(e) => {
                log::error!("[EditorController] Error loading document {}: {}", id, e);
            }
        }
    }

    /// (Re)start the subscription task for the current document id,
    /// cancelling any previous one.
    fn start_subscription(self: Arc<Self>) {
        let id = self.document_id.read().unwrap().clone();
        let runner = self.clone();
        let task = tokio::spawn(async move {
            runner.run_subscription(id).await;
        });
        let mut guard = self.subscription.lock().unwrap();
        if let Some(old) = guard.replace(task) {
            old.abort();
        }
    }

    async fn run_subscription(self: Arc<Self>, id: String) {
        let mut sub = match self.store.subscribe(&id).await {
            Ok(sub) => sub,
            Err(e) => {
                log::warn!("[EditorController] Subscribe failed for {}: {}", id, e);
                return;
            }
        };
        log::debug!("[EditorController] Subscribed to {}", id);

        while let Some(record) = sub.recv().await {
            if self.is_editing.load(Ordering::SeqCst) {
                log::debug!("[EditorController] Edit in flight, dropping push for {}", id);
                continue;
            }
            // Capture the caret, apply silently, restore silently (clamped)
            let caret = self.surface.selection().unwrap_or(0);
            self.surface.set_contents(record.content, ApplyMode::Silent);
            self.surface.set_selection(caret, ApplyMode::Silent);
        }
        log::debug!("[EditorController] Subscription ended for {}", id);
    }
}
