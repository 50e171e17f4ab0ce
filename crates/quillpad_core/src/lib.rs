//! # `quillpad_core`
//!
//! Core library for Quillpad, a single-document collaborative rich-text
//! editor. The editing surface holds a sequence of styled-text operations
//! (a delta); every local mutation is saved wholesale to a document store,
//! and a real-time subscription mirrors committed writes back to every
//! attached client, which re-apply the pushed content silently.
//!
//! There is no operation-level merging: reconciliation is whole-document
//! last-write-wins, guarded only by a time-boxed editing flag on each
//! client (the settle window).
//!
//! The store is an abstraction ([`store::DocumentStore`]) with two
//! implementations:
//! 1. [`store::MemoryStore`] - in-process, for tests and embedded use
//! 2. `store::RemoteStore` - speaks to `quillpad_sync_server`
//!    (behind the `remote-store` feature, native only)

#![warn(missing_docs)]

/// Editor controller - the glue between surface, store, and pointer
pub mod controller;

/// Rich-text delta content model
pub mod delta;

/// Persisted document record and merge-write patch
pub mod document;

/// Error types
pub mod error;

/// Local pointer to the currently active document id
pub mod pointer;

/// Wire protocol shared with the sync server
pub mod protocol;

/// Anonymous session identity
pub mod session;

/// Document store abstraction and implementations
pub mod store;

/// Editing surface abstraction and the in-crate text surface
pub mod surface;

pub use controller::{ControllerConfig, EditorController};
pub use delta::{Delta, DeltaOp};
pub use document::{DEFAULT_DOCUMENT_NAME, DocumentPatch, DocumentRecord, mint_document_id};
pub use error::{QuillpadError, Result};
pub use store::{DocumentStore, MemoryStore, Subscription};
pub use surface::{ApplyMode, EditingSurface, TextSurface};
