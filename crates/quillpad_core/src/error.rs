//! Error types for Quillpad.
//!
//! Every store, transport, and identity failure is represented here. The
//! editor controller catches these at each call site and logs them; nothing
//! propagates to the host as a visible error state and nothing is retried.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuillpadError>;

/// Unified error type for all Quillpad operations.
#[derive(Debug, Error)]
pub enum QuillpadError {
    /// A document store operation failed.
    #[error("store error: {0}")]
    Store(String),

    /// A transport-level failure (HTTP status, WebSocket close, connect).
    #[error("transport error: {0}")]
    Transport(String),

    /// Anonymous sign-in was rejected.
    #[error("identity error: {0}")]
    Identity(String),

    /// Filesystem failure (pointer file, download export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
