//! Quillpad sync server.
//!
//! Holds the durable document records and fans every committed write out to
//! WebSocket subscribers. Point operations (get/set/delete) are plain REST
//! under `/api/documents/{id}`; subscriptions attach at `GET /ws?doc={id}`
//! and receive JSON [`ServerMessage`](quillpad_core::protocol::ServerMessage)
//! text frames.

pub mod config;
pub mod db;
pub mod feeds;
pub mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::db::DocumentDb;
use crate::feeds::ChangeFeeds;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DocumentDb>,
    pub feeds: Arc<ChangeFeeds>,
}

impl AppState {
    /// Bundle a database and a fresh change-feed registry.
    pub fn new(db: DocumentDb) -> Self {
        Self {
            db: Arc::new(db),
            feeds: Arc::new(ChangeFeeds::new()),
        }
    }
}

/// Build the full application router over the given state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Quillpad Sync Server" }))
        .route("/health", get(|| async { "OK" }))
        .route(
            "/api/documents/{id}",
            get(handlers::get_document)
                .put(handlers::put_document)
                .delete(handlers::delete_document),
        )
        .route("/ws", get(handlers::ws_handler))
        .with_state(state)
}
