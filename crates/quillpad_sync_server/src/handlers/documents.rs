//! REST handlers for the document point operations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use quillpad_core::document::{DocumentPatch, DocumentRecord};
use quillpad_core::protocol::ServerMessage;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::db::DbError;

/// Handler-level error, rendered as a JSON body with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("document not found")]
    NotFound,
    #[error(transparent)]
    Db(#[from] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Db(e) => {
                error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `GET /api/documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>, ApiError> {
    match state.db.get(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound),
    }
}

/// `PUT /api/documents/{id}` - merge write. Creates the document when
/// absent, commits the patch, and fans the committed record out to every
/// subscriber.
pub async fn put_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<DocumentPatch>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let record = state.db.upsert(&id, patch)?;
    state.feeds.publish(
        &id,
        ServerMessage::Changed {
            id: id.clone(),
            record: record.clone(),
        },
    );
    Ok(Json(record))
}

/// `DELETE /api/documents/{id}` - remove the document and end its
/// subscriptions. Deleting an absent document succeeds.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existed = state.db.delete(&id)?;
    // Final frame first, then drop the feed so subscribers see a clean end
    state
        .feeds
        .publish(&id, ServerMessage::Deleted { id: id.clone() });
    state.feeds.close(&id);
    if existed {
        info!("Deleted document {}", id);
    }
    Ok(StatusCode::NO_CONTENT)
}
