//! WebSocket subscription handler.
//!
//! A client attaches at `GET /ws?doc={id}` and receives one JSON text frame
//! per committed write for that document. The server closes the socket after
//! a `Deleted` frame. Frames from the client are ignored.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use quillpad_core::protocol::ServerMessage;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Document id to subscribe to
    pub doc: String,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.doc))
}

async fn handle_socket(socket: WebSocket, state: AppState, doc_id: String) {
    let mut feed = state.feeds.subscribe(&doc_id);
    debug!("Subscriber attached to {}", doc_id);

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            push = feed.recv() => match push {
                Ok(message) => {
                    let ends_feed = matches!(message, ServerMessage::Deleted { .. });
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode push for {}: {}", doc_id, e);
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                    if ends_feed {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
                // A slow socket only ever needs the latest state
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber for {} lagged, skipped {} pushes", doc_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // clients do not speak; ignore
                Some(Err(e)) => {
                    debug!("WebSocket error for {}: {}", doc_id, e);
                    break;
                }
            },
        }
    }

    debug!("Subscriber detached from {}", doc_id);
}
