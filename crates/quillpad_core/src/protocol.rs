//! Wire protocol shared between the `RemoteStore` client and
//! `quillpad_sync_server`.
//!
//! Subscription pushes travel as JSON text frames over the WebSocket at
//! `GET /ws?doc={id}`. Point operations (get/set/delete) use plain REST and
//! are not represented here.

use serde::{Deserialize, Serialize};

use crate::document::DocumentRecord;

/// Messages pushed from the server to subscribed clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A write committed for the document; carries the full stored record.
    Changed {
        /// Document id the write landed under.
        id: String,
        /// The committed record, as stored.
        record: DocumentRecord,
    },
    /// The document was deleted; no further pushes will follow.
    Deleted {
        /// Document id that was removed.
        id: String,
    },
}
