//! Persisted document record and merge-write patch.
//!
//! The store holds exactly one record per document id:
//! `{ content, name, updated_at }`. Writes are merge writes: a patch only
//! overwrites the fields it supplies, leaving others untouched. The store
//! assigns `updated_at` on every commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::Delta;

/// Display name given to a document before it is ever renamed.
pub const DEFAULT_DOCUMENT_NAME: &str = "Untitled Document";

/// Mint a fresh document id from the current wall clock.
///
/// Ids are opaque strings of the form `doc_<unix-millis>`, generated once
/// per client and reused across restarts via the local pointer until the
/// document is explicitly deleted.
pub fn mint_document_id() -> String {
    format!("doc_{}", Utc::now().timestamp_millis())
}

/// The persisted unit for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Rich-text content, replaced wholesale on every write.
    pub content: Delta,
    /// Display name.
    pub name: String,
    /// Store-assigned timestamp of the last committed write.
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// An empty record with the default name, stamped `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            content: Delta::new(),
            name: DEFAULT_DOCUMENT_NAME.to_string(),
            updated_at: now,
        }
    }
}

/// A merge write: absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    /// New content, if the write replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Delta>,
    /// New display name, if the write replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DocumentPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content field.
    pub fn with_content(mut self, content: Delta) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the name field.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Apply this patch over an existing record (or a fresh empty one when
    /// the record does not exist yet), producing the committed record.
    ///
    /// This is the single definition of merge-write semantics; both the
    /// in-memory store and the server database go through it.
    pub fn apply(self, existing: Option<DocumentRecord>, now: DateTime<Utc>) -> DocumentRecord {
        let mut record = existing.unwrap_or_else(|| DocumentRecord::empty(now));
        if let Some(content) = self.content {
            record.content = content;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        record.updated_at = now;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_document_id_format() {
        let id = mint_document_id();
        assert!(id.starts_with("doc_"), "unexpected id: {}", id);
        assert!(id["doc_".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_patch_creates_record_when_absent() {
        let now = Utc::now();
        let record = DocumentPatch::new()
            .with_content(Delta::from_text("hi"))
            .apply(None, now);

        assert_eq!(record.content.plain_text(), "hi");
        assert_eq!(record.name, DEFAULT_DOCUMENT_NAME);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_partial_patch_leaves_other_fields_untouched() {
        let t0 = Utc::now();
        let existing = DocumentRecord {
            content: Delta::from_text("body"),
            name: "Notes".to_string(),
            updated_at: t0,
        };

        let t1 = t0 + chrono::Duration::seconds(5);
        let record = DocumentPatch::new()
            .with_name("Renamed")
            .apply(Some(existing), t1);

        assert_eq!(record.content.plain_text(), "body");
        assert_eq!(record.name, "Renamed");
        assert_eq!(record.updated_at, t1);
    }

    #[test]
    fn test_empty_patch_only_touches_timestamp() {
        let t0 = Utc::now();
        let existing = DocumentRecord {
            content: Delta::from_text("keep"),
            name: "Keep".to_string(),
            updated_at: t0,
        };

        let t1 = t0 + chrono::Duration::seconds(1);
        let record = DocumentPatch::new().apply(Some(existing.clone()), t1);
        assert_eq!(record.content, existing.content);
        assert_eq!(record.name, existing.name);
        assert_eq!(record.updated_at, t1);
    }
}
