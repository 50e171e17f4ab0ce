//! Document persistence over SQLite.
//!
//! One row per document id. Content is stored as the delta's JSON encoding;
//! writes go through [`DocumentPatch::apply`] so the merge semantics match
//! the in-memory store exactly.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use quillpad_core::delta::Delta;
use quillpad_core::document::{DocumentPatch, DocumentRecord};
use rusqlite::{Connection, OptionalExtension, params};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,      -- delta ops as JSON
    name TEXT NOT NULL,
    updated_at TEXT NOT NULL    -- RFC 3339
);
"#;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt stored content: {0}")]
    Content(#[from] serde_json::Error),
    #[error("corrupt stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// The `documents` table behind a connection mutex.
pub struct DocumentDb {
    conn: Mutex<Connection>,
}

impl DocumentDb {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::init(Connection::open(path)?)
    }

    /// An in-memory database, for tests.
    pub fn in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Point read. `None` when no row exists under `id`.
    pub fn get(&self, id: &str) -> Result<Option<DocumentRecord>, DbError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Option<DocumentRecord>, DbError> {
        let row = conn
            .query_row(
                "SELECT content, name, updated_at FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((content, name, updated_at)) = row else {
            return Ok(None);
        };
        let content: Delta = serde_json::from_str(&content)?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc);
        Ok(Some(DocumentRecord {
            content,
            name,
            updated_at,
        }))
    }

    /// Merge write: read the existing row (if any), apply the patch, and
    /// store the result. Returns the committed record.
    pub fn upsert(&self, id: &str, patch: DocumentPatch) -> Result<DocumentRecord, DbError> {
        let conn = self.conn.lock().unwrap();
        let existing = Self::get_locked(&conn, id)?;
        let record = patch.apply(existing, Utc::now());

        conn.execute(
            "INSERT OR REPLACE INTO documents (id, content, name, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                serde_json::to_string(&record.content)?,
                record.name,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    /// Remove the row. Returns whether a row existed.
    pub fn delete(&self, id: &str) -> Result<bool, DbError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
