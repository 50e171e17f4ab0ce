//! Local pointer to the currently active document id.
//!
//! A single key holds the active document id so a later restart resumes the
//! same document. Absence means "mint a new document on next use". The
//! pointer is written on every successful save and cleared on delete.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

/// Persistent storage for the active document id.
pub trait PointerStore: Send + Sync {
    /// The stored id, or `None` if no document is active.
    fn load(&self) -> Option<String>;

    /// Persist `id` as the active document.
    fn store(&self, id: &str) -> Result<()>;

    /// Forget the active document.
    fn clear(&self) -> Result<()>;
}

/// File-backed pointer: one id on one line.
pub struct FilePointer {
    path: PathBuf,
}

impl FilePointer {
    /// Create a pointer backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform-default location, `<data dir>/quillpad/current_document`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            crate::error::QuillpadError::Store("no platform data directory".to_string())
        })?;
        Ok(Self::new(base.join("quillpad").join("current_document")))
    }

    /// The file this pointer reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointerStore for FilePointer {
    fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let id = raw.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    fn store(&self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, id)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory pointer for tests and embedded use.
#[derive(Default)]
pub struct MemoryPointer {
    id: Mutex<Option<String>>,
}

impl MemoryPointer {
    /// Create an empty pointer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerStore for MemoryPointer {
    fn load(&self) -> Option<String> {
        self.id.lock().unwrap().clone()
    }

    fn store(&self, id: &str) -> Result<()> {
        *self.id.lock().unwrap() = Some(id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.id.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_pointer_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let pointer = FilePointer::new(tmp.path().join("nested").join("current_document"));

        assert_eq!(pointer.load(), None);

        pointer.store("doc_123").unwrap();
        assert_eq!(pointer.load(), Some("doc_123".to_string()));

        pointer.store("doc_456").unwrap();
        assert_eq!(pointer.load(), Some("doc_456".to_string()));

        pointer.clear().unwrap();
        assert_eq!(pointer.load(), None);

        // Clearing an already-absent pointer is not an error
        pointer.clear().unwrap();
    }

    #[test]
    fn test_file_pointer_ignores_surrounding_whitespace() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("current_document");
        std::fs::write(&path, "  doc_789\n").unwrap();

        let pointer = FilePointer::new(&path);
        assert_eq!(pointer.load(), Some("doc_789".to_string()));
    }

    #[test]
    fn test_memory_pointer_lifecycle() {
        let pointer = MemoryPointer::new();
        assert_eq!(pointer.load(), None);
        pointer.store("doc_1").unwrap();
        assert_eq!(pointer.load(), Some("doc_1".to_string()));
        pointer.clear().unwrap();
        assert_eq!(pointer.load(), None);
    }
}
