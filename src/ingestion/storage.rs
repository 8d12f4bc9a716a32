//! On-disk storage for uploaded documents

use std::path::PathBuf;
use uuid::Uuid;

use crate::error::Result;

/// Filesystem store for the raw bytes of uploaded documents
///
/// Files are written as `{document_id}.pdf` under the configured directory.
/// This is the only state that outlives a session reset failure; a reset
/// removes the file along with the in-memory state.
pub struct DocumentStore {
    storage_dir: PathBuf,
}

impl DocumentStore {
    /// Create a new store, creating the directory if needed
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Path for a document's on-disk copy
    pub fn path(&self, doc_id: &Uuid) -> PathBuf {
        self.storage_dir.join(format!("{}.pdf", doc_id))
    }

    /// Persist uploaded bytes, returning the path written
    pub async fn store(&self, doc_id: &Uuid, data: &[u8]) -> Result<PathBuf> {
        let path = self.path(doc_id);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Remove a document's on-disk copy, if present
    pub async fn delete(&self, doc_id: &Uuid) -> Result<()> {
        let path = self.path(doc_id);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let id = Uuid::new_v4();

        let path = store.store(&id, b"%PDF-1.4 test").await.unwrap();
        assert!(path.exists());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4 test");

        store.delete(&id).await.unwrap();
        assert!(!path.exists());

        // Deleting again is a no-op
        store.delete(&id).await.unwrap();
    }
}
