//! Filesystem-backed storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::traits::{check_key, Storage};
use super::types::StorageError;

/// Blob storage rooted at a directory.
///
/// Writes go to a temporary sibling file first and are renamed into place,
/// so a crash mid-write cannot leave a torn blob at the destination key.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create storage rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(key, e))?;
        }

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        debug!("saved {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.save("a/b/doc.json", b"{\"x\":1}").await.unwrap();
        let loaded = storage.load("a/b/doc.json").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"{\"x\":1}".as_slice()));
        assert!(storage.exists("a/b/doc.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(storage.load("missing.json").await.unwrap().is_none());
        assert!(!storage.exists("missing.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.save("doc", b"old").await.unwrap();
        storage.save("doc", b"new").await.unwrap();
        assert_eq!(
            storage.load("doc").await.unwrap().as_deref(),
            Some(b"new".as_slice())
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.save("doc", b"x").await.unwrap();
        storage.delete("doc").await.unwrap();
        storage.delete("doc").await.unwrap();
        assert!(storage.load("doc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.save("doc.json", b"x").await.unwrap();
        assert!(!dir.path().join("doc.tmp").exists());
    }

    #[tokio::test]
    async fn test_traversal_key_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        let err = storage.save("../outside", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
