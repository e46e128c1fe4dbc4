//! Trait definition for blob storage.

use async_trait::async_trait;

use super::types::StorageError;

/// A flat blob store keyed by relative, slash-separated paths.
///
/// Used both for derived index artifacts and for the package catalog
/// document itself. Loading a key that does not exist yet is an explicit
/// `Ok(None)`, never an error.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the blob stored under `key`, or `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `bytes` under `key`, replacing any previous value.
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Remove the blob under `key`. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Whether a blob exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.load(key).await?.is_some())
    }
}

/// Reject keys that are empty, absolute, or traverse out of the root.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part.is_empty() || part == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
