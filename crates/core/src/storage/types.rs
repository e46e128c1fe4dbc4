//! Error types for blob storage.

use thiserror::Error;

/// Errors for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is not usable (empty, absolute, or escaping the root).
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// An I/O failure reading or writing the backing store.
    #[error("storage i/o error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_display() {
        let err = StorageError::InvalidKey("../escape".to_string());
        assert_eq!(err.to_string(), "invalid storage key: ../escape");
    }

    #[test]
    fn test_io_error_carries_key() {
        let err = StorageError::io(
            "catalog/packages.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("catalog/packages.json"));
    }
}
