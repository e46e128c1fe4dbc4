//! Mock indexer for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::processor::{Indexer, IndexerError};

#[derive(Debug, Clone, Copy)]
enum Behavior {
    /// Produce a small deterministic artifact.
    Produce,
    /// Report the package as not indexable.
    Unsupported,
    /// Fail every build.
    Fail,
}

/// Mock implementation of the `Indexer` trait.
pub struct MockIndexer {
    behavior: Behavior,
    builds: AtomicUsize,
}

impl Default for MockIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIndexer {
    /// An indexer that produces an artifact for every package.
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Produce,
            builds: AtomicUsize::new(0),
        }
    }

    /// An indexer that reports every package as not indexable.
    pub fn unsupported() -> Self {
        Self {
            behavior: Behavior::Unsupported,
            builds: AtomicUsize::new(0),
        }
    }

    /// An indexer that fails every build.
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            builds: AtomicUsize::new(0),
        }
    }

    /// Number of build attempts.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn build_index(
        &self,
        package_id: &str,
        version: &str,
        package: &[u8],
    ) -> Result<Option<Vec<u8>>, IndexerError> {
        self.builds.fetch_add(1, Ordering::Relaxed);
        match self.behavior {
            Behavior::Produce => Ok(Some(
                format!("idx:{}:{}:{}", package_id, version, package.len()).into_bytes(),
            )),
            Behavior::Unsupported => Ok(None),
            Behavior::Fail => Err(IndexerError::Failed(format!(
                "cannot index {} {}",
                package_id, version
            ))),
        }
    }
}
