//! Trait definitions for per-entry processing.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::feed::CatalogEntry;

use super::types::{CommitAction, IndexerError, ProcessError};

/// Executes the domain side effect for one catalog entry and decides its
/// commit action.
///
/// Implementations must be idempotent: re-running the same entry after a
/// crash before commit must not corrupt storage. They must also check the
/// cancellation token between side-effecting steps.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Returns the name of this processor implementation.
    fn name(&self) -> &str;

    /// Process one entry and decide its commit action.
    async fn process(
        &self,
        entry: &CatalogEntry,
        cancel: &CancellationToken,
    ) -> Result<CommitAction, ProcessError>;
}

/// Builds a derived index artifact from a downloaded package.
///
/// Opaque to the collector: what the artifact contains is the indexer's
/// business. `Ok(None)` means the package kind is not indexable; the
/// package is still recorded, without an artifact.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Returns the name of this indexer implementation.
    fn name(&self) -> &str;

    /// Build the index artifact for one package version.
    async fn build_index(
        &self,
        package_id: &str,
        version: &str,
        package: &[u8],
    ) -> Result<Option<Vec<u8>>, IndexerError>;
}
