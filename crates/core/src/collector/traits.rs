//! Trait definition for the batch processor callback.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::feed::CatalogEntry;

use super::types::CollectorError;

/// Receives batches assembled by the collector walk.
///
/// Invoked synchronously: the walk does not continue until the batch is
/// fully handled. An error aborts the run before any further batch is
/// dispatched.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Process one batch of catalog entries.
    async fn process_batch(
        &self,
        batch: Vec<CatalogEntry>,
        cancel: &CancellationToken,
    ) -> Result<(), CollectorError>;
}
