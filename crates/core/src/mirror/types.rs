//! Types for the mirror batch processor.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::collector::CollectorError;
use crate::feed::CatalogEntry;
use crate::processor::{CommitAction, ProcessError};

/// One entry paired with its decided commit action.
#[derive(Debug, Clone)]
pub struct EntryOutcome {
    pub entry: CatalogEntry,
    pub action: CommitAction,
}

/// Errors for the mirror batch processor.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A fatal per-entry failure poisoned the batch.
    #[error("item processing failed: {0}")]
    Process(#[from] ProcessError),

    /// Applying or persisting the catalog failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A worker task panicked.
    #[error("worker task failed: {0}")]
    Join(String),

    /// The batch was cancelled before it was committed.
    #[error("batch cancelled")]
    Cancelled,
}

impl From<MirrorError> for CollectorError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Cancelled | MirrorError::Process(ProcessError::Cancelled) => {
                CollectorError::Cancelled
            }
            e => CollectorError::Batch(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_maps_to_collector_cancelled() {
        let err: CollectorError = MirrorError::Cancelled.into();
        assert!(matches!(err, CollectorError::Cancelled));

        let err: CollectorError = MirrorError::Process(ProcessError::Cancelled).into();
        assert!(matches!(err, CollectorError::Cancelled));
    }

    #[test]
    fn test_fatal_maps_to_batch_error() {
        let err: CollectorError = MirrorError::Join("panic".to_string()).into();
        assert!(matches!(err, CollectorError::Batch(_)));
    }
}
