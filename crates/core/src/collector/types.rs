//! Types for the batch collector.

use thiserror::Error;

use crate::feed::FeedError;
use crate::fetch::FetchError;

/// Errors for a collector run.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The collector was constructed with unusable parameters.
    #[error("invalid collector configuration: {0}")]
    Config(String),

    /// Fetching the root index or a page failed. Aborts the run; the
    /// driver retries the whole run.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The root index or a page is malformed. Aborts the run; nothing can
    /// be safely skipped.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// The batch processor failed.
    #[error("batch processor error: {0}")]
    Batch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The run was cancelled. The cursor is untouched.
    #[error("collector run cancelled")]
    Cancelled,
}

impl CollectorError {
    /// Whether the driver should retry the run after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, CollectorError::Fetch(e) if e.is_transient())
    }
}

/// What a collector run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Batches dispatched to the processor.
    pub batches: usize,
    /// Qualifying entries across all batches.
    pub entries: usize,
}

impl RunOutcome {
    /// Whether any batch was processed. Callers loop again immediately
    /// when true and sleep otherwise.
    pub fn processed_any(&self) -> bool {
        self.batches > 0
    }
}
