//! Recording batch processor for testing the collector walk.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::collector::{BatchProcessor, CollectorError};
use crate::feed::CatalogEntry;

/// Batch processor that records every batch it receives.
pub struct RecordingBatchProcessor {
    batches: Mutex<Vec<Vec<CatalogEntry>>>,
    fail_after: Mutex<Option<usize>>,
}

impl Default for RecordingBatchProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBatchProcessor {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            fail_after: Mutex::new(None),
        }
    }

    /// Fail once `n` batches have been accepted.
    pub fn fail_after(&self, n: usize) {
        *self.fail_after.lock().expect("poisoned") = Some(n);
    }

    /// Sizes of the received batches, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .expect("poisoned")
            .iter()
            .map(|b| b.len())
            .collect()
    }

    /// All received entries, flattened in order.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.batches
            .lock()
            .expect("poisoned")
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BatchProcessor for RecordingBatchProcessor {
    async fn process_batch(
        &self,
        batch: Vec<CatalogEntry>,
        _cancel: &CancellationToken,
    ) -> Result<(), CollectorError> {
        let mut batches = self.batches.lock().expect("poisoned");

        if let Some(limit) = *self.fail_after.lock().expect("poisoned") {
            if batches.len() >= limit {
                return Err(CollectorError::Batch("induced failure".into()));
            }
        }

        batches.push(batch);
        Ok(())
    }
}
