//! The batch collector: walks the catalog feed from a cursor and
//! assembles qualifying entries into bounded batches.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::feed;
use crate::fetch::FetchClient;

use super::traits::BatchProcessor;
use super::types::{CollectorError, RunOutcome};

/// Walks the two-level catalog structure starting from a cursor.
///
/// Pages whose published timestamp is not strictly greater than the cursor
/// are skipped without being fetched; within a fetched page, entries are
/// filtered by the same strict comparison. Batches are flushed at
/// `batch_size` and once more at end-of-walk.
pub struct BatchCollector {
    fetch: Arc<dyn FetchClient>,
    index_url: String,
    batch_size: usize,
}

impl BatchCollector {
    /// Create a collector for the feed rooted at `index_url`.
    pub fn new(
        fetch: Arc<dyn FetchClient>,
        index_url: impl Into<String>,
        batch_size: usize,
    ) -> Result<Self, CollectorError> {
        let index_url = index_url.into();
        if index_url.is_empty() {
            return Err(CollectorError::Config("index URL is empty".to_string()));
        }
        if batch_size == 0 {
            return Err(CollectorError::Config("batch size must be >= 1".to_string()));
        }
        Ok(Self {
            fetch,
            index_url,
            batch_size,
        })
    }

    /// The feed root URL this collector walks.
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Walk the feed once from `cursor`, dispatching batches to
    /// `processor`. An empty feed, or one with nothing newer than the
    /// cursor, produces zero batches and is not an error.
    pub async fn run(
        &self,
        cursor: DateTime<Utc>,
        processor: &dyn BatchProcessor,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, CollectorError> {
        if cancel.is_cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let doc = self.fetch.get_json(&self.index_url, cancel).await?;
        let index = feed::parse_index(&self.index_url, &doc)?;

        debug!(
            "walking {} page(s) from cursor {}",
            index.pages.len(),
            cursor
        );

        let mut batch: Vec<crate::feed::CatalogEntry> = Vec::with_capacity(self.batch_size);
        let mut outcome = RunOutcome::default();

        for page_ref in &index.pages {
            // Strict greater-than: the page that produced the current
            // cursor value is excluded, not refetched.
            if page_ref.published <= cursor {
                debug!(
                    "skipping page {} (published {} <= cursor)",
                    page_ref.url, page_ref.published
                );
                continue;
            }

            let doc = self.fetch.get_json(&page_ref.url, cancel).await?;
            let page = feed::parse_page(&page_ref.url, &doc)?;

            for entry in page.entries {
                if entry.commit_timestamp <= cursor {
                    continue;
                }
                batch.push(entry);
                outcome.entries += 1;

                if batch.len() == self.batch_size {
                    self.flush(&mut batch, processor, cancel, &mut outcome)
                        .await?;
                }
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, processor, cancel, &mut outcome)
                .await?;
        }

        if outcome.processed_any() {
            info!(
                "run complete: {} entries in {} batch(es)",
                outcome.entries, outcome.batches
            );
        } else {
            debug!("run complete: nothing newer than cursor");
        }

        Ok(outcome)
    }

    async fn flush(
        &self,
        batch: &mut Vec<crate::feed::CatalogEntry>,
        processor: &dyn BatchProcessor,
        cancel: &CancellationToken,
        outcome: &mut RunOutcome,
    ) -> Result<(), CollectorError> {
        if cancel.is_cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let entries = std::mem::take(batch);
        debug!("dispatching batch of {}", entries.len());
        processor.process_batch(entries, cancel).await?;
        outcome.batches += 1;
        Ok(())
    }
}
