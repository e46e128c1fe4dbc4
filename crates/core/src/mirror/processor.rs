//! The mirror batch processor: fan-out, reconcile, persist, advance.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audit::{AuditHandle, CollectorEvent};
use crate::catalog::{CatalogStore, PackageCatalog};
use crate::collector::{BatchProcessor, CollectorError};
use crate::feed::CatalogEntry;
use crate::processor::{CommitAction, ItemProcessor, ProcessError};

use super::reconcile::apply_outcomes;
use super::types::{EntryOutcome, MirrorError};

/// Drives item processing for each batch and reconciles the results into
/// the package catalog.
///
/// This is the cursor-advancing unit of work: the catalog document (with
/// the cursor embedded) is persisted once per batch, after every entry has
/// an outcome, and the in-memory state is only replaced once the persist
/// succeeded. A crash or error before the persist leaves the previous
/// document and cursor intact; the batch is redone on the next run.
pub struct MirrorProcessor {
    item_processor: Arc<dyn ItemProcessor>,
    store: CatalogStore,
    catalog: Mutex<PackageCatalog>,
    semaphore: Arc<Semaphore>,
    audit: Option<AuditHandle>,
}

impl MirrorProcessor {
    /// Load the catalog document and build a processor fanning out to at
    /// most `max_threads` concurrent item-processor invocations.
    pub async fn load(
        item_processor: Arc<dyn ItemProcessor>,
        store: CatalogStore,
        max_threads: usize,
        audit: Option<AuditHandle>,
    ) -> Result<Self, MirrorError> {
        let catalog = store.load().await?;
        info!(
            "catalog loaded: {} package(s), cursor {}",
            catalog.len(),
            catalog.last_updated
        );

        Ok(Self {
            item_processor,
            store,
            catalog: Mutex::new(catalog),
            semaphore: Arc::new(Semaphore::new(max_threads.max(1))),
            audit,
        })
    }

    /// The current cursor.
    pub async fn cursor(&self) -> DateTime<Utc> {
        self.catalog.lock().await.last_updated
    }

    /// Number of packages currently mirrored.
    pub async fn package_count(&self) -> usize {
        self.catalog.lock().await.len()
    }

    /// A point-in-time copy of the catalog document.
    pub async fn snapshot(&self) -> PackageCatalog {
        self.catalog.lock().await.clone()
    }

    /// Fan a batch out to the item processor with bounded parallelism and
    /// collect exactly one outcome per entry. Transient failures are
    /// downgraded to `Skip`; fatal failures abort the batch.
    async fn collect_outcomes(
        &self,
        batch: Vec<CatalogEntry>,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryOutcome>, MirrorError> {
        let mut handles = Vec::with_capacity(batch.len());

        for entry in batch {
            let semaphore = Arc::clone(&self.semaphore);
            let processor = Arc::clone(&self.item_processor);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore closed");
                let result = processor.process(&entry, &cancel).await;
                (entry, result)
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());

        for joined in futures::future::join_all(handles).await {
            let (entry, result) = joined.map_err(|e| MirrorError::Join(e.to_string()))?;

            let action = match result {
                Ok(action) => action,
                Err(ProcessError::Cancelled) => return Err(MirrorError::Cancelled),
                Err(e @ ProcessError::Fatal { .. }) => return Err(MirrorError::Process(e)),
                Err(e @ ProcessError::Transient { .. }) => {
                    // Entry-scoped failure: downgrade and continue.
                    warn!(
                        "downgrading {} {} to skip: {}",
                        entry.package_id, entry.package_version, e
                    );
                    if let Some(audit) = &self.audit {
                        audit.try_emit(CollectorEvent::EntrySkipped {
                            package_id: entry.package_id.clone(),
                            version: entry.package_version.clone(),
                            reason: e.to_string(),
                        });
                    }
                    CommitAction::Skip
                }
            };

            outcomes.push(EntryOutcome { entry, action });
        }

        Ok(outcomes)
    }

    async fn emit_outcome_events(&self, outcomes: &[EntryOutcome]) {
        let Some(audit) = &self.audit else {
            return;
        };

        for outcome in outcomes {
            match &outcome.action {
                CommitAction::LatestStable { version, .. } => {
                    audit.try_emit(CollectorEvent::PackageIndexed {
                        package_id: outcome.entry.package_id.clone(),
                        version: version.clone(),
                    });
                }
                CommitAction::Delist => {
                    audit.try_emit(CollectorEvent::PackageDelisted {
                        package_id: outcome.entry.package_id.clone(),
                    });
                }
                CommitAction::Skip => {}
            }
        }
    }

    async fn apply_and_persist(
        &self,
        outcomes: Vec<EntryOutcome>,
        cancel: &CancellationToken,
    ) -> Result<(), MirrorError> {
        // The catalog is owned exclusively for the whole apply+persist
        // cycle; nothing may observe it half-applied.
        let mut catalog = self.catalog.lock().await;

        if cancel.is_cancelled() {
            return Err(MirrorError::Cancelled);
        }

        let size = outcomes.len();
        let mut next = catalog.clone();
        let max_seen = apply_outcomes(&mut next, outcomes);

        let Some(max_seen) = max_seen else {
            debug!("empty batch, nothing to persist");
            return Ok(());
        };

        next.advance_cursor(max_seen)?;
        self.store.save(&next).await?;
        *catalog = next;

        info!(
            "batch of {} reconciled, cursor now {}",
            size, catalog.last_updated
        );
        if let Some(audit) = &self.audit {
            audit.try_emit(CollectorEvent::BatchProcessed {
                size,
                cursor: catalog.last_updated,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl BatchProcessor for MirrorProcessor {
    async fn process_batch(
        &self,
        batch: Vec<CatalogEntry>,
        cancel: &CancellationToken,
    ) -> Result<(), CollectorError> {
        if cancel.is_cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let outcomes = self.collect_outcomes(batch, cancel).await?;
        self.emit_outcome_events(&outcomes).await;
        self.apply_and_persist(outcomes, cancel).await?;
        Ok(())
    }
}
