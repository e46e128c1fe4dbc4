//! Mirror orchestrator implementation.
//!
//! Drives the collector loop: one pass walks the feed from the current
//! cursor; passes that found work loop again immediately, idle passes
//! sleep for the configured interval. A failed pass is retried with
//! exponential backoff and, once retries are exhausted, logged and left
//! for the next scheduled interval. The loop itself never dies on a pass
//! failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audit::{AuditHandle, CollectorEvent};
use crate::collector::{BatchCollector, CollectorError, RunOutcome};
use crate::mirror::MirrorProcessor;

use super::config::OrchestratorConfig;
use super::types::OrchestratorStatus;

/// The mirror orchestrator: owns the collect loop.
pub struct MirrorOrchestrator {
    config: OrchestratorConfig,
    collector: Arc<BatchCollector>,
    processor: Arc<MirrorProcessor>,
    audit: Option<AuditHandle>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    cancel: CancellationToken,
}

impl MirrorOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        collector: Arc<BatchCollector>,
        processor: Arc<MirrorProcessor>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            collector,
            processor,
            audit,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Start the collect loop (spawns a background task).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("orchestrator already running");
            return;
        }

        info!("starting mirror orchestrator");
        self.spawn_collect_loop();
    }

    /// Stop the orchestrator. In-flight work observes the cancellation
    /// token and aborts without advancing the cursor.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("orchestrator not running");
            return;
        }

        info!("stopping mirror orchestrator");
        self.cancel.cancel();
        let _ = self.shutdown_tx.send(());
    }

    /// Current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            cursor: self.processor.cursor().await,
            packages: self.processor.package_count().await,
        }
    }

    /// Run a single pass with retries, outside the loop. Useful for
    /// one-shot mirroring and tests.
    pub async fn run_once(&self) -> Result<RunOutcome, CollectorError> {
        Self::run_pass(
            &self.collector,
            &self.processor,
            &self.config,
            &self.audit,
            &self.cancel,
        )
        .await
    }

    fn spawn_collect_loop(&self) {
        let running = Arc::clone(&self.running);
        let collector = Arc::clone(&self.collector);
        let processor = Arc::clone(&self.processor);
        let config = self.config.clone();
        let audit = self.audit.clone();
        let cancel = self.cancel.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("collect loop started");
            loop {
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                match Self::run_pass(&collector, &processor, &config, &audit, &cancel).await {
                    Ok(outcome) if outcome.processed_any() => {
                        // More pages may have appeared while we worked;
                        // go again without sleeping.
                        continue;
                    }
                    Ok(_) => {}
                    Err(CollectorError::Cancelled) => {
                        info!("collect loop cancelled");
                        break;
                    }
                    Err(e) => {
                        error!("collector pass failed: {}", e);
                    }
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("collect loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.interval_secs)) => {}
                }
            }
            info!("collect loop stopped");
        });
    }

    /// One pass: walk the feed from the current cursor, retrying
    /// transient failures up to the configured attempt count.
    async fn run_pass(
        collector: &Arc<BatchCollector>,
        processor: &Arc<MirrorProcessor>,
        config: &OrchestratorConfig,
        audit: &Option<AuditHandle>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, CollectorError> {
        let mut attempt = 1u32;

        loop {
            let cursor = processor.cursor().await;
            if let Some(audit) = audit {
                audit.try_emit(CollectorEvent::RunStarted { cursor });
            }

            match collector.run(cursor, processor.as_ref(), cancel).await {
                Ok(outcome) => {
                    if let Some(audit) = audit {
                        audit.try_emit(CollectorEvent::RunCompleted {
                            batches: outcome.batches,
                            entries: outcome.entries,
                            cursor: processor.cursor().await,
                        });
                    }
                    return Ok(outcome);
                }
                Err(e) => {
                    if let Some(audit) = audit {
                        audit.try_emit(CollectorEvent::RunFailed {
                            attempt,
                            error: e.to_string(),
                        });
                    }

                    if !e.is_transient() || attempt >= config.retry_attempts {
                        return Err(e);
                    }

                    let delay = config.backoff_secs(attempt);
                    warn!(
                        "pass attempt {} failed ({}), retrying in {}s",
                        attempt, e, delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::storage::{MemoryStorage, Storage};
    use crate::testing::{fixtures, MockFetchClient, MockItemProcessor};
    use crate::processor::CommitAction;

    async fn orchestrator_with(fetch: Arc<MockFetchClient>) -> MirrorOrchestrator {
        let storage = Arc::new(MemoryStorage::new());
        let store =
            CatalogStore::new(storage as Arc<dyn Storage>, "http://feed/index.json");
        let item_processor =
            MockItemProcessor::new().with_default(CommitAction::LatestStable {
                version: "1.0.0".to_string(),
                commit_id: "c".to_string(),
                download_url: None,
                have_idx: false,
            });
        let processor = Arc::new(
            MirrorProcessor::load(Arc::new(item_processor), store, 2, None)
                .await
                .unwrap(),
        );
        let collector =
            Arc::new(BatchCollector::new(fetch, "http://feed/index.json", 10).unwrap());

        MirrorOrchestrator::new(OrchestratorConfig::default(), collector, processor, None)
    }

    #[tokio::test]
    async fn test_run_once_empty_feed() {
        let fetch = Arc::new(MockFetchClient::new());
        fetch.set_json("http://feed/index.json", serde_json::json!({ "items": [] }));

        let orchestrator = orchestrator_with(fetch).await;
        let outcome = orchestrator.run_once().await.unwrap();
        assert!(!outcome.processed_any());
    }

    #[tokio::test]
    async fn test_run_once_processes_entries() {
        let fetch = Arc::new(MockFetchClient::new());
        fetch.set_json(
            "http://feed/index.json",
            fixtures::catalog_index(&[("http://feed/page0.json", 100)]),
        );
        fetch.set_json(
            "http://feed/page0.json",
            fixtures::catalog_page(&[("Pkg", "1.0.0", 100, false)]),
        );

        let orchestrator = orchestrator_with(fetch).await;
        let outcome = orchestrator.run_once().await.unwrap();
        assert_eq!(outcome.entries, 1);

        let status = orchestrator.status().await;
        assert_eq!(status.packages, 1);
        assert_eq!(status.cursor, fixtures::ts(100));
    }

    #[tokio::test]
    async fn test_non_transient_failure_not_retried() {
        // No index document configured: the mock returns NotFound, which
        // is not transient, so run_once fails immediately.
        let fetch = Arc::new(MockFetchClient::new());
        let orchestrator = orchestrator_with(fetch.clone()).await;

        let err = orchestrator.run_once().await.unwrap_err();
        assert!(matches!(err, CollectorError::Fetch(_)));
        assert_eq!(fetch.fetch_count("http://feed/index.json"), 1);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let fetch = Arc::new(MockFetchClient::new());
        fetch.set_json("http://feed/index.json", serde_json::json!({ "items": [] }));

        let orchestrator = orchestrator_with(fetch).await;
        orchestrator.start().await;
        assert!(orchestrator.status().await.running);

        orchestrator.stop().await;
        assert!(!orchestrator.status().await.running);
    }
}
