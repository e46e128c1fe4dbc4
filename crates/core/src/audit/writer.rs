//! Background task that drains the event channel into a store.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::handle::{AuditHandle, EventEnvelope};
use super::store::{AuditRecord, AuditStore};

/// Consumes event envelopes and writes them to the configured store.
pub struct AuditWriter {
    rx: mpsc::Receiver<EventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<EventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Run the writer until every handle is dropped and the channel
    /// drains. Spawn as a background task. A store failure is logged; the
    /// writer keeps consuming.
    pub async fn run(mut self) {
        tracing::info!("audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord {
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                package_id: envelope.event.package_id().map(String::from),
                event: envelope.event,
            };

            if let Err(e) = self.store.append(&record) {
                tracing::error!("failed to write collector event: {}", e);
            }
        }

        tracing::info!("audit writer shutting down");
    }
}

/// Create a complete event pipeline: a cloneable `AuditHandle` for
/// emitting and an `AuditWriter` to spawn with `tokio::spawn(writer.run())`.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{CollectorEvent, MemoryAuditStore};

    #[tokio::test]
    async fn test_writer_receives_and_stores_events() {
        let store = Arc::new(MemoryAuditStore::new());
        let (handle, writer) = create_audit_system(store.clone(), 10);

        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(CollectorEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            })
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "service_started");
    }

    #[tokio::test]
    async fn test_writer_extracts_package_id() {
        let store = Arc::new(MemoryAuditStore::new());
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(CollectorEvent::PackageIndexed {
                package_id: "My.Pkg".to_string(),
                version: "1.0.0".to_string(),
            })
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        let records = store.records();
        assert_eq!(records[0].package_id.as_deref(), Some("My.Pkg"));
    }

    #[tokio::test]
    async fn test_writer_exits_when_all_handles_dropped() {
        let store = Arc::new(MemoryAuditStore::new());
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let cloned = handle.clone();

        let writer_handle = tokio::spawn(writer.run());

        cloned
            .emit(CollectorEvent::ServiceStopped {
                reason: "test".to_string(),
            })
            .await;

        drop(handle);
        drop(cloned);

        let result =
            tokio::time::timeout(std::time::Duration::from_secs(1), writer_handle).await;
        assert!(result.is_ok(), "writer should exit after handles drop");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let store = Arc::new(MemoryAuditStore::new());
        let (handle, writer) = create_audit_system(store.clone(), 100);
        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(CollectorEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            })
            .await;
        handle
            .emit(CollectorEvent::RunStarted {
                cursor: chrono::Utc::now(),
            })
            .await;
        handle
            .emit(CollectorEvent::ServiceStopped {
                reason: "done".to_string(),
            })
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        let types: Vec<String> = store
            .records()
            .iter()
            .map(|r| r.event_type.clone())
            .collect();
        assert_eq!(types, vec!["service_started", "run_started", "service_stopped"]);
    }
}
