//! Event store trait and in-memory implementation.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CollectorEvent;

/// Errors for event stores.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One stored event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    pub event: CollectorEvent,
}

/// Where collector events end up. Implementations are synchronous; the
/// writer task is the only caller.
pub trait AuditStore: Send + Sync {
    /// Append one record.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Event store that keeps records in memory. Used in tests and when no
/// durable sink is configured but events should still be inspectable.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored records.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("poisoned").clone()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("poisoned").len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().expect("poisoned").push(record.clone());
        Ok(())
    }
}
