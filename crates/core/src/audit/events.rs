//! Collector event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the collector.
///
/// Emission is fire-and-forget and never on the correctness-critical
/// path: the collector behaves identically when no sink is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectorEvent {
    /// The service started.
    ServiceStarted { version: String, config_hash: String },
    /// The service stopped.
    ServiceStopped { reason: String },
    /// A collector pass started from the given cursor.
    RunStarted { cursor: DateTime<Utc> },
    /// A collector pass finished.
    RunCompleted {
        batches: usize,
        entries: usize,
        cursor: DateTime<Utc>,
    },
    /// A collector pass attempt failed.
    RunFailed { attempt: u32, error: String },
    /// A batch was reconciled and persisted.
    BatchProcessed { size: usize, cursor: DateTime<Utc> },
    /// A package's latest stable version was recorded.
    PackageIndexed { package_id: String, version: String },
    /// A package was removed from the mirror.
    PackageDelisted { package_id: String },
    /// An entry produced no action (downgraded failure or superseded
    /// version).
    EntrySkipped {
        package_id: String,
        version: String,
        reason: String,
    },
}

impl CollectorEvent {
    /// Snake-case label of the event variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            CollectorEvent::ServiceStarted { .. } => "service_started",
            CollectorEvent::ServiceStopped { .. } => "service_stopped",
            CollectorEvent::RunStarted { .. } => "run_started",
            CollectorEvent::RunCompleted { .. } => "run_completed",
            CollectorEvent::RunFailed { .. } => "run_failed",
            CollectorEvent::BatchProcessed { .. } => "batch_processed",
            CollectorEvent::PackageIndexed { .. } => "package_indexed",
            CollectorEvent::PackageDelisted { .. } => "package_delisted",
            CollectorEvent::EntrySkipped { .. } => "entry_skipped",
        }
    }

    /// The package id the event concerns, if any.
    pub fn package_id(&self) -> Option<&str> {
        match self {
            CollectorEvent::PackageIndexed { package_id, .. }
            | CollectorEvent::PackageDelisted { package_id }
            | CollectorEvent::EntrySkipped { package_id, .. } => Some(package_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_labels() {
        let event = CollectorEvent::PackageIndexed {
            package_id: "Pkg".to_string(),
            version: "1.0.0".to_string(),
        };
        assert_eq!(event.event_type(), "package_indexed");
        assert_eq!(event.package_id(), Some("Pkg"));

        let event = CollectorEvent::RunStarted {
            cursor: Utc::now(),
        };
        assert_eq!(event.event_type(), "run_started");
        assert!(event.package_id().is_none());
    }

    #[test]
    fn test_event_serialization_tags_type() {
        let event = CollectorEvent::PackageDelisted {
            package_id: "Pkg".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "package_delisted");
        assert_eq!(json["package_id"], "Pkg");
    }

    #[test]
    fn test_event_roundtrip() {
        let event = CollectorEvent::RunCompleted {
            batches: 3,
            entries: 42,
            cursor: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: CollectorEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            parsed,
            CollectorEvent::RunCompleted { batches: 3, entries: 42, .. }
        ));
    }
}
