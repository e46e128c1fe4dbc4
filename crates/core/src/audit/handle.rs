//! Handle for emitting collector events.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::CollectorEvent;

/// Envelope wrapping an event with its emission timestamp.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: CollectorEvent,
}

/// Handle for emitting collector events.
///
/// Cheaply cloneable and shareable across tasks. Events travel through an
/// async channel to the writer; a full or closed channel is logged and
/// otherwise ignored, never surfaced to the caller.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl AuditHandle {
    /// Create a handle from a channel sender.
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity.
    pub async fn emit(&self, event: CollectorEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("failed to emit collector event: {}", e);
        }
    }

    /// Emit an event without blocking. Returns whether it was accepted.
    pub fn try_emit(&self, event: CollectorEvent) -> bool {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to emit collector event: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_event() {
        let (tx, mut rx) = mpsc::channel(10);
        let handle = AuditHandle::new(tx);

        handle
            .emit(CollectorEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            })
            .await;

        let envelope = rx.recv().await.expect("should receive event");
        assert!(matches!(
            envelope.event,
            CollectorEvent::ServiceStarted { .. }
        ));
    }

    #[test]
    fn test_try_emit_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = AuditHandle::new(tx);

        assert!(handle.try_emit(CollectorEvent::ServiceStopped {
            reason: "first".to_string(),
        }));
        // Channel is full now.
        assert!(!handle.try_emit(CollectorEvent::ServiceStopped {
            reason: "second".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_emit_closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel::<EventEnvelope>(10);
        let handle = AuditHandle::new(tx);
        drop(rx);

        handle
            .emit(CollectorEvent::ServiceStopped {
                reason: "test".to_string(),
            })
            .await;
    }

    #[test]
    fn test_envelope_has_timestamp() {
        let (tx, mut rx) = mpsc::channel(10);
        let handle = AuditHandle::new(tx);

        let before = Utc::now();
        handle.try_emit(CollectorEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc".to_string(),
        });
        let after = Utc::now();

        let envelope = rx.try_recv().expect("should receive event");
        assert!(envelope.timestamp >= before);
        assert!(envelope.timestamp <= after);
    }
}
