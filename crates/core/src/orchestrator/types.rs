//! Types for the mirror orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current status of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the collect loop is running.
    pub running: bool,
    /// Current cursor (last fully-processed commit timestamp).
    pub cursor: DateTime<Utc>,
    /// Packages currently mirrored.
    pub packages: usize,
}
