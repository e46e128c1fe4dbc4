//! Configuration for the mirror orchestrator.

use serde::{Deserialize, Serialize};

use crate::config::CollectorSettings;

/// Loop driver tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Sleep between passes when nothing new was found, in seconds.
    pub interval_secs: u64,
    /// Attempts per pass before giving up until the next interval.
    pub retry_attempts: u32,
    /// Backoff base: attempt N sleeps `retry_delay_secs^N` seconds.
    pub retry_delay_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            retry_attempts: 3,
            retry_delay_secs: 10,
        }
    }
}

impl From<&CollectorSettings> for OrchestratorConfig {
    fn from(settings: &CollectorSettings) -> Self {
        Self {
            interval_secs: settings.interval_secs,
            retry_attempts: settings.retry_attempts,
            retry_delay_secs: settings.retry_delay_secs,
        }
    }
}

impl OrchestratorConfig {
    /// Backoff delay before retrying after attempt `attempt` failed.
    pub fn backoff_secs(&self, attempt: u32) -> u64 {
        self.retry_delay_secs.saturating_pow(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_backoff_is_exponential() {
        let config = OrchestratorConfig {
            retry_delay_secs: 10,
            ..Default::default()
        };
        assert_eq!(config.backoff_secs(1), 10);
        assert_eq!(config.backoff_secs(2), 100);
        assert_eq!(config.backoff_secs(3), 1000);
    }

    #[test]
    fn test_from_collector_settings() {
        let settings = CollectorSettings {
            interval_secs: 300,
            retry_attempts: 5,
            retry_delay_secs: 2,
            ..Default::default()
        };
        let config = OrchestratorConfig::from(&settings);
        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.backoff_secs(2), 4);
    }
}
