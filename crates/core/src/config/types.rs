use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub audit: Option<AuditConfig>,
}

/// Upstream feed endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Root URL of the catalog feed index document.
    pub catalog_url: String,
    /// Base URL of the per-package registration indexes.
    pub registration_url: String,
}

/// Collector tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorSettings {
    /// Entries per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Concurrent item-processor invocations per batch.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    /// Sleep between passes when nothing new was found, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Attempts per pass before giving up until the next interval.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Backoff base: attempt N sleeps `retry_delay_secs^N` seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// HTTP timeout per request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_threads: default_max_threads(),
            interval_secs: default_interval_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_batch_size() -> usize {
    200
}

fn default_max_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_interval_secs() -> u64 {
    60
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for the catalog document and index artifacts.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data")
}

/// Event log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Path of the JSONL event log.
    pub path: PathBuf,
    /// Event channel capacity (events beyond it are dropped).
    #[serde(default = "default_audit_buffer")]
    pub buffer_size: usize,
}

fn default_audit_buffer() -> usize {
    1000
}
