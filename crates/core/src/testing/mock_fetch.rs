//! Mock fetch client for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchClient, FetchError};

/// Mock implementation of the `FetchClient` trait.
///
/// Serves canned documents by URL and records every fetch, so tests can
/// assert not only on results but on traffic (e.g. that pruned catalog
/// pages were never requested). URLs with no configured response return
/// `FetchError::NotFound`; URLs marked transient return HTTP 503.
pub struct MockFetchClient {
    json: Mutex<HashMap<String, Value>>,
    bytes: Mutex<HashMap<String, Vec<u8>>>,
    transient: Mutex<HashMap<String, u16>>,
    log: Mutex<Vec<String>>,
}

impl Default for MockFetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetchClient {
    /// Create a mock with no configured responses.
    pub fn new() -> Self {
        Self {
            json: Mutex::new(HashMap::new()),
            bytes: Mutex::new(HashMap::new()),
            transient: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Serve `doc` for `url`.
    pub fn set_json(&self, url: &str, doc: Value) {
        self.json
            .lock()
            .expect("poisoned")
            .insert(url.to_string(), doc);
    }

    /// Serve raw `bytes` for `url`.
    pub fn set_bytes(&self, url: &str, bytes: &[u8]) {
        self.bytes
            .lock()
            .expect("poisoned")
            .insert(url.to_string(), bytes.to_vec());
    }

    /// Make `url` fail with the given upstream status.
    pub fn set_failing(&self, url: &str, status: u16) {
        self.transient
            .lock()
            .expect("poisoned")
            .insert(url.to_string(), status);
    }

    /// Stop failing `url`.
    pub fn clear_failing(&self, url: &str) {
        self.transient.lock().expect("poisoned").remove(url);
    }

    /// How many times `url` was fetched.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.log
            .lock()
            .expect("poisoned")
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    /// Every fetched URL in order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.log.lock().expect("poisoned").clone()
    }

    fn record(&self, url: &str) {
        self.log.lock().expect("poisoned").push(url.to_string());
    }

    fn check(&self, url: &str, cancel: &CancellationToken) -> Result<(), FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.record(url);
        if let Some(status) = self.transient.lock().expect("poisoned").get(url) {
            return Err(FetchError::Upstream {
                url: url.to_string(),
                status: *status,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FetchClient for MockFetchClient {
    async fn get_json(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError> {
        self.check(url, cancel)?;
        self.json
            .lock()
            .expect("poisoned")
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }

    async fn get_bytes(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        self.check(url, cancel)?;
        self.bytes
            .lock()
            .expect("poisoned")
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
