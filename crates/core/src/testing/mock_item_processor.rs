//! Mock item processor for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::feed::CatalogEntry;
use crate::processor::{CommitAction, ItemProcessor, ProcessError};

fn key(package_id: &str, version: &str) -> String {
    format!("{}|{}", package_id.to_lowercase(), version)
}

/// Mock implementation of the `ItemProcessor` trait.
///
/// Returns configured actions (or failures) per `(package id, version)`
/// pair, with a configurable default, and records every processed entry.
pub struct MockItemProcessor {
    actions: Mutex<HashMap<String, CommitAction>>,
    failures: Mutex<HashMap<String, ProcessError>>,
    default_action: CommitAction,
    processed: Mutex<Vec<CatalogEntry>>,
}

impl Default for MockItemProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockItemProcessor {
    /// Create a mock whose default action is `Skip`.
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            default_action: CommitAction::Skip,
            processed: Mutex::new(Vec::new()),
        }
    }

    /// Use `action` for entries with no specific configuration.
    pub fn with_default(mut self, action: CommitAction) -> Self {
        self.default_action = action;
        self
    }

    /// Return `action` for this package version.
    pub fn set_action(&self, package_id: &str, version: &str, action: CommitAction) {
        self.actions
            .lock()
            .expect("poisoned")
            .insert(key(package_id, version), action);
    }

    /// Fail this package version with `error`.
    pub fn set_failure(&self, package_id: &str, version: &str, error: ProcessError) {
        self.failures
            .lock()
            .expect("poisoned")
            .insert(key(package_id, version), error);
    }

    /// Every processed entry, in completion order.
    pub fn processed(&self) -> Vec<CatalogEntry> {
        self.processed.lock().expect("poisoned").clone()
    }

    /// Number of processed entries.
    pub fn processed_count(&self) -> usize {
        self.processed.lock().expect("poisoned").len()
    }
}

#[async_trait]
impl ItemProcessor for MockItemProcessor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process(
        &self,
        entry: &CatalogEntry,
        cancel: &CancellationToken,
    ) -> Result<CommitAction, ProcessError> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        self.processed.lock().expect("poisoned").push(entry.clone());

        let k = key(&entry.package_id, &entry.package_version);

        if let Some(error) = self.failures.lock().expect("poisoned").remove(&k) {
            return Err(error);
        }

        Ok(self
            .actions
            .lock()
            .expect("poisoned")
            .get(&k)
            .cloned()
            .unwrap_or_else(|| self.default_action.clone()))
    }
}
