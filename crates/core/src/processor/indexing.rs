//! The shipped item processor: download, index, persist.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::feed::{CatalogEntry, EntryType};
use crate::fetch::FetchClient;
use crate::registration::RegistrationClient;
use crate::storage::Storage;
use crate::version;

use super::traits::{Indexer, ItemProcessor};
use super::types::{CommitAction, ProcessError};

/// Storage key of the index artifact for one package version.
pub fn artifact_key(package_id: &str, version: &str) -> String {
    let id = package_id.to_lowercase();
    format!("idx/{}/{}.{}.idx", id, id, version.to_lowercase())
}

/// Processes catalog entries by resolving the latest stable version and
/// producing a derived index artifact for it.
///
/// Decision logic per entry:
///   - delete entries delist the package;
///   - prerelease entries are never indexed;
///   - entries for anything but the current latest stable version are
///     historical and skipped;
///   - otherwise the artifact is downloaded, indexed, and persisted at a
///     deterministic key ("already present" counts as success).
pub struct IndexingProcessor {
    fetch: Arc<dyn FetchClient>,
    registration: Arc<RegistrationClient>,
    indexer: Arc<dyn Indexer>,
    storage: Arc<dyn Storage>,
}

impl IndexingProcessor {
    pub fn new(
        fetch: Arc<dyn FetchClient>,
        registration: Arc<RegistrationClient>,
        indexer: Arc<dyn Indexer>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            fetch,
            registration,
            indexer,
            storage,
        }
    }

    async fn process_details(
        &self,
        entry: &CatalogEntry,
        cancel: &CancellationToken,
    ) -> Result<CommitAction, ProcessError> {
        let package = &entry.package_id;

        if version::is_prerelease(&entry.package_version) {
            debug!(
                "{} {} is a prerelease, skipping",
                package, entry.package_version
            );
            return Ok(CommitAction::Skip);
        }

        let index = self
            .registration
            .get_index(package, cancel)
            .await
            .map_err(|e| ProcessError::from_registration(package, e))?;

        let Some(resolved) = self
            .registration
            .latest_stable(&index, cancel)
            .await
            .map_err(|e| ProcessError::from_registration(package, e))?
        else {
            debug!("{} has no usable stable version, skipping", package);
            return Ok(CommitAction::Skip);
        };

        if !version::versions_equal(&resolved.version, &entry.package_version) {
            // Historical entry: a newer stable release supersedes it.
            debug!(
                "{} {} is superseded by {}, skipping",
                package, entry.package_version, resolved.version
            );
            return Ok(CommitAction::Skip);
        }

        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let key = artifact_key(package, &resolved.version);
        let have_idx = if self
            .storage
            .exists(&key)
            .await
            .map_err(|e| ProcessError::from_storage(package, e))?
        {
            // Re-run after a crash before commit; the artifact is already
            // in place.
            debug!("artifact {} already exists", key);
            true
        } else {
            self.build_artifact(entry, &resolved.version, &resolved.content_url, &key, cancel)
                .await?
        };

        Ok(CommitAction::LatestStable {
            version: resolved.version,
            commit_id: entry.commit_id.clone(),
            download_url: Some(resolved.content_url),
            have_idx,
        })
    }

    async fn build_artifact(
        &self,
        entry: &CatalogEntry,
        version: &str,
        content_url: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ProcessError> {
        let package = &entry.package_id;

        let bytes = self
            .fetch
            .get_bytes(content_url, cancel)
            .await
            .map_err(|e| ProcessError::from_fetch(package, e))?;

        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let artifact = self
            .indexer
            .build_index(package, version, &bytes)
            .await
            .map_err(|e| ProcessError::fatal(package, e))?;

        let Some(artifact) = artifact else {
            debug!("{} {} is not indexable", package, version);
            return Ok(false);
        };

        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        if let Err(e) = self.storage.save(key, &artifact).await {
            // Leave no partially-written destination behind.
            if let Err(del) = self.storage.delete(key).await {
                warn!("failed to clean up {} after save failure: {}", key, del);
            }
            return Err(ProcessError::from_storage(package, e));
        }

        Ok(true)
    }
}

#[async_trait]
impl ItemProcessor for IndexingProcessor {
    fn name(&self) -> &str {
        "indexing"
    }

    async fn process(
        &self,
        entry: &CatalogEntry,
        cancel: &CancellationToken,
    ) -> Result<CommitAction, ProcessError> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        match entry.entry_type {
            EntryType::Delete => {
                debug!(
                    "{} {} deleted upstream",
                    entry.package_id, entry.package_version
                );
                Ok(CommitAction::Delist)
            }
            EntryType::Details => self.process_details(entry, cancel).await,
        }
    }
}
