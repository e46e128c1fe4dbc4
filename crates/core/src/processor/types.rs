//! Types for per-entry processing.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::registration::RegistrationError;
use crate::storage::StorageError;

/// The outcome decision for one catalog entry. Exactly one commit action
/// is produced per entry per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitAction {
    /// The entry is the current latest stable release; record it.
    LatestStable {
        /// Resolved latest stable version.
        version: String,
        /// Upstream commit id of the entry.
        commit_id: String,
        /// Artifact download URL.
        download_url: Option<String>,
        /// Whether a derived index artifact was produced.
        have_idx: bool,
    },
    /// The package was deleted upstream; remove it from the mirror.
    Delist,
    /// Nothing to record for this entry.
    Skip,
}

impl CommitAction {
    /// Short label for logging and events.
    pub fn kind(&self) -> &'static str {
        match self {
            CommitAction::LatestStable { .. } => "latest_stable",
            CommitAction::Delist => "delist",
            CommitAction::Skip => "skip",
        }
    }
}

/// Errors from processing one entry.
///
/// Callers branch on the variant: `Transient` failures are downgraded to
/// `CommitAction::Skip` for that entry and the batch continues; `Fatal`
/// aborts the batch.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A failure scoped to this entry that a re-run may not reproduce
    /// (missing upstream document, 5xx, malformed registration data).
    #[error("transient failure processing {package}: {reason}")]
    Transient { package: String, reason: String },

    /// A failure that poisons the whole batch (local storage broken,
    /// indexer broken).
    #[error("fatal failure processing {package}: {reason}")]
    Fatal { package: String, reason: String },

    /// Processing was cancelled.
    #[error("processing cancelled")]
    Cancelled,
}

impl ProcessError {
    pub fn transient(package: &str, reason: impl std::fmt::Display) -> Self {
        ProcessError::Transient {
            package: package.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn fatal(package: &str, reason: impl std::fmt::Display) -> Self {
        ProcessError::Fatal {
            package: package.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify a fetch failure for `package`. Not-found, transient
    /// upstream statuses and parse failures are entry-scoped; anything
    /// else poisons the batch.
    pub fn from_fetch(package: &str, err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => ProcessError::Cancelled,
            e if e.is_not_found() || e.is_transient() => Self::transient(package, e),
            e @ FetchError::Parse { .. } => Self::transient(package, e),
            e => Self::fatal(package, e),
        }
    }

    /// Classify a registration failure for `package`. Malformed
    /// registration documents are entry-scoped: skip and log.
    pub fn from_registration(package: &str, err: RegistrationError) -> Self {
        match err {
            RegistrationError::Fetch(e) => Self::from_fetch(package, e),
            e @ RegistrationError::Invalid { .. } => Self::transient(package, e),
        }
    }

    /// Local storage failures are never entry-scoped.
    pub fn from_storage(package: &str, err: StorageError) -> Self {
        Self::fatal(package, err)
    }
}

/// Errors from the pluggable index builder.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer failed: {0}")]
    Failed(String),
}
