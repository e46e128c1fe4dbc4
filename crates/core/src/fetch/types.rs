//! Error types for the fetch client.

use thiserror::Error;

/// Errors for HTTP document fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The document does not exist upstream (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream returned a non-success status.
    #[error("upstream failure fetching {url}: HTTP {status}")]
    Upstream { url: String, status: u16 },

    /// The request itself failed (connect error, timeout, TLS, ...).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("failed to parse document at {url}: {reason}")]
    Parse { url: String, reason: String },

    /// The fetch was cancelled.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether this is a "document does not exist" failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Transport errors and 5xx/429 statuses count; 404 and client errors
    /// do not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
