//! Trait definition for the fetch client.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::types::FetchError;

/// Retrieves documents from URLs. No business logic lives here; callers
/// interpret the documents and decide how to react to failures.
///
/// Implementations do not retry internally; the retry policy belongs to
/// the loop driver.
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Fetch and parse a JSON document.
    async fn get_json(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError>;

    /// Fetch a raw document body.
    async fn get_bytes(&self, url: &str, cancel: &CancellationToken)
        -> Result<Vec<u8>, FetchError>;
}
