//! reqwest-backed fetch client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::traits::FetchClient;
use super::types::FetchError;

/// HTTP fetch client with a per-request timeout.
pub struct HttpFetchClient {
    client: Client,
}

impl HttpFetchClient {
    /// Create a new client.
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn get_json(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            response = self.get(url) => {
                let response = response?;
                response.json().await.map_err(|e| FetchError::Parse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn get_bytes(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            response = self.get(url) => {
                let bytes = response?.bytes().await?;
                Ok(bytes.to_vec())
            }
        }
    }
}
