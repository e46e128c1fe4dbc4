//! Registration index client and latest-version resolution.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::fetch::FetchClient;
use crate::version;

use super::types::{
    leaves_from_raw, parse_page_leaves, RawRegistrationIndex, RegistrationError,
    RegistrationIndex, RegistrationLeaf, RegistrationPage, ResolvedVersion,
};

/// Which category of version a scan resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionCategory {
    Stable,
    Prerelease,
}

/// Read-only client for per-package registration indexes.
pub struct RegistrationClient {
    fetch: Arc<dyn FetchClient>,
    base_url: String,
}

impl RegistrationClient {
    /// Create a client over a registration base URL
    /// (e.g. `https://feed.example/registration`).
    pub fn new(fetch: Arc<dyn FetchClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { fetch, base_url }
    }

    /// URL of a package's registration index document.
    pub fn index_url(&self, package_id: &str) -> String {
        format!(
            "{}/{}/index.json",
            self.base_url,
            urlencoding::encode(&package_id.to_lowercase())
        )
    }

    /// Fetch and parse a package's registration index.
    pub async fn get_index(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RegistrationIndex, RegistrationError> {
        let url = self.index_url(package_id);
        let doc = self.fetch.get_json(&url, cancel).await?;

        let raw: RawRegistrationIndex =
            serde_json::from_value(doc).map_err(|e| RegistrationError::Invalid {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let pages = raw
            .items
            .into_iter()
            .filter_map(|p| {
                let url = p.id.filter(|u| !u.is_empty())?;
                Some(RegistrationPage {
                    url,
                    lower: p.lower,
                    upper: p.upper,
                    leaves: p.items.map(leaves_from_raw),
                })
            })
            .collect();

        Ok(RegistrationIndex {
            package_id: package_id.to_lowercase(),
            pages,
        })
    }

    /// Resolve the latest listed stable version of a package, or `None`
    /// if the package has no usable stable version.
    pub async fn latest_stable(
        &self,
        index: &RegistrationIndex,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedVersion>, RegistrationError> {
        self.scan(index, VersionCategory::Stable, cancel).await
    }

    /// Resolve the latest listed prerelease version of a package.
    pub async fn latest_prerelease(
        &self,
        index: &RegistrationIndex,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedVersion>, RegistrationError> {
        self.scan(index, VersionCategory::Prerelease, cancel).await
    }

    /// Backward scan over pages and leaves. Relies on the upstream
    /// invariant that pages and leaves are stored in ascending version
    /// order, so the first qualifying hit walking backward is the highest.
    async fn scan(
        &self,
        index: &RegistrationIndex,
        category: VersionCategory,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedVersion>, RegistrationError> {
        for page in index.pages.iter().rev() {
            let fetched;
            let leaves: &[RegistrationLeaf] = match &page.leaves {
                Some(leaves) => leaves,
                None => {
                    // Lazy page: line items were not embedded in the index.
                    debug!("fetching registration page {}", page.url);
                    let doc: Value = self.fetch.get_json(&page.url, cancel).await?;
                    fetched = parse_page_leaves(&page.url, &doc)?;
                    &fetched
                }
            };

            for leaf in leaves.iter().rev() {
                if !leaf.listed {
                    continue;
                }
                let prerelease = version::is_prerelease(&leaf.version);
                let wanted = match category {
                    VersionCategory::Stable => !prerelease,
                    VersionCategory::Prerelease => prerelease,
                };
                if !wanted {
                    continue;
                }
                // A version without a download URL is not usable; keep
                // scanning for an older one that is.
                let Some(content_url) = leaf.content_url.clone() else {
                    continue;
                };
                return Ok(Some(ResolvedVersion {
                    version: leaf.version.clone(),
                    content_url,
                }));
            }
        }

        Ok(None)
    }
}
