//! Typed model of per-package registration indexes.
//!
//! A registration index is the paginated version history of one package.
//! Pages, and leaves within a page, are stored in ascending version order
//! by the upstream feed; that ordering is trusted here, not re-validated.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::fetch::FetchError;

/// The registration index of one package.
#[derive(Debug, Clone)]
pub struct RegistrationIndex {
    /// Lowercased package id the index was fetched for.
    pub package_id: String,
    /// Pages in ascending version order.
    pub pages: Vec<RegistrationPage>,
}

/// One page of a registration index.
///
/// `leaves` is `None` when the index response did not embed the page's
/// line items; such pages are fetched on demand before scanning.
#[derive(Debug, Clone)]
pub struct RegistrationPage {
    /// URL of the page document.
    pub url: String,
    /// Lowest version on the page, as advertised.
    pub lower: Option<String>,
    /// Highest version on the page, as advertised.
    pub upper: Option<String>,
    /// Embedded leaves in ascending version order, if present.
    pub leaves: Option<Vec<RegistrationLeaf>>,
}

/// One version entry of a registration page.
#[derive(Debug, Clone)]
pub struct RegistrationLeaf {
    /// The version string.
    pub version: String,
    /// Whether the version is listed (delisted versions are never
    /// resolution candidates).
    pub listed: bool,
    /// Artifact download URL, after applying the nested-entry fallback.
    /// `None` means the version is not usable for resolution.
    pub content_url: Option<String>,
}

/// A resolved "latest" version: the scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub content_url: String,
}

/// Errors for registration index operations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid registration document at {url}: {reason}")]
    Invalid { url: String, reason: String },
}

// ============================================================================
// Wire types (private to the crate; used by the client)
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RawRegistrationIndex {
    #[serde(default)]
    pub items: Vec<RawRegistrationPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRegistrationPage {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub items: Option<Vec<RawRegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRegistrationLeaf {
    #[serde(rename = "packageContent")]
    pub package_content: Option<String>,
    #[serde(rename = "catalogEntry")]
    pub catalog_entry: Option<RawCatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCatalogEntry {
    pub version: Option<String>,
    pub listed: Option<bool>,
    #[serde(rename = "packageContent")]
    pub package_content: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

impl RawRegistrationLeaf {
    /// Convert a wire leaf, applying the content-URL fallback: some feeds
    /// leave the top-level `packageContent` blank but carry a correct one
    /// nested in the catalog entry.
    pub(crate) fn into_leaf(self) -> Option<RegistrationLeaf> {
        let entry = self.catalog_entry?;
        let version = non_empty(entry.version)?;
        let content_url =
            non_empty(self.package_content).or_else(|| non_empty(entry.package_content));

        Some(RegistrationLeaf {
            version,
            // Missing means listed for this feed format.
            listed: entry.listed.unwrap_or(true),
            content_url,
        })
    }
}

pub(crate) fn leaves_from_raw(raw: Vec<RawRegistrationLeaf>) -> Vec<RegistrationLeaf> {
    raw.into_iter().filter_map(|l| l.into_leaf()).collect()
}

/// Parse the `items` array of a standalone registration page document.
pub(crate) fn parse_page_leaves(
    url: &str,
    doc: &Value,
) -> Result<Vec<RegistrationLeaf>, RegistrationError> {
    #[derive(Debug, Deserialize)]
    struct RawPageDoc {
        #[serde(default)]
        items: Vec<RawRegistrationLeaf>,
    }

    let raw: RawPageDoc =
        serde_json::from_value(doc.clone()).map_err(|e| RegistrationError::Invalid {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(leaves_from_raw(raw.items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_leaf(doc: Value) -> RawRegistrationLeaf {
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn test_leaf_conversion() {
        let leaf = raw_leaf(json!({
            "packageContent": "http://feed/pkg.1.0.0.nupkg",
            "catalogEntry": { "version": "1.0.0", "listed": true }
        }))
        .into_leaf()
        .unwrap();

        assert_eq!(leaf.version, "1.0.0");
        assert!(leaf.listed);
        assert_eq!(
            leaf.content_url.as_deref(),
            Some("http://feed/pkg.1.0.0.nupkg")
        );
    }

    #[test]
    fn test_leaf_content_url_fallback() {
        let leaf = raw_leaf(json!({
            "packageContent": "",
            "catalogEntry": {
                "version": "1.0.0",
                "listed": true,
                "packageContent": "http://feed/nested/pkg.1.0.0.nupkg"
            }
        }))
        .into_leaf()
        .unwrap();

        assert_eq!(
            leaf.content_url.as_deref(),
            Some("http://feed/nested/pkg.1.0.0.nupkg")
        );
    }

    #[test]
    fn test_leaf_content_url_missing_after_fallback() {
        let leaf = raw_leaf(json!({
            "catalogEntry": { "version": "1.0.0", "listed": true }
        }))
        .into_leaf()
        .unwrap();

        assert!(leaf.content_url.is_none());
    }

    #[test]
    fn test_leaf_missing_listed_defaults_true() {
        let leaf = raw_leaf(json!({
            "packageContent": "http://feed/pkg.1.0.0.nupkg",
            "catalogEntry": { "version": "1.0.0" }
        }))
        .into_leaf()
        .unwrap();

        assert!(leaf.listed);
    }

    #[test]
    fn test_leaf_without_catalog_entry_dropped() {
        assert!(raw_leaf(json!({ "packageContent": "http://x" }))
            .into_leaf()
            .is_none());
    }

    #[test]
    fn test_parse_page_leaves() {
        let doc = json!({
            "items": [
                {
                    "packageContent": "http://feed/pkg.1.0.0.nupkg",
                    "catalogEntry": { "version": "1.0.0", "listed": true }
                },
                {
                    "packageContent": "http://feed/pkg.2.0.0.nupkg",
                    "catalogEntry": { "version": "2.0.0", "listed": false }
                }
            ]
        });

        let leaves = parse_page_leaves("http://feed/reg/pkg/page0.json", &doc).unwrap();
        assert_eq!(leaves.len(), 2);
        assert!(!leaves[1].listed);
    }

    #[test]
    fn test_parse_page_leaves_malformed() {
        let doc = json!("nope");
        assert!(parse_page_leaves("http://feed/reg/pkg/page0.json", &doc).is_err());
    }
}
