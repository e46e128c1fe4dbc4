//! Testing utilities and mock implementations.
//!
//! Mock implementations of every collaborator trait, allowing collector
//! runs to be exercised end to end without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use magpie_core::testing::{fixtures, MockFetchClient};
//!
//! let fetch = MockFetchClient::new();
//! fetch.set_json(
//!     "http://feed/index.json",
//!     fixtures::catalog_index(&[("http://feed/page0.json", 100)]),
//! );
//!
//! // ... run the collector against `fetch`, then assert on traffic:
//! assert_eq!(fetch.fetch_count("http://feed/page0.json"), 1);
//! ```

mod mock_fetch;
mod mock_indexer;
mod mock_item_processor;
mod recording;

pub use mock_fetch::MockFetchClient;
pub use mock_indexer::MockIndexer;
pub use mock_item_processor::MockItemProcessor;
pub use recording::RecordingBatchProcessor;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    use crate::feed::{CatalogEntry, EntryType};

    /// Timestamp helper: seconds since the epoch.
    pub fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// A details entry with reasonable defaults.
    pub fn details_entry(package_id: &str, version: &str, commit_secs: i64) -> CatalogEntry {
        CatalogEntry {
            entry_url: format!(
                "http://feed/entries/{}.{}.json",
                package_id.to_lowercase(),
                version
            ),
            entry_type: EntryType::Details,
            commit_id: format!("commit-{}", commit_secs),
            commit_timestamp: ts(commit_secs),
            package_id: package_id.to_string(),
            package_version: version.to_string(),
        }
    }

    /// A delete entry with reasonable defaults.
    pub fn delete_entry(package_id: &str, version: &str, commit_secs: i64) -> CatalogEntry {
        CatalogEntry {
            entry_type: EntryType::Delete,
            ..details_entry(package_id, version, commit_secs)
        }
    }

    /// A catalog root index document listing `(url, published_secs)` pages.
    pub fn catalog_index(pages: &[(&str, i64)]) -> Value {
        let items: Vec<Value> = pages
            .iter()
            .map(|(url, published)| {
                json!({
                    "@id": url,
                    "@type": "CatalogPage",
                    "commitTimeStamp": ts(*published).to_rfc3339(),
                    "count": 1
                })
            })
            .collect();
        json!({ "items": items })
    }

    /// A catalog page document with `(package_id, version, commit_secs,
    /// is_delete)` entries.
    pub fn catalog_page(entries: &[(&str, &str, i64, bool)]) -> Value {
        let items: Vec<Value> = entries
            .iter()
            .map(|(id, version, secs, is_delete)| {
                let entry_type = if *is_delete {
                    "nuget:PackageDelete"
                } else {
                    "nuget:PackageDetails"
                };
                json!({
                    "@id": format!("http://feed/entries/{}.{}.json", id.to_lowercase(), version),
                    "@type": entry_type,
                    "commitId": format!("commit-{}", secs),
                    "commitTimeStamp": ts(*secs).to_rfc3339(),
                    "nuget:id": id,
                    "nuget:version": version
                })
            })
            .collect();
        json!({ "items": items })
    }

    /// A registration index document with `(version, listed)` leaves on
    /// one embedded page, in the given (ascending) order. Content URLs
    /// follow the `http://feed/flat/{version}/pkg.{version}.nupkg` shape.
    pub fn registration_index(versions: &[(&str, bool)]) -> Value {
        let items: Vec<Value> = versions
            .iter()
            .map(|(version, listed)| {
                json!({
                    "packageContent":
                        format!("http://feed/flat/{v}/pkg.{v}.nupkg", v = version),
                    "catalogEntry": { "version": version, "listed": listed }
                })
            })
            .collect();
        json!({
            "items": [{
                "@id": "http://feed/registration/pkg/page0.json",
                "items": items
            }]
        })
    }
}
