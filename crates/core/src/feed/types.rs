//! Typed model of the upstream catalog feed.
//!
//! The feed has two levels: a root index listing time-bucketed pages, and
//! pages carrying individual commit entries. Both are immutable and
//! append-only upstream; entries are only ever added with newer commit
//! timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What kind of change a catalog entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A package version was published or its metadata changed.
    Details,
    /// A package version was deleted upstream.
    Delete,
}

/// One commit entry in the catalog feed. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// URL of the entry's own detail document.
    pub entry_url: String,
    /// Kind of change.
    pub entry_type: EntryType,
    /// Opaque upstream commit id.
    pub commit_id: String,
    /// Commit timestamp; drives cursor comparisons.
    pub commit_timestamp: DateTime<Utc>,
    /// Package id as spelled upstream.
    pub package_id: String,
    /// Package version as spelled upstream.
    pub package_version: String,
}

/// Descriptor of one catalog page as listed in the root index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRef {
    /// URL of the page document.
    pub url: String,
    /// The page's published timestamp (latest commit it contains).
    pub published: DateTime<Utc>,
    /// Entry count advertised by the index, if present.
    pub count: Option<u64>,
}

/// The root index of the catalog feed.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    /// URL the index was fetched from.
    pub url: String,
    /// Page descriptors in ascending published order.
    pub pages: Vec<PageRef>,
}

/// One fetched catalog page.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// URL the page was fetched from.
    pub url: String,
    /// Entries in ascending commit-timestamp order.
    pub entries: Vec<CatalogEntry>,
}

/// A single problem found while validating a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON path of the offending value, e.g. `items[3].commitTimeStamp`.
    pub path: String,
    /// What is wrong with it.
    pub problem: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// Errors for catalog feed documents.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The document is structurally not what a feed document looks like.
    #[error("malformed catalog document at {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// The document parsed but failed validation. All violations are
    /// collected in one pass rather than reported one at a time.
    #[error("invalid catalog document at {url}: {} violation(s)", .violations.len())]
    Invalid {
        url: String,
        violations: Vec<Violation>,
    },
}

impl FeedError {
    /// The violations carried by an `Invalid` error, empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            FeedError::Invalid { violations, .. } => violations,
            FeedError::Malformed { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_serialization() {
        assert_eq!(
            serde_json::to_string(&EntryType::Details).unwrap(),
            "\"details\""
        );
        assert_eq!(
            serde_json::to_string(&EntryType::Delete).unwrap(),
            "\"delete\""
        );
    }

    #[test]
    fn test_violation_display() {
        let v = Violation {
            path: "items[0].commitId".to_string(),
            problem: "missing".to_string(),
        };
        assert_eq!(v.to_string(), "items[0].commitId: missing");
    }

    #[test]
    fn test_invalid_error_counts_violations() {
        let err = FeedError::Invalid {
            url: "http://example/page0.json".to_string(),
            violations: vec![
                Violation {
                    path: "items[0].@id".to_string(),
                    problem: "missing".to_string(),
                },
                Violation {
                    path: "items[1].nuget:version".to_string(),
                    problem: "missing".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid catalog document at http://example/page0.json: 2 violation(s)"
        );
        assert_eq!(err.violations().len(), 2);
    }
}
