//! Parsing of catalog feed documents.
//!
//! Documents are deserialized into weakly-typed wire structs first, then
//! validated in a single pass that collects every violation. Required-field
//! problems in the index or a page are fatal to the caller because it
//! cannot know what it would be skipping.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::types::{
    CatalogEntry, CatalogIndex, CatalogPage, EntryType, FeedError, PageRef, Violation,
};

// ============================================================================
// Wire types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default)]
    items: Vec<RawPageRef>,
}

#[derive(Debug, Deserialize)]
struct RawPageRef {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "commitTimeStamp")]
    commit_timestamp: Option<DateTime<Utc>>,
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    items: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@type")]
    entry_type: Option<Value>,
    #[serde(rename = "commitId")]
    commit_id: Option<String>,
    #[serde(rename = "commitTimeStamp")]
    commit_timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "nuget:id")]
    package_id: Option<String>,
    #[serde(rename = "nuget:version")]
    package_version: Option<String>,
}

/// The wire `@type` is either a string or an array of strings.
fn type_tags(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn classify_entry_type(value: &Value) -> Option<EntryType> {
    let tags = type_tags(value);
    if tags.iter().any(|t| t.to_lowercase().contains("delete")) {
        Some(EntryType::Delete)
    } else if tags.iter().any(|t| t.to_lowercase().contains("details")) {
        Some(EntryType::Details)
    } else {
        None
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse and validate the catalog root index.
pub fn parse_index(url: &str, doc: &Value) -> Result<CatalogIndex, FeedError> {
    let raw: RawIndex = serde_json::from_value(doc.clone()).map_err(|e| FeedError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut violations = Vec::new();
    let mut pages = Vec::new();

    for (i, item) in raw.items.iter().enumerate() {
        let mut ok = true;
        if item.id.as_deref().unwrap_or("").is_empty() {
            violations.push(Violation {
                path: format!("items[{}].@id", i),
                problem: "missing or empty".to_string(),
            });
            ok = false;
        }
        if item.commit_timestamp.is_none() {
            violations.push(Violation {
                path: format!("items[{}].commitTimeStamp", i),
                problem: "missing or not a timestamp".to_string(),
            });
            ok = false;
        }
        if ok {
            pages.push(PageRef {
                url: item.id.clone().unwrap_or_default(),
                published: item.commit_timestamp.unwrap_or_default(),
                count: item.count,
            });
        }
    }

    if !violations.is_empty() {
        return Err(FeedError::Invalid {
            url: url.to_string(),
            violations,
        });
    }

    pages.sort_by_key(|p| p.published);

    Ok(CatalogIndex {
        url: url.to_string(),
        pages,
    })
}

/// Parse and validate one catalog page.
pub fn parse_page(url: &str, doc: &Value) -> Result<CatalogPage, FeedError> {
    let raw: RawPage = serde_json::from_value(doc.clone()).map_err(|e| FeedError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut violations = Vec::new();
    let mut entries = Vec::new();

    for (i, item) in raw.items.iter().enumerate() {
        let mut ok = true;

        if item.id.as_deref().unwrap_or("").is_empty() {
            violations.push(Violation {
                path: format!("items[{}].@id", i),
                problem: "missing or empty".to_string(),
            });
            ok = false;
        }

        let entry_type = item.entry_type.as_ref().and_then(classify_entry_type);
        if entry_type.is_none() {
            violations.push(Violation {
                path: format!("items[{}].@type", i),
                problem: "missing or not a known entry type".to_string(),
            });
            ok = false;
        }

        if item.commit_id.as_deref().unwrap_or("").is_empty() {
            violations.push(Violation {
                path: format!("items[{}].commitId", i),
                problem: "missing or empty".to_string(),
            });
            ok = false;
        }
        if item.commit_timestamp.is_none() {
            violations.push(Violation {
                path: format!("items[{}].commitTimeStamp", i),
                problem: "missing or not a timestamp".to_string(),
            });
            ok = false;
        }
        if item.package_id.as_deref().unwrap_or("").is_empty() {
            violations.push(Violation {
                path: format!("items[{}].nuget:id", i),
                problem: "missing or empty".to_string(),
            });
            ok = false;
        }
        if item.package_version.as_deref().unwrap_or("").is_empty() {
            violations.push(Violation {
                path: format!("items[{}].nuget:version", i),
                problem: "missing or empty".to_string(),
            });
            ok = false;
        }

        if ok {
            entries.push(CatalogEntry {
                entry_url: item.id.clone().unwrap_or_default(),
                entry_type: entry_type.unwrap_or(EntryType::Details),
                commit_id: item.commit_id.clone().unwrap_or_default(),
                commit_timestamp: item.commit_timestamp.unwrap_or_default(),
                package_id: item.package_id.clone().unwrap_or_default(),
                package_version: item.package_version.clone().unwrap_or_default(),
            });
        }
    }

    if !violations.is_empty() {
        return Err(FeedError::Invalid {
            url: url.to_string(),
            violations,
        });
    }

    entries.sort_by(|a, b| a.commit_timestamp.cmp(&b.commit_timestamp));

    Ok(CatalogPage {
        url: url.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_index() {
        let doc = json!({
            "@id": "http://feed/index.json",
            "items": [
                { "@id": "http://feed/page1.json", "commitTimeStamp": "2024-02-01T00:00:00Z", "count": 10 },
                { "@id": "http://feed/page0.json", "commitTimeStamp": "2024-01-01T00:00:00Z", "count": 540 }
            ]
        });

        let index = parse_index("http://feed/index.json", &doc).unwrap();
        assert_eq!(index.pages.len(), 2);
        // Sorted ascending by published timestamp.
        assert_eq!(index.pages[0].url, "http://feed/page0.json");
        assert_eq!(index.pages[1].url, "http://feed/page1.json");
        assert_eq!(index.pages[0].count, Some(540));
    }

    #[test]
    fn test_parse_index_empty_items() {
        let doc = json!({ "items": [] });
        let index = parse_index("http://feed/index.json", &doc).unwrap();
        assert!(index.pages.is_empty());
    }

    #[test]
    fn test_parse_index_collects_all_violations() {
        let doc = json!({
            "items": [
                { "commitTimeStamp": "2024-01-01T00:00:00Z" },
                { "@id": "http://feed/page1.json" }
            ]
        });

        let err = parse_index("http://feed/index.json", &doc).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "items[0].@id");
        assert_eq!(violations[1].path, "items[1].commitTimeStamp");
    }

    #[test]
    fn test_parse_page() {
        let doc = json!({
            "items": [
                {
                    "@id": "http://feed/entries/pkg.2.0.0.json",
                    "@type": "nuget:PackageDetails",
                    "commitId": "c2",
                    "commitTimeStamp": "2024-01-02T00:00:00Z",
                    "nuget:id": "Pkg",
                    "nuget:version": "2.0.0"
                },
                {
                    "@id": "http://feed/entries/pkg.1.0.0.json",
                    "@type": ["nuget:PackageDelete"],
                    "commitId": "c1",
                    "commitTimeStamp": "2024-01-01T00:00:00Z",
                    "nuget:id": "Pkg",
                    "nuget:version": "1.0.0"
                }
            ]
        });

        let page = parse_page("http://feed/page0.json", &doc).unwrap();
        assert_eq!(page.entries.len(), 2);
        // Sorted ascending by commit timestamp.
        assert_eq!(page.entries[0].package_version, "1.0.0");
        assert_eq!(page.entries[0].entry_type, EntryType::Delete);
        assert_eq!(page.entries[1].package_version, "2.0.0");
        assert_eq!(page.entries[1].entry_type, EntryType::Details);
    }

    #[test]
    fn test_parse_page_unknown_type_is_violation() {
        let doc = json!({
            "items": [
                {
                    "@id": "http://feed/entries/pkg.1.0.0.json",
                    "@type": "nuget:SomethingElse",
                    "commitId": "c1",
                    "commitTimeStamp": "2024-01-01T00:00:00Z",
                    "nuget:id": "Pkg",
                    "nuget:version": "1.0.0"
                }
            ]
        });

        let err = parse_page("http://feed/page0.json", &doc).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].path, "items[0].@type");
    }

    #[test]
    fn test_parse_page_missing_fields_all_reported() {
        let doc = json!({
            "items": [
                { "@id": "http://feed/entries/x.json", "@type": "nuget:PackageDetails" }
            ]
        });

        let err = parse_page("http://feed/page0.json", &doc).unwrap_err();
        // commitId, commitTimeStamp, nuget:id, nuget:version all missing.
        assert_eq!(err.violations().len(), 4);
    }

    #[test]
    fn test_parse_page_not_an_object() {
        let doc = json!([1, 2, 3]);
        let err = parse_page("http://feed/page0.json", &doc).unwrap_err();
        assert!(matches!(err, FeedError::Malformed { .. }));
    }
}
