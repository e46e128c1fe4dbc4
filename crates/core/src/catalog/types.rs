//! The package catalog document: the mirror's sole durable state.
//!
//! A single JSON document holding one record per package plus the cursor
//! (`lastUpdated`). The field spellings and the lowercased-key invariant
//! are part of the persisted contract; loading and saving must round-trip
//! the document without semantic drift.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors for catalog document operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to decode package catalog: {0}")]
    Decode(String),

    #[error("failed to encode package catalog: {0}")]
    Encode(String),

    /// The cursor may only move forward. A backward move is a programming
    /// error; nothing is persisted.
    #[error("cursor regression: {from} -> {to}")]
    CursorRegression {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// A loaded document carries a package key that is not lowercased.
    #[error("package key not lowercased: {0}")]
    KeyCasing(String),
}

/// The current state of one package in the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package id in its original casing.
    pub id: String,
    /// Latest stable version, if one was resolved.
    #[serde(rename = "latestStableVersion", skip_serializing_if = "Option::is_none")]
    pub latest_stable_version: Option<String>,
    /// Whether a derived index artifact exists for this version.
    #[serde(rename = "haveIdx")]
    pub have_idx: bool,
    /// Upstream commit id that produced this record.
    #[serde(rename = "commitId")]
    pub commit_id: String,
    /// Upstream commit timestamp that produced this record.
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,
    /// Artifact download URL.
    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// The whole catalog document.
///
/// `packages` is keyed by lowercased package id; `BTreeMap` keeps the
/// serialized document stable across load/save cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageCatalog {
    /// Root URL of the source feed this catalog mirrors.
    pub catalog: String,
    /// The cursor: last fully-processed commit timestamp.
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    /// Lowercased package id -> record.
    #[serde(default)]
    pub packages: BTreeMap<String, PackageRecord>,
}

impl PackageCatalog {
    /// A fresh catalog for a source feed, cursor at the epoch.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            catalog: source.into(),
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            packages: BTreeMap::new(),
        }
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the catalog holds no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Look up a package by id, case-insensitively.
    pub fn get(&self, package_id: &str) -> Option<&PackageRecord> {
        self.packages.get(&package_id.to_lowercase())
    }

    /// Insert or overwrite the record for a package. Existing records are
    /// overwritten field by field, never merged.
    pub fn set_latest_stable(
        &mut self,
        package_id: &str,
        version: &str,
        commit_id: &str,
        commit_timestamp: DateTime<Utc>,
        download_url: Option<String>,
        have_idx: bool,
    ) {
        self.packages.insert(
            package_id.to_lowercase(),
            PackageRecord {
                id: package_id.to_string(),
                latest_stable_version: Some(version.to_string()),
                have_idx,
                commit_id: commit_id.to_string(),
                commit_timestamp,
                download_url,
            },
        );
    }

    /// Remove a package. Removing an absent package is a no-op; returns
    /// whether a record was actually removed.
    pub fn delist(&mut self, package_id: &str) -> bool {
        self.packages.remove(&package_id.to_lowercase()).is_some()
    }

    /// Advance the cursor. The cursor is monotonic; moving it backward is
    /// an invariant violation.
    pub fn advance_cursor(&mut self, to: DateTime<Utc>) -> Result<(), CatalogError> {
        if to < self.last_updated {
            return Err(CatalogError::CursorRegression {
                from: self.last_updated,
                to,
            });
        }
        self.last_updated = to;
        Ok(())
    }

    /// Check the lowercased-key invariant, e.g. after loading a document
    /// from storage.
    pub fn validate_keys(&self) -> Result<(), CatalogError> {
        for key in self.packages.keys() {
            if key != &key.to_lowercase() {
                return Err(CatalogError::KeyCasing(key.clone()));
            }
        }
        Ok(())
    }
}
