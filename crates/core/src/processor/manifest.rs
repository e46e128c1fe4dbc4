//! Default indexer: a content manifest of the downloaded package.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::traits::Indexer;
use super::types::IndexerError;

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    id: &'a str,
    version: &'a str,
    size_bytes: usize,
    sha256: String,
}

/// Indexer producing a small JSON manifest (size and content hash) per
/// package version. Stands in wherever a heavier domain indexer is not
/// plugged in; the artifact is still enough to verify mirrored content.
#[derive(Debug, Default)]
pub struct ManifestIndexer;

impl ManifestIndexer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Indexer for ManifestIndexer {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn build_index(
        &self,
        package_id: &str,
        version: &str,
        package: &[u8],
    ) -> Result<Option<Vec<u8>>, IndexerError> {
        let manifest = Manifest {
            id: package_id,
            version,
            size_bytes: package.len(),
            sha256: format!("{:x}", Sha256::digest(package)),
        };

        let bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| IndexerError::Failed(e.to_string()))?;
        Ok(Some(bytes))
    }
}
