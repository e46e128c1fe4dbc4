//! Loading and persisting the package catalog document.

use std::sync::Arc;

use tracing::{info, warn};

use crate::storage::Storage;

use super::types::{CatalogError, PackageCatalog};

/// Storage key of the catalog document.
pub const CATALOG_KEY: &str = "catalog/packages.json";

/// Loads and saves the catalog document through a `Storage` backend.
pub struct CatalogStore {
    storage: Arc<dyn Storage>,
    key: String,
    source_url: String,
}

impl CatalogStore {
    /// Create a store for the catalog of `source_url` under the default key.
    pub fn new(storage: Arc<dyn Storage>, source_url: impl Into<String>) -> Self {
        Self {
            storage,
            key: CATALOG_KEY.to_string(),
            source_url: source_url.into(),
        }
    }

    /// Override the storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Load the catalog document. A missing document yields a fresh
    /// catalog with the cursor at the epoch; a present document must pass
    /// the lowercased-key invariant before it is usable.
    pub async fn load(&self) -> Result<PackageCatalog, CatalogError> {
        let Some(bytes) = self.storage.load(&self.key).await? else {
            info!("no catalog document at {}, starting fresh", self.key);
            return Ok(PackageCatalog::new(self.source_url.clone()));
        };

        let catalog: PackageCatalog =
            serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(e.to_string()))?;
        catalog.validate_keys()?;

        if catalog.catalog != self.source_url {
            warn!(
                "catalog document was built from {} but the configured source is {}",
                catalog.catalog, self.source_url
            );
        }

        Ok(catalog)
    }

    /// Persist the catalog document. The cursor is embedded in the
    /// document, so catalog state and cursor are always written atomically
    /// as one blob.
    pub async fn save(&self, catalog: &PackageCatalog) -> Result<(), CatalogError> {
        let bytes = serde_json::to_vec_pretty(catalog)
            .map_err(|e| CatalogError::Encode(e.to_string()))?;
        self.storage.save(&self.key, &bytes).await?;
        Ok(())
    }
}
