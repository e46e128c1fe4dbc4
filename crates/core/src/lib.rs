pub mod audit;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod mirror;
pub mod orchestrator;
pub mod processor;
pub mod registration;
pub mod storage;
pub mod testing;
pub mod version;

pub use audit::{
    create_audit_system, AuditError, AuditHandle, AuditRecord, AuditStore, AuditWriter,
    CollectorEvent, JsonlAuditStore, MemoryAuditStore,
};
pub use catalog::{CatalogError, CatalogStore, PackageCatalog, PackageRecord, CATALOG_KEY};
pub use collector::{BatchCollector, BatchProcessor, CollectorError, RunOutcome};
pub use config::{
    load_config, load_config_from_str, validate_config, AuditConfig, CollectorSettings, Config,
    ConfigError, SourceConfig, StorageConfig,
};
pub use feed::{CatalogEntry, CatalogIndex, CatalogPage, EntryType, FeedError, PageRef, Violation};
pub use fetch::{FetchClient, FetchError, HttpFetchClient};
pub use mirror::{EntryOutcome, MirrorError, MirrorProcessor};
pub use orchestrator::{MirrorOrchestrator, OrchestratorConfig, OrchestratorStatus};
pub use processor::{
    artifact_key, CommitAction, Indexer, IndexerError, IndexingProcessor, ItemProcessor,
    ManifestIndexer, ProcessError,
};
pub use registration::{
    RegistrationClient, RegistrationError, RegistrationIndex, RegistrationLeaf, RegistrationPage,
    ResolvedVersion,
};
pub use storage::{FsStorage, MemoryStorage, Storage, StorageError};
