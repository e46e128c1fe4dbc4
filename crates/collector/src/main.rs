use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magpie_core::{
    create_audit_system, load_config, validate_config, AuditStore, BatchCollector, CatalogStore,
    CollectorEvent, FetchClient, FsStorage, HttpFetchClient, IndexingProcessor, JsonlAuditStore,
    ManifestIndexer, MirrorOrchestrator, MirrorProcessor, OrchestratorConfig, RegistrationClient,
    Storage,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MAGPIE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration before constructing anything
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Source catalog: {}", config.source.catalog_url);
    info!("Storage root: {:?}", config.storage.root);

    // Compute config hash for the service-started event
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create event system if configured
    let (audit_handle, writer_handle) = match &config.audit {
        Some(audit_config) => {
            let store: Arc<dyn AuditStore> = Arc::new(
                JsonlAuditStore::new(&audit_config.path)
                    .context("Failed to open event log")?,
            );
            let (handle, writer) = create_audit_system(store, audit_config.buffer_size);
            info!("Event log: {:?}", audit_config.path);
            (Some(handle), Some(tokio::spawn(writer.run())))
        }
        None => {
            info!("No event log configured");
            (None, None)
        }
    };

    if let Some(ref handle) = audit_handle {
        handle
            .emit(CollectorEvent::ServiceStarted {
                version: VERSION.to_string(),
                config_hash: config_hash_short.to_string(),
            })
            .await;
    }

    // Wire the collector stack
    let fetch: Arc<dyn FetchClient> = Arc::new(
        HttpFetchClient::new(config.collector.http_timeout_secs)
            .context("Failed to create HTTP client")?,
    );

    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.storage.root));

    let registration = Arc::new(RegistrationClient::new(
        Arc::clone(&fetch),
        config.source.registration_url.clone(),
    ));

    let item_processor = Arc::new(IndexingProcessor::new(
        Arc::clone(&fetch),
        registration,
        Arc::new(ManifestIndexer::new()),
        Arc::clone(&storage),
    ));

    let catalog_store = CatalogStore::new(Arc::clone(&storage), config.source.catalog_url.clone());
    let mirror = Arc::new(
        MirrorProcessor::load(
            item_processor,
            catalog_store,
            config.collector.max_threads,
            audit_handle.clone(),
        )
        .await
        .context("Failed to load package catalog")?,
    );

    let collector = Arc::new(
        BatchCollector::new(
            Arc::clone(&fetch),
            config.source.catalog_url.clone(),
            config.collector.batch_size,
        )
        .context("Failed to create batch collector")?,
    );

    let orchestrator = MirrorOrchestrator::new(
        OrchestratorConfig::from(&config.collector),
        collector,
        mirror,
        audit_handle.clone(),
    );

    orchestrator.start().await;
    info!("Mirror orchestrator started");

    // Run until shutdown signal
    shutdown_signal().await;

    info!("Shutting down...");
    orchestrator.stop().await;

    if let Some(ref handle) = audit_handle {
        handle
            .emit(CollectorEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;
    }

    // Drop every handle holder so the writer's channel closes, then wait
    // for it to drain.
    drop(orchestrator);
    drop(audit_handle);

    if let Some(writer_handle) = writer_handle {
        let _ = writer_handle.await;
        info!("Event writer stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
