pub mod config;
pub mod generation;
pub mod routes;

pub use config::ServerConfig;
pub use routes::{router, AppState};

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};

use llmtrack_core::ExperimentStore;
use llmtrack_metrics::{JsonExporter, ModelMonitor};

use crate::generation::OllamaBackend;

/// Build the application state from config and serve until shutdown.
pub async fn run(config: ServerConfig) -> Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let store = ExperimentStore::open(&config.snapshot_path)?;
    info!(
        experiments = store.len(),
        snapshot = %config.snapshot_path.display(),
        "experiment store ready"
    );

    let monitor = ModelMonitor::new()?;
    let backend = Arc::new(OllamaBackend::new(
        config.upstream_url.as_str(),
        config.request_timeout,
    )?);

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        monitor: monitor.clone(),
        backend,
        started_at: Instant::now(),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Serving on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The rolling summary dies with the process; surface it on the way out.
    if let Some(summary) = monitor.summary().await {
        match JsonExporter::to_string(&summary) {
            Ok(json) => info!("final request summary: {}", json),
            Err(e) => warn!("failed to render final summary: {}", e),
        }

        if let Some(path) = &config.summary_export {
            match JsonExporter::export(&summary, path).await {
                Ok(()) => info!("final summary written to {}", path.display()),
                Err(e) => warn!("failed to export summary to {}: {}", path.display(), e),
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
    }
}
