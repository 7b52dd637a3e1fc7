use anyhow::Result;
use llmtrack_server::config::{load_config_from_file, ServerConfig};
use std::path::PathBuf;
use tracing::info;

pub async fn execute(
    config_file: Option<PathBuf>,
    bind: Option<String>,
    upstream: Option<String>,
    snapshot: Option<PathBuf>,
    summary_export: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_file {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_config_from_file(&path).await?
        }
        None => ServerConfig::default(),
    };

    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    if let Some(upstream) = upstream {
        config.upstream_url = upstream;
    }
    if let Some(snapshot) = snapshot {
        config.snapshot_path = snapshot;
    }
    if let Some(path) = summary_export {
        config.summary_export = Some(path);
    }

    info!("Upstream generation service: {}", config.upstream_url);
    llmtrack_server::run(config).await
}
