use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the tracking server. Every field has a default
/// so a config file only needs to name what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP service listens on.
    pub bind_addr: String,

    /// Base URL of the upstream generation service.
    pub upstream_url: String,

    /// Path of the experiment snapshot file.
    pub snapshot_path: PathBuf,

    /// Upstream request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Optional file the final metrics summary is written to on shutdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_export: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            upstream_url: "http://localhost:11434".to_string(),
            snapshot_path: PathBuf::from("experiments.json"),
            request_timeout: Duration::from_secs(120),
            summary_export: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.is_empty() {
            return Err("bind_addr cannot be empty".to_string());
        }
        if self.upstream_url.is_empty() {
            return Err("upstream_url cannot be empty".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

pub async fn load_config_from_file(path: impl AsRef<Path>) -> Result<ServerConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let extension = path.extension().and_then(|s| s.to_str());

    let config: ServerConfig = match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
        Some("toml") => toml::from_str(&contents)?,
        Some("json") => serde_json::from_str(&contents)?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported config format. Use .yaml, .yml, .toml, or .json"
            ))
        }
    };

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
