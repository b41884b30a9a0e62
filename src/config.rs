//! Stagekit configuration
//!
//! Loaded from TOML at startup, falls back to defaults if no config file
//! exists. Command-line flags override individual values afterwards.

use serde::{Deserialize, Serialize};
use stagekit_client::{DEFAULT_FETCH_PATH, DEFAULT_SUBMIT_PATH};
use stagekit_server::ServerConfig;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "stagekit.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagekitConfig {
    /// Where the client fetches and submits the assembly.
    pub source: SourceConfig,
    /// Reference server settings for `stagekit serve`.
    pub server: ServerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the source of truth, without a trailing slash.
    pub base_url: String,
    pub fetch_path: String,
    pub submit_path: String,
    /// Per-request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            fetch_path: DEFAULT_FETCH_PATH.into(),
            submit_path: DEFAULT_SUBMIT_PATH.into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: [
                "stagekit=info",
                "stagekit_client=info",
                "stagekit_state=info",
                "stagekit_server=info",
                "tower_http=info",
            ]
            .join(","),
        }
    }
}

impl StagekitConfig {
    /// Read and parse a config file. `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(toml::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Settle the outcome of [`StagekitConfig::read`], logging which config is in effect.
    pub fn from_loaded(loaded: anyhow::Result<Option<Self>>, path: &Path) -> Self {
        match loaded {
            Ok(Some(config)) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Ok(None) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Self {
        Self::from_loaded(Self::read(path), path)
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
