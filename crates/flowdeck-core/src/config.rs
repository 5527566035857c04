// flowdeck Core - Application configuration
//
// Loaded from an optional TOML file; every field has a default so an absent
// or partial file is valid.

use crate::error::{FlowdeckError, FlowdeckResult};
use crate::flow::DEFAULT_AUTHOR;
use crate::layout::FlowLayout;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the documents root
pub const ROOT_ENV: &str = "FLOWDECK_ROOT";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "FLOWDECK_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowdeckConfig {
    /// Base directory; flows live in `<documents_root>/flows`
    pub documents_root: PathBuf,

    /// Author written into new flows
    pub author: String,

    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the documents root is rescanned
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for FlowdeckConfig {
    fn default() -> Self {
        Self {
            documents_root: default_documents_root(),
            author: DEFAULT_AUTHOR.to_string(),
            watch: WatchConfig::default(),
        }
    }
}

impl FlowdeckConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> FlowdeckResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowdeckError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let mut config: FlowdeckConfig = toml::from_str(&content).map_err(|e| {
            FlowdeckError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        config.documents_root = expand_home(&config.documents_root);
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the first config that applies: explicit path, then the per-user
    /// config file if it exists, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> FlowdeckResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match user_config_file() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Override the documents root (from `--root` / `FLOWDECK_ROOT`)
    pub fn with_documents_root(mut self, root: impl AsRef<Path>) -> Self {
        self.documents_root = expand_home(root.as_ref());
        self
    }

    pub fn layout(&self) -> FlowLayout {
        FlowLayout::new(self.documents_root.clone())
    }
}

/// `<config_dir>/flowdeck/config.toml`
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowdeck").join("config.toml"))
}

fn default_documents_root() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flowdeck")
}

/// Replace a leading `~` with the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
