//! Server configuration, read from `spice-hub.toml`. Every field has a
//! default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StorageConfig {
    /// JSON catalog seed (restaurants and options).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Review journal, created if missing.
    #[serde(default = "default_reviews_path")]
    pub reviews_path: PathBuf,
    /// Upper bound on a single store call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            reviews_path: default_reviews_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,
    #[serde(default = "default_slow_query_capacity")]
    pub slow_query_capacity: usize,
}

impl MonitorConfig {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slow_query_ms: default_slow_query_ms(),
            slow_query_capacity: default_slow_query_capacity(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/catalog.json")
}
fn default_reviews_path() -> PathBuf {
    PathBuf::from("data/reviews.journal")
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_ttl_secs() -> u64 {
    300
}
fn default_slow_query_ms() -> u64 {
    100
}
fn default_slow_query_capacity() -> usize {
    100
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
