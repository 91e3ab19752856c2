//! Configuration schema for Coffer
//!
//! Configuration is stored at `~/.config/coffer/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local cache settings
    pub cache: CacheConfig,

    /// Remote store settings
    pub store: StoreConfig,
}

/// Local cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (default: platform cache dir + `/coffer`)
    pub root: Option<PathBuf>,
}

impl CacheConfig {
    /// The configured root, or the platform default
    pub fn root_or_default(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(Self::default_root)
    }

    /// Platform default cache root
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coffer")
    }
}

/// Which remote store implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Directory acting as a bucket
    #[default]
    Local,
    /// WebDAV-style HTTP server
    Http,
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type
    pub backend: StoreBackend,

    /// Bucket directory for the local backend
    pub path: Option<PathBuf>,

    /// Base URL for the http backend
    pub url: Option<String>,

    /// Name of the environment variable holding a bearer token
    pub token_env: Option<String>,

    /// Request timeout for the http backend
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Platform default bucket directory for the local backend
    pub fn default_local_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coffer")
            .join("store")
    }
}

impl Config {
    /// Check values that parse but can never work
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("store.timeout_secs must be at least 1".to_string());
        }
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("store.url must be an http(s) URL, got {:?}", url));
            }
        }
        if self.token_env.as_deref().is_some_and(str::is_empty) {
            return Err("store.token_env must name an environment variable".to_string());
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            path: None,
            url: None,
            token_env: None,
            timeout_secs: 300,
        }
    }
}
