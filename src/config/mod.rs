//! Configuration management for Coffer

pub mod schema;

pub use schema::Config;

use crate::error::{CofferError, CofferResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coffer")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> CofferResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file {} not found, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CofferResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CofferError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CofferError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file.
    ///
    /// Values that could never reach a store are refused and the file on
    /// disk is left as it was. Loading stays lenient so a broken file can
    /// still be repaired with `coffer config set` or `init --force`.
    pub async fn save(&self, config: &Config) -> CofferResult<()> {
        config.validate().map_err(|reason| CofferError::ConfigInvalid {
            path: self.config_path.clone(),
            reason,
        })?;
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CofferError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CofferResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CofferError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StoreBackend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.store.backend, StoreBackend::Local);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path.clone());

        let mut config = Config::default();
        config.cache.root = Some(temp.path().join("cache"));
        config.store.backend = StoreBackend::Http;
        config.store.url = Some("https://dav.example.com/artifacts".to_string());

        manager.save(&config).await.unwrap();
        assert!(path.exists());
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.cache.root, Some(temp.path().join("cache")));
        assert_eq!(loaded.store.backend, StoreBackend::Http);
        assert_eq!(loaded.store.url.as_deref(), Some("https://dav.example.com/artifacts"));
    }

    #[tokio::test]
    async fn save_refuses_unusable_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path.clone());
        manager.save(&Config::default()).await.unwrap();

        let mut config = Config::default();
        config.store.timeout_secs = 0;
        let err = manager.save(&config).await.unwrap_err();
        assert!(matches!(err, CofferError::ConfigInvalid { path: ref reported, .. } if *reported == path));

        let on_disk = manager.load().await.unwrap();
        assert_eq!(on_disk.store.timeout_secs, 300);
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[store]\nbackend = 42\n").await.unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            CofferError::ConfigInvalid { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }
}
