//! Remote object store adapters
//!
//! The datastore only needs four operations from a remote store, and it
//! assumes an object is either fully there or not there at all:
//!
//! | Operation | Contract |
//! |-----------|----------|
//! | `exists` | `true` only once an upload has completed |
//! | `get` | Streams the object, `ObjectNotFound` if absent |
//! | `put` | Replaces any existing object atomically |
//! | `delete_prefix` | Removes every object under a key prefix |
//!
//! Backends:
//! - [`LocalObjectStore`]: a directory acting as a bucket (shared disks, tests)
//! - [`HttpObjectStore`]: WebDAV-style HTTP server (`HEAD`/`GET`/`PUT`/`DELETE`)

pub mod http;
pub mod local;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

use crate::config::schema::{StoreBackend, StoreConfig};
use crate::error::{CofferError, CofferResult};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Abstract remote object store
pub trait ObjectStore: Send + Sync {
    /// Check whether a fully uploaded object exists at `key`
    fn exists(&self, key: &str) -> CofferResult<bool>;

    /// Stream the object at `key` into `dest`, returning the byte count
    fn get(&self, key: &str, dest: &mut dyn Write) -> CofferResult<u64>;

    /// Upload `source` to `key`, replacing any existing object
    fn put(&self, key: &str, source: &mut dyn Read) -> CofferResult<u64>;

    /// Delete every object whose key starts with `prefix`
    fn delete_prefix(&self, prefix: &str) -> CofferResult<()>;

    /// Human-readable location for display
    fn describe(&self) -> String;
}

/// Create the store selected by configuration
pub fn create_store(config: &StoreConfig) -> CofferResult<Arc<dyn ObjectStore>> {
    match config.backend {
        StoreBackend::Local => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(StoreConfig::default_local_path);
            Ok(Arc::new(LocalObjectStore::new(path)))
        }
        StoreBackend::Http => {
            let url = config.url.clone().ok_or_else(|| CofferError::ConfigInvalid {
                path: PathBuf::from("[store]"),
                reason: "backend = \"http\" requires url".to_string(),
            })?;

            let token = match &config.token_env {
                Some(var) => Some(std::env::var(var).map_err(|_| CofferError::ConfigInvalid {
                    path: PathBuf::from("[store]"),
                    reason: format!("token_env names {} but it is not set", var),
                })?),
                None => None,
            };

            Ok(Arc::new(HttpObjectStore::new(
                url,
                token,
                Duration::from_secs(config.timeout_secs),
            )))
        }
    }
}
