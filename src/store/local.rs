//! Directory-backed object store
//!
//! Objects live at `{root}/{key}`. Uploads are written to a temporary file in
//! `{root}/.incoming/` and renamed into place, so a reader never observes a
//! partial object.

use super::ObjectStore;
use crate::error::{CofferError, CofferResult};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const INCOMING_DIR: &str = ".incoming";

/// Object store rooted at a local (or network-mounted) directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> CofferResult<PathBuf> {
        let rel = Path::new(key.trim_end_matches('/'));
        let safe = !rel.as_os_str().is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)))
            && !key.starts_with(INCOMING_DIR);
        if !safe {
            return Err(CofferError::invalid_key(key, "not a relative object path"));
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for LocalObjectStore {
    fn exists(&self, key: &str) -> CofferResult<bool> {
        Ok(self.object_path(key)?.is_file())
    }

    fn get(&self, key: &str, dest: &mut dyn Write) -> CofferResult<u64> {
        let path = self.object_path(key)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CofferError::ObjectNotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(CofferError::io(format!("opening {}", path.display()), e)),
        };

        io::copy(&mut file, dest).map_err(|e| CofferError::io(format!("reading {}", key), e))
    }

    fn put(&self, key: &str, source: &mut dyn Read) -> CofferResult<u64> {
        let path = self.object_path(key)?;
        let incoming = self.root.join(INCOMING_DIR);
        fs::create_dir_all(&incoming)
            .map_err(|e| CofferError::io(format!("creating {}", incoming.display()), e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&incoming)
            .map_err(|e| CofferError::io(format!("creating upload file in {}", incoming.display()), e))?;
        let bytes = io::copy(source, &mut tmp)
            .map_err(|e| CofferError::io(format!("uploading {}", key), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CofferError::io(format!("syncing upload of {}", key), e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CofferError::io(format!("creating {}", parent.display()), e))?;
        }
        tmp.persist(&path)
            .map_err(|e| CofferError::io(format!("publishing {}", path.display()), e.error))?;

        debug!(key, bytes, "stored object");
        Ok(bytes)
    }

    fn delete_prefix(&self, prefix: &str) -> CofferResult<()> {
        let path = self.object_path(prefix)?;
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CofferError::io(format!("deleting {}", path.display()), e)),
        }
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}
