//! On-disk layout of the cache root and atomic installation

use crate::cache::lock::with_lock;
use crate::coordinate::{Coordinate, Kind, ARTIFACTS_DIR};
use crate::error::{CofferError, CofferResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Directory under the cache root where downloads are staged before install
pub const STAGING_DIR: &str = "staging";

/// Outcome of moving a staged artifact into place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The staged artifact now lives at the canonical path
    Installed,
    /// Another installer got there first; the staged copy was discarded
    AlreadyPresent,
}

/// A present cache entry
#[derive(Debug, Clone, Serialize)]
pub struct CachedEntry {
    pub coordinate: Coordinate,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub cached_at: DateTime<Utc>,
}

/// The cache root and everything under it
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Use `root` as the cache root. Nothing is created until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical location of a coordinate's entry
    pub fn entry_path(&self, coordinate: &Coordinate) -> PathBuf {
        coordinate.local_path(&self.root)
    }

    /// Whether the entry is present. Presence is purely structural.
    pub fn is_present(&self, coordinate: &Coordinate) -> bool {
        let path = self.entry_path(coordinate);
        match coordinate.kind() {
            Kind::File => path.is_file(),
            Kind::Directory => path.is_dir(),
        }
    }

    /// Run `body` holding the coordinate's lock
    pub fn with_lock<T>(
        &self,
        coordinate: &Coordinate,
        body: impl FnOnce() -> CofferResult<T>,
    ) -> CofferResult<T> {
        with_lock(&coordinate.lock_path(&self.root), body)
    }

    /// Create a fresh staging directory on the same filesystem as the entries.
    ///
    /// The directory and anything left in it are removed when the returned
    /// value is dropped, so a failed download never leaves debris behind.
    pub fn staging(&self) -> CofferResult<TempDir> {
        let staging_root = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging_root).map_err(|e| {
            CofferError::io(format!("creating staging dir {}", staging_root.display()), e)
        })?;

        tempfile::Builder::new()
            .prefix("partial-")
            .tempdir_in(&staging_root)
            .map_err(|e| {
                CofferError::io(format!("creating staging dir in {}", staging_root.display()), e)
            })
    }

    /// Atomically move `staged` to the coordinate's canonical path.
    ///
    /// The canonical path is rechecked first: if a racing installer already
    /// finished, the staged copy is left for the caller's staging cleanup.
    pub fn install(&self, staged: &Path, coordinate: &Coordinate) -> CofferResult<InstallOutcome> {
        let dest = self.entry_path(coordinate);
        if dest.exists() {
            debug!(path = %dest.display(), "entry appeared while staging, discarding download");
            return Ok(InstallOutcome::AlreadyPresent);
        }

        let parent = dest.parent().ok_or_else(|| CofferError::Install {
            path: dest.clone(),
            reason: "entry path has no parent".to_string(),
        })?;
        fs::create_dir_all(parent)
            .map_err(|e| CofferError::io(format!("creating {}", parent.display()), e))?;

        match fs::rename(staged, &dest) {
            Ok(()) => {
                sync_dir_best_effort(parent);
                debug!(path = %dest.display(), "installed cache entry");
                Ok(InstallOutcome::Installed)
            }
            // Lost a rename race against an installer outside our lock scope
            Err(_) if dest.exists() => Ok(InstallOutcome::AlreadyPresent),
            Err(e) => Err(CofferError::io(
                format!("moving {} to {}", staged.display(), dest.display()),
                e,
            )),
        }
    }

    /// Remove a present entry. Returns whether anything was removed.
    ///
    /// Callers hold the coordinate lock so no installer is mid-rename.
    pub fn remove_entry(&self, coordinate: &Coordinate) -> CofferResult<bool> {
        let path = self.entry_path(coordinate);
        let result = match coordinate.kind() {
            Kind::File => fs::remove_file(&path),
            Kind::Directory => fs::remove_dir_all(&path),
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CofferError::io(format!("removing {}", path.display()), e)),
        }
    }

    /// List every present entry under the artifacts area.
    ///
    /// Anything that does not match the layout is skipped.
    pub fn entries(&self) -> CofferResult<Vec<CachedEntry>> {
        let artifacts = self.root.join(ARTIFACTS_DIR);
        let mut entries = Vec::new();

        for group in read_dir_names(&artifacts)? {
            let group_dir = artifacts.join(&group);
            for name in read_dir_names(&group_dir)? {
                let name_dir = group_dir.join(&name);
                for version in read_dir_names(&name_dir)? {
                    let Ok(version_num) = version.parse::<u32>() else {
                        continue;
                    };
                    let version_dir = name_dir.join(&version);
                    for entry_name in read_dir_names(&version_dir)? {
                        let Some(kind) = Kind::from_entry_name(&entry_name) else {
                            continue;
                        };
                        let Ok(coordinate) = Coordinate::new(&group, &name, version_num, kind)
                        else {
                            continue;
                        };
                        if !self.is_present(&coordinate) {
                            continue;
                        }
                        let path = version_dir.join(&entry_name);
                        let metadata = fs::metadata(&path)
                            .map_err(|e| CofferError::io(format!("reading {}", path.display()), e))?;
                        let cached_at = metadata
                            .modified()
                            .map(DateTime::<Utc>::from)
                            .unwrap_or_else(|_| Utc::now());

                        entries.push(CachedEntry {
                            size_bytes: disk_usage(&path)?,
                            coordinate,
                            path,
                            cached_at,
                        });
                    }
                }
            }
        }

        entries.sort_by(|a, b| {
            (a.coordinate.group(), a.coordinate.name(), a.coordinate.version())
                .cmp(&(b.coordinate.group(), b.coordinate.name(), b.coordinate.version()))
        });
        Ok(entries)
    }

    /// Delete the whole cache root.
    ///
    /// Must not run concurrently with resolutions against the same root.
    pub fn wipe(&self) -> CofferResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CofferError::io(
                format!("wiping cache root {}", self.root.display()),
                e,
            )),
        }
    }
}

/// Total size of regular files at or below `path`
pub fn disk_usage(path: &Path) -> CofferResult<u64> {
    let mut total = 0u64;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn read_dir_names(dir: &Path) -> CofferResult<Vec<String>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CofferError::io(format!("listing {}", dir.display()), e)),
    };

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| CofferError::io(format!("listing {}", dir.display()), e))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
            warn!(dir = %dir.display(), error = %e, "failed to sync directory after install");
        }
    }

    #[cfg(not(unix))]
    let _ = dir;
}
