//! Publish artifacts to a remote store and resolve them to local paths
//!
//! A [`Datastore`] owns exactly one cache root and one store handle. Resolution
//! follows double-checked locking:
//!
//! 1. Entry present: return its path, no lock, no remote call
//! 2. Otherwise take the coordinate lock and check again
//! 3. Still absent: ask the store whether the object exists
//! 4. Download into staging, unpack directories, rename into place
//!
//! Every resolver of one coordinate that reaches step 2 is serialized by the
//! lock, so each coordinate is downloaded at most once per cache root.
//!
//! Publishing writes straight to the store and never touches the cache. A
//! warm entry keeps serving the content it was installed with until it is
//! evicted or the cache is wiped.

use crate::archive::{pack_directory, unpack_archive};
use crate::cache::{CacheDir, CachedEntry, InstallOutcome};
use crate::config::Config;
use crate::coordinate::{Coordinate, Kind};
use crate::error::{CofferError, CofferResult};
use crate::store::{create_store, ObjectStore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Name of the downloaded archive inside a staging directory
const STAGED_ARCHIVE: &str = "archive.tar.gz";

/// Outcome of resolving a coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The entry is present at this path
    Found(PathBuf),
    /// Nothing is published at this coordinate
    NotFound(Coordinate),
}

impl Resolution {
    /// Convert a miss into [`CofferError::DoesNotExist`]
    pub fn into_path(self) -> CofferResult<PathBuf> {
        match self {
            Self::Found(path) => Ok(path),
            Self::NotFound(coordinate) => Err(CofferError::does_not_exist(coordinate)),
        }
    }
}

/// Record of a completed upload
#[derive(Debug, Clone, Serialize)]
pub struct Published {
    pub coordinate: Coordinate,
    pub key: String,
    pub bytes: u64,
    /// SHA-256 of the uploaded object, lowercase hex
    pub sha256: String,
}

/// Versioned artifact cache backed by a remote object store
#[derive(Clone)]
pub struct Datastore {
    cache: CacheDir,
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastore")
            .field("cache_root", &self.cache.root())
            .field("store", &self.store.describe())
            .finish()
    }
}

impl Datastore {
    /// Create a datastore over `cache_root` and `store`
    pub fn new(cache_root: impl Into<PathBuf>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            cache: CacheDir::new(cache_root),
            store,
        }
    }

    /// Build from configuration, with an optional cache root override
    pub fn from_config(config: &Config, cache_root: Option<PathBuf>) -> CofferResult<Self> {
        let root = cache_root.unwrap_or_else(|| config.cache.root_or_default());
        let store = create_store(&config.store)?;
        debug!(cache_root = %root.display(), store = %store.describe(), "opened datastore");
        Ok(Self::new(root, store))
    }

    pub fn cache_dir(&self) -> &CacheDir {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Upload a single file to `group:name:version`
    pub fn publish_file(
        &self,
        path: &Path,
        group: &str,
        name: &str,
        version: u32,
    ) -> CofferResult<Published> {
        let coordinate = Coordinate::new(group, name, version, Kind::File)?;
        if !path.is_file() {
            return Err(not_a(path, "regular file"));
        }

        let file = File::open(path)
            .map_err(|e| CofferError::io(format!("opening {}", path.display()), e))?;
        self.upload(coordinate, BufReader::new(file))
    }

    /// Archive a directory tree and upload it to `group:name:version`
    pub fn publish_directory(
        &self,
        path: &Path,
        group: &str,
        name: &str,
        version: u32,
    ) -> CofferResult<Published> {
        let coordinate = Coordinate::new(group, name, version, Kind::Directory)?;
        if !path.is_dir() {
            return Err(not_a(path, "directory"));
        }

        let archive = tempfile::Builder::new()
            .prefix("coffer-publish-")
            .suffix(".tar.gz")
            .tempfile()
            .map_err(|e| CofferError::io("creating temporary archive", e))?;
        let stats = pack_directory(path, archive.as_file())?;
        debug!(
            src = %path.display(),
            files = stats.files,
            directories = stats.directories,
            "archived directory for upload"
        );

        let packed = archive
            .reopen()
            .map_err(|e| CofferError::io("reopening temporary archive", e))?;
        self.upload(coordinate, BufReader::new(packed))
    }

    /// Resolve a file coordinate to its cached path, downloading on a miss
    pub fn file_path(&self, group: &str, name: &str, version: u32) -> CofferResult<PathBuf> {
        let coordinate = Coordinate::new(group, name, version, Kind::File)?;
        self.resolve(&coordinate)?.into_path()
    }

    /// Resolve a directory coordinate to its cached, unpacked tree
    pub fn directory_path(&self, group: &str, name: &str, version: u32) -> CofferResult<PathBuf> {
        let coordinate = Coordinate::new(group, name, version, Kind::Directory)?;
        self.resolve(&coordinate)?.into_path()
    }

    /// Resolve any coordinate, reporting a miss as [`Resolution::NotFound`]
    pub fn resolve(&self, coordinate: &Coordinate) -> CofferResult<Resolution> {
        let path = self.cache.entry_path(coordinate);
        if self.cache.is_present(coordinate) {
            debug!(coordinate = %coordinate, "cache hit");
            return Ok(Resolution::Found(path));
        }

        self.cache.with_lock(coordinate, || {
            if self.cache.is_present(coordinate) {
                debug!(coordinate = %coordinate, "installed while waiting for lock");
                return Ok(Resolution::Found(path.clone()));
            }

            let key = coordinate.remote_key();
            if !self.store.exists(&key)? {
                debug!(coordinate = %coordinate, key = %key, "not published");
                return Ok(Resolution::NotFound(coordinate.clone()));
            }

            match self.download(coordinate, &key) {
                Ok(_) => Ok(Resolution::Found(path.clone())),
                // Unpublished between `exists` and `get`
                Err(CofferError::ObjectNotFound { .. }) => {
                    Ok(Resolution::NotFound(coordinate.clone()))
                }
                Err(e) => Err(e),
            }
        })
    }

    /// Whether the coordinate is present in the local cache
    pub fn is_cached(&self, coordinate: &Coordinate) -> bool {
        self.cache.is_present(coordinate)
    }

    /// Remove one coordinate's local entry. Returns whether anything was removed.
    pub fn evict(&self, coordinate: &Coordinate) -> CofferResult<bool> {
        self.cache.with_lock(coordinate, || {
            let removed = self.cache.remove_entry(coordinate)?;
            if removed {
                info!(coordinate = %coordinate, "evicted cache entry");
            }
            Ok(removed)
        })
    }

    /// Delete both kinds of `group:name:version` from the remote store.
    ///
    /// Local caches keep whatever they already hold.
    pub fn unpublish(&self, group: &str, name: &str, version: u32) -> CofferResult<()> {
        let coordinate = Coordinate::new(group, name, version, Kind::File)?;
        let prefix = coordinate.remote_prefix();
        self.store.delete_prefix(&prefix)?;
        info!(prefix = %prefix, store = %self.store.describe(), "unpublished");
        Ok(())
    }

    /// Every present entry in the local cache
    pub fn cached_entries(&self) -> CofferResult<Vec<CachedEntry>> {
        self.cache.entries()
    }

    /// Delete the whole cache root.
    ///
    /// Must not run while other resolutions against the same root are in flight.
    pub fn wipe_cache(&self) -> CofferResult<()> {
        self.cache.wipe()?;
        info!(cache_root = %self.cache.root().display(), "wiped cache");
        Ok(())
    }

    fn upload(&self, coordinate: Coordinate, source: impl Read) -> CofferResult<Published> {
        let key = coordinate.remote_key();
        let mut hashing = HashingReader::new(source);
        let started = Instant::now();
        let bytes = self.store.put(&key, &mut hashing)?;

        let published = Published {
            sha256: hashing.hex_digest(),
            coordinate,
            key,
            bytes,
        };
        info!(
            coordinate = %published.coordinate,
            key = %published.key,
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "published"
        );
        Ok(published)
    }

    /// Download into a fresh staging directory and install. Caller holds the lock.
    fn download(&self, coordinate: &Coordinate, key: &str) -> CofferResult<InstallOutcome> {
        let staging = self.cache.staging()?;
        let started = Instant::now();

        let (staged, bytes) = match coordinate.kind() {
            Kind::File => {
                let target = staging.path().join(Kind::File.entry_name());
                let bytes = self.fetch_to(key, &target)?;
                (target, bytes)
            }
            Kind::Directory => {
                let archive = staging.path().join(STAGED_ARCHIVE);
                let bytes = self.fetch_to(key, &archive)?;
                let tree = staging.path().join(Kind::Directory.entry_name());
                let file = File::open(&archive)
                    .map_err(|e| CofferError::io(format!("opening {}", archive.display()), e))?;
                unpack_archive(BufReader::new(file), &tree)?;
                (tree, bytes)
            }
        };

        let outcome = self.cache.install(&staged, coordinate)?;
        info!(
            coordinate = %coordinate,
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downloaded"
        );
        Ok(outcome)
    }

    fn fetch_to(&self, key: &str, target: &Path) -> CofferResult<u64> {
        let file = File::create(target)
            .map_err(|e| CofferError::io(format!("creating {}", target.display()), e))?;
        let mut writer = BufWriter::new(file);
        let bytes = self.store.get(key, &mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| CofferError::io(format!("writing {}", target.display()), e.into_error()))?;
        file.sync_all()
            .map_err(|e| CofferError::io(format!("syncing {}", target.display()), e))?;
        Ok(bytes)
    }
}

fn not_a(path: &Path, what: &str) -> CofferError {
    if fs::symlink_metadata(path).is_err() {
        CofferError::PathNotFound(path.to_path_buf())
    } else {
        CofferError::PathInvalid {
            path: path.to_path_buf(),
            reason: format!("not a {}", what),
        }
    }
}

/// Reader that hashes everything read through it
struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn hex_digest(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
