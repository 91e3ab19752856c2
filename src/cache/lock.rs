//! Per-coordinate mutual exclusion
//!
//! Each coordinate has a lock file under `{cache_root}/locks/`. Holding a
//! [`CoordinateLock`] means no other thread in this process and no other
//! process sharing the cache root is installing the same coordinate.

use crate::error::{CofferError, CofferResult};
use fs2::FileExt as _;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::debug;

/// Exclusive lock on one coordinate, released on drop.
#[derive(Debug)]
pub struct CoordinateLock {
    file: File,
    path: PathBuf,
    // `flock` semantics differ per platform for two handles inside one
    // process, so threads are serialized by an in-process mutex first and
    // the file lock only has to exclude other processes.
    _guard: MutexGuard<'static, ()>,
}

impl CoordinateLock {
    /// Acquire the lock stored at `path`, creating the lock file if needed.
    ///
    /// Blocks until the lock is free. There is no timeout.
    pub fn acquire(path: &Path) -> CofferResult<Self> {
        let guard = process_lock_for_path(path)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CofferError::lock(path, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| CofferError::lock(path, e))?;
        file.lock_exclusive()
            .map_err(|e| CofferError::lock(path, e))?;

        debug!(lock = %path.display(), "acquired coordinate lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CoordinateLock {
    fn drop(&mut self) {
        // Closing the handle would release it too; unlock explicitly so the
        // file lock is gone before the in-process guard is.
        let _ = self.file.unlock();
        debug!(lock = %self.path.display(), "released coordinate lock");
    }
}

/// Run `body` while holding the lock at `path`.
///
/// The lock is released on every exit path, including errors and panics.
pub fn with_lock<T>(path: &Path, body: impl FnOnce() -> CofferResult<T>) -> CofferResult<T> {
    let _lock = CoordinateLock::acquire(path)?;
    body()
}

fn process_lock_for_path(path: &Path) -> &'static Mutex<()> {
    static PROCESS_LOCKS: OnceLock<Mutex<HashMap<PathBuf, &'static Mutex<()>>>> =
        OnceLock::new();
    let locks = PROCESS_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));

    let mut map = locks
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(&existing) = map.get(path) {
        return existing;
    }

    // One mutex per distinct lock path for the life of the process; the set
    // of coordinates touched by one process is small.
    let mutex: &'static Mutex<()> = Box::leak(Box::new(Mutex::new(())));
    map.insert(path.to_path_buf(), mutex);
    mutex
}
