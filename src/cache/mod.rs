//! Local artifact cache
//!
//! One cache root holds every resolved artifact plus the lock files that
//! serialize their installation:
//!
//! ```text
//! {root}/artifacts/{group}/{name}/{version}/file
//! {root}/artifacts/{group}/{name}/{version}/directory/
//! {root}/locks/{group}/{name}/{version}/{kind}.lock
//! {root}/staging/partial-*/
//! ```
//!
//! # Entry States
//!
//! | State | Visible | Description |
//! |-------|---------|-------------|
//! | Absent | no | Never fetched, evicted or wiped |
//! | Installing | no | Lock held, content accumulating in staging |
//! | Present | yes | Renamed into place, read without locking |
//!
//! Presence is structural: an entry exists at its canonical path only after
//! the final rename, so there is no index or marker file.

pub mod dir;
pub mod lock;

pub use dir::{disk_usage, format_bytes, CacheDir, CachedEntry, InstallOutcome};
pub use lock::{with_lock, CoordinateLock};
