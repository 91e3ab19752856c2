//! CLI command implementations
//!
//! Datastore operations block on disk and network I/O, so every command
//! runs them through [`blocking`] instead of on the async executor.

pub mod config;
pub mod evict;
pub mod fetch;
pub mod list;
pub mod publish;
pub mod unpublish;
pub mod wipe;

pub use config::execute as config;
pub use evict::execute as evict;
pub use fetch::execute as fetch;
pub use list::execute as list;
pub use publish::execute as publish;
pub use unpublish::execute as unpublish;
pub use wipe::execute as wipe;

use crate::error::{CofferError, CofferResult};

/// Run a blocking datastore call on the blocking thread pool
pub(crate) async fn blocking<T, F>(task: F) -> CofferResult<T>
where
    F: FnOnce() -> CofferResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CofferError::Internal(format!("blocking task failed: {}", e)))?
}
