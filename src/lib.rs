//! Coffer - versioned artifact cache
//!
//! Publishes files and directories to a remote object store under a
//! `group:name:version` coordinate and resolves them back to local paths,
//! downloading each coordinate at most once per cache root even when many
//! threads or processes ask for it at the same time.
//!
//! ```rust,ignore
//! use coffer::store::LocalObjectStore;
//! use coffer::Datastore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(LocalObjectStore::new("/srv/artifacts"));
//! let datastore = Datastore::new("/var/cache/coffer", store);
//!
//! datastore.publish_directory("dist".as_ref(), "com.example", "tools", 3)?;
//! let tree = datastore.directory_path("com.example", "tools", 3)?;
//! ```

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinate;
pub mod datastore;
pub mod error;
pub mod store;
pub mod ui;

pub use coordinate::{Coordinate, Kind};
pub use datastore::{Datastore, Published, Resolution};
pub use error::{CofferError, CofferResult};
