//! Error types for Coffer
//!
//! All modules use `CofferResult<T>` as their return type.

use crate::coordinate::Coordinate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Coffer operations
pub type CofferResult<T> = Result<T, CofferError>;

/// All errors that can occur in Coffer
#[derive(Error, Debug)]
pub enum CofferError {
    // Resolution errors
    #[error("Artifact does not exist: {coordinate}")]
    DoesNotExist { coordinate: Coordinate },

    #[error("Invalid coordinate: {reason}")]
    InvalidCoordinate { reason: String },

    // Remote store errors
    #[error("Remote object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("Invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    // Cache errors
    #[error("Failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install {path}: {reason}")]
    Install { path: PathBuf, reason: String },

    // Archive errors
    #[error("Invalid archive path: {path:?}")]
    InvalidArchivePath { path: PathBuf },

    #[error("Unsupported entry type (only files and directories are archived): {path:?}")]
    UnsupportedEntry { path: PathBuf },

    #[error("Failed to walk directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl CofferError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a lock error for the given lock file
    pub fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    /// Create the error for an object key a store refuses to address
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create the "artifact does not exist" error for a coordinate
    pub fn does_not_exist(coordinate: Coordinate) -> Self {
        Self::DoesNotExist { coordinate }
    }

    /// Whether this is the expected, recoverable miss signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DoesNotExist { .. })
    }

    /// The coordinate that failed to resolve, if this is a miss
    pub fn missing_coordinate(&self) -> Option<&Coordinate> {
        match self {
            Self::DoesNotExist { coordinate } => Some(coordinate),
            _ => None,
        }
    }

    /// Check if error is transient (callers may retry; Coffer never does)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DoesNotExist { .. } => {
                Some("Check group, name and version, or publish it first: coffer publish <path> <group:name:version>")
            }
            Self::InvalidCoordinate { .. } => {
                Some("Coordinates look like group:name:version, e.g. com.example:tools:3")
            }
            Self::Lock { .. } => Some("Check permissions on the cache root (coffer config show)"),
            Self::ConfigInvalid { .. } => Some("Run: coffer config init --force"),
            _ => None,
        }
    }
}
