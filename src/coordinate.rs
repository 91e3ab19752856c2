//! Artifact coordinates and their addressing scheme
//!
//! A coordinate is `(group, name, version, kind)`. It maps to a remote object
//! key and to a local cache path with pure functions, so any client that
//! follows the same layout can share a bucket or a cache root:
//!
//! | Kind | Remote key | Local path (under the cache root) |
//! |------|------------|-----------------------------------|
//! | File | `{group}/{name}/{version}/file` | `artifacts/{group}/{name}/{version}/file` |
//! | Directory | `{group}/{name}/{version}/directory.tar.gz` | `artifacts/{group}/{name}/{version}/directory` |
//!
//! Segments never contain a path separator, so the mapping is injective, and
//! the final segment differs per kind so a file and a directory with the same
//! group, name and version never alias each other.

use crate::error::{CofferError, CofferResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Directory under the cache root holding installed artifacts
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Directory under the cache root holding per-coordinate lock files
pub const LOCKS_DIR: &str = "locks";

/// Whether a coordinate addresses a single file or an archived directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Raw file bytes
    File,
    /// Directory tree, stored remotely as one archive
    Directory,
}

impl Kind {
    /// Final segment of the remote key
    pub fn object_name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory.tar.gz",
        }
    }

    /// Final segment of the local cache path
    pub fn entry_name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }

    /// Parse from a local entry name
    pub fn from_entry_name(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "directory" => Some(Self::Directory),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Identity of one published artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    group: String,
    name: String,
    version: u32,
    kind: Kind,
}

impl Coordinate {
    /// Create a coordinate, rejecting unsafe segments and non-positive versions
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: u32,
        kind: Kind,
    ) -> CofferResult<Self> {
        let group = group.into();
        let name = name.into();

        validate_segment("group", &group)?;
        validate_segment("name", &name)?;
        if version == 0 {
            return Err(CofferError::InvalidCoordinate {
                reason: format!("version of {}:{} must be at least 1", group, name),
            });
        }

        Ok(Self {
            group,
            name,
            version,
            kind,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The same group, name and version with a different kind
    pub fn with_kind(&self, kind: Kind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Object key in the remote store
    pub fn remote_key(&self) -> String {
        format!("{}{}", self.remote_prefix(), self.kind.object_name())
    }

    /// Key prefix shared by both kinds of this group/name/version
    pub fn remote_prefix(&self) -> String {
        format!("{}/{}/{}/", self.group, self.name, self.version)
    }

    /// Canonical location of the installed artifact
    pub fn local_path(&self, cache_root: &Path) -> PathBuf {
        self.version_dir(&cache_root.join(ARTIFACTS_DIR))
            .join(self.kind.entry_name())
    }

    /// Lock file guarding installation of this coordinate
    pub fn lock_path(&self, cache_root: &Path) -> PathBuf {
        self.version_dir(&cache_root.join(LOCKS_DIR))
            .join(format!("{}.lock", self.kind.entry_name()))
    }

    fn version_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.group)
            .join(&self.name)
            .join(self.version.to_string())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} ({})",
            self.group, self.name, self.version, self.kind
        )
    }
}

/// `group:name:version` as typed on the command line, before a kind is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateSpec {
    pub group: String,
    pub name: String,
    pub version: u32,
}

impl CoordinateSpec {
    /// Attach a kind, validating every field
    pub fn with_kind(&self, kind: Kind) -> CofferResult<Coordinate> {
        Coordinate::new(self.group.clone(), self.name.clone(), self.version, kind)
    }
}

impl FromStr for CoordinateSpec {
    type Err = CofferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [group, name, version] = parts.as_slice() else {
            return Err(CofferError::InvalidCoordinate {
                reason: format!("'{}' is not of the form group:name:version", s),
            });
        };

        let version = version
            .parse::<u32>()
            .map_err(|_| CofferError::InvalidCoordinate {
                reason: format!("version '{}' is not a positive integer", version),
            })?;

        // Run full validation once so bad input fails at parse time
        Coordinate::new(*group, *name, version, Kind::File)?;

        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for CoordinateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Validate that a group or name segment is safe to use as a path component.
fn validate_segment(field: &str, value: &str) -> CofferResult<()> {
    if value.is_empty() {
        return Err(CofferError::InvalidCoordinate {
            reason: format!("{} cannot be empty", field),
        });
    }
    if value == "." || value == ".." || value.starts_with('.') {
        return Err(CofferError::InvalidCoordinate {
            reason: format!("{} '{}' must not start with '.'", field, value),
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CofferError::InvalidCoordinate {
            reason: format!(
                "{} '{}' must contain only alphanumeric characters, '.', '-' or '_'",
                field, value
            ),
        });
    }
    Ok(())
}
