//! Directory archives
//!
//! Directories travel as one gzip-compressed tar object. Packing walks the
//! tree in sorted order with deterministic headers (no owner, no mtime), so
//! the same tree always produces the same bytes. Files keep their permission
//! bits; directories are recorded as 0755. Only regular files and directories
//! are supported; empty directories are kept.

use crate::error::{CofferError, CofferResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{EntryType, HeaderMode};
use tracing::debug;

/// Counts of what went into or came out of an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Pack the tree under `src` into `out`. Paths in the archive are relative to `src`.
pub fn pack_directory<W: Write>(src: &Path, out: W) -> CofferResult<ArchiveStats> {
    if !src.is_dir() {
        return Err(CofferError::PathInvalid {
            path: src.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    let mut stats = ArchiveStats::default();
    let walker = walkdir::WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| CofferError::InvalidArchivePath {
                path: entry.path().to_path_buf(),
            })?;
        let name = archive_name(rel)?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            builder
                .append_dir(&name, entry.path())
                .map_err(|e| CofferError::io(format!("archiving {}", entry.path().display()), e))?;
            stats.directories += 1;
        } else if file_type.is_file() {
            let metadata = entry.metadata()?;
            let mut header = tar::Header::new_gnu();
            header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);
            header.set_mode(file_mode(&metadata));

            let file = fs::File::open(entry.path())
                .map_err(|e| CofferError::io(format!("opening {}", entry.path().display()), e))?;
            builder
                .append_data(&mut header, &name, file)
                .map_err(|e| CofferError::io(format!("archiving {}", entry.path().display()), e))?;
            stats.files += 1;
            stats.bytes += metadata.len();
        } else {
            return Err(CofferError::UnsupportedEntry {
                path: entry.path().to_path_buf(),
            });
        }
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| CofferError::io("finishing archive", e))?;
    encoder
        .finish()
        .map_err(|e| CofferError::io("finishing archive compression", e))?;

    debug!(
        src = %src.display(),
        files = stats.files,
        directories = stats.directories,
        bytes = stats.bytes,
        "packed directory"
    );
    Ok(stats)
}

/// Unpack an archive produced by [`pack_directory`] into `dest`, which is created if missing.
pub fn unpack_archive<R: Read>(input: R, dest: &Path) -> CofferResult<ArchiveStats> {
    fs::create_dir_all(dest)
        .map_err(|e| CofferError::io(format!("creating {}", dest.display()), e))?;

    let mut archive = tar::Archive::new(GzDecoder::new(input));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(false);

    let mut stats = ArchiveStats::default();
    let entries = archive
        .entries()
        .map_err(|e| CofferError::io("reading archive", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| CofferError::io("reading archive entry", e))?;
        let rel = entry
            .path()
            .map_err(|e| CofferError::io("reading archive entry path", e))?
            .into_owned();
        validate_archive_relative_path(&rel)?;
        let out_path = dest.join(&rel);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&out_path)
                    .map_err(|e| CofferError::io(format!("creating {}", out_path.display()), e))?;
                stats.directories += 1;
            }
            EntryType::Regular => {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| CofferError::io(format!("creating {}", parent.display()), e))?;
                }
                stats.bytes += entry
                    .header()
                    .size()
                    .map_err(|e| CofferError::io("reading archive entry size", e))?;
                entry
                    .unpack(&out_path)
                    .map_err(|e| CofferError::io(format!("extracting {}", out_path.display()), e))?;
                stats.files += 1;
            }
            _ => return Err(CofferError::UnsupportedEntry { path: rel }),
        }
    }

    debug!(
        dest = %dest.display(),
        files = stats.files,
        directories = stats.directories,
        "unpacked archive"
    );
    Ok(stats)
}

/// Permission bits recorded for a regular file
#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt as _;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Archive member name for a relative path, always `/`-separated
fn archive_name(rel: &Path) -> CofferResult<String> {
    validate_archive_relative_path(rel)?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()
        .ok_or_else(|| CofferError::InvalidArchivePath {
            path: rel.to_path_buf(),
        })?;
    Ok(parts.join("/"))
}

fn validate_archive_relative_path(path: &Path) -> CofferResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CofferError::InvalidArchivePath {
            path: PathBuf::new(),
        });
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(CofferError::InvalidArchivePath {
                    path: path.to_path_buf(),
                })
            }
        }
    }
    Ok(())
}
