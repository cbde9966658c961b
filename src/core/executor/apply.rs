//! Filesystem actions for single operations.

use super::space::FreeSpace;
use crate::core::hasher::ContentHash;
use crate::core::planner::{Operation, OperationKind};
use crate::error::{ExecuteError, HashError};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Apply one operation, refusing to overwrite anything
pub(crate) fn apply<S: FreeSpace>(operation: &Operation, space: &S) -> Result<(), ExecuteError> {
    verify_source(operation)?;

    match operation.kind() {
        OperationKind::Delete => fs::remove_file(operation.source()).map_err(|source| io_error(operation.source(), source)),
        OperationKind::Move => {
            let destination = destination_of(operation)?;
            prepare_destination(destination)?;
            move_file(operation.source(), destination)
        }
        OperationKind::Copy => {
            let destination = destination_of(operation)?;
            let available = space.free_bytes(destination);
            if operation.expected_size() > available {
                return Err(ExecuteError::SpaceInsufficient {
                    path: destination.to_path_buf(),
                    required: operation.expected_size(),
                    available,
                });
            }
            prepare_destination(destination)?;
            copy_verified(operation.source(), destination)
        }
    }
}

/// The source must still be the file that was planned
fn verify_source(operation: &Operation) -> Result<(), ExecuteError> {
    let source = operation.source();
    let metadata = match fs::symlink_metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ExecuteError::SourceMissing {
                path: source.to_path_buf(),
            })
        }
        Err(e) => return Err(io_error(source, e)),
    };

    if !metadata.is_file() {
        return Err(ExecuteError::SourceMissing {
            path: source.to_path_buf(),
        });
    }
    if metadata.len() != operation.expected_size() {
        return Err(ExecuteError::SourceChanged {
            path: source.to_path_buf(),
            expected: operation.expected_size(),
            actual: metadata.len(),
        });
    }
    Ok(())
}

/// The source must still hash to the digest recorded for it
///
/// Catches edits that kept the size. Operations without a recorded digest
/// pass on the size check alone.
pub(crate) fn verify_content(operation: &Operation) -> Result<(), ExecuteError> {
    verify_source(operation)?;
    let Some(expected) = operation.content_hash() else {
        return Ok(());
    };

    let actual = ContentHash::of_file(operation.source()).map_err(|e| match e {
        HashError::Io { path, source } => io_error(&path, source),
        other => ExecuteError::Io {
            path: operation.source().to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, other.to_string()),
        },
    })?;
    if actual != expected {
        return Err(ExecuteError::ContentChanged {
            path: operation.source().to_path_buf(),
        });
    }
    Ok(())
}

fn destination_of(operation: &Operation) -> Result<&Path, ExecuteError> {
    operation
        .destination()
        .ok_or(ExecuteError::MissingDestination {
            sequence: operation.sequence(),
        })
}

fn prepare_destination(destination: &Path) -> Result<(), ExecuteError> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(ExecuteError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    Ok(())
}

fn move_file(source: &Path, destination: &Path) -> Result<(), ExecuteError> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) => {
            // rename fails across filesystems, fall back to copy+delete
            tracing::debug!(
                "rename {} failed ({}), copying instead",
                source.display(),
                e
            );
            copy_verified(source, destination)?;
            fs::remove_file(source).map_err(|e| io_error(source, e))
        }
    }
}

/// Copy into a new file and check the sizes match
fn copy_verified(source: &Path, destination: &Path) -> Result<(), ExecuteError> {
    let source_meta = fs::metadata(source).map_err(|e| io_error(source, e))?;

    let mut reader = File::open(source).map_err(|e| io_error(source, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                ExecuteError::DestinationExists {
                    path: destination.to_path_buf(),
                }
            } else {
                io_error(destination, e)
            }
        })?;

    if let Err(e) = io::copy(&mut reader, &mut writer) {
        drop(writer);
        let _ = fs::remove_file(destination);
        return Err(io_error(destination, e));
    }
    drop(writer);

    let written = fs::metadata(destination).map_err(|e| io_error(destination, e))?.len();
    if written != source_meta.len() {
        // Copy was incomplete, don't keep it
        let _ = fs::remove_file(destination);
        return Err(ExecuteError::CopyVerification {
            path: destination.to_path_buf(),
            expected: source_meta.len(),
            actual: written,
        });
    }

    if let Err(e) = fs::set_permissions(destination, source_meta.permissions()) {
        tracing::debug!("Could not copy permissions to {}: {}", destination.display(), e);
    }
    Ok(())
}

/// Remove directories under `root` left empty, deepest first
///
/// The root itself and anything that still has contents stay.
pub fn remove_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(entry.path())
            .map(|mut d| d.next().is_none())
            .unwrap_or(false);
        if is_empty && fs::remove_dir(entry.path()).is_ok() {
            tracing::debug!("Removed empty directory {}", entry.path().display());
            removed += 1;
        }
    }
    removed
}

fn io_error(path: &Path, source: io::Error) -> ExecuteError {
    ExecuteError::Io {
        path: path.to_path_buf(),
        source,
    }
}
