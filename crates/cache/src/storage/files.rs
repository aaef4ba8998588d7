//! Payload file I/O
//!
//! Files are written under a temporary name and renamed into place, so a
//! reader only ever sees a complete file or none at all.

use super::format::{PAYLOAD_EXTENSION, TEMP_EXTENSION};
use crate::errors::{CacheError, RecoveryHint, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fresh, unguessable payload file name
pub(crate) fn new_handle() -> String {
    format!("{}.{}", uuid::Uuid::new_v4().simple(), PAYLOAD_EXTENSION)
}

pub(crate) fn write_atomic(dir: &Path, handle: &str, bytes: &[u8]) -> Result<()> {
    let final_path = dir.join(handle);
    let temp_path = final_path.with_extension(TEMP_EXTENSION);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_data()?;
        fs::rename(&temp_path, &final_path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CacheError::Io {
            path: final_path.clone(),
            operation: "write payload file",
            source: e,
            recovery_hint: RecoveryHint::CheckDiskSpace,
        }
    })
}

/// Read a payload file; `Ok(None)` when it does not exist
pub(crate) fn read(dir: &Path, handle: &str) -> Result<Option<Vec<u8>>> {
    let path = dir.join(handle);
    match fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::Io {
            path,
            operation: "read payload file",
            source: e,
            recovery_hint: RecoveryHint::RetryWithBackoff {
                initial_delay_ms: 50,
                max_retries: 3,
                backoff_multiplier: 2.0,
            },
        }),
    }
}

/// Remove a payload file, treating an already-missing file as success
pub(crate) fn remove(dir: &Path, handle: &str) -> Result<()> {
    let path = dir.join(handle);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::Io {
            path,
            operation: "remove payload file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: dir.to_path_buf(),
            },
        }),
    }
}

/// Delete payload files the index does not reference and every leftover temp file
pub(crate) fn sweep_orphans(dir: &Path, known: &HashSet<String>) -> Result<usize> {
    let entries = fs::read_dir(dir).map_err(|e| CacheError::Io {
        path: dir.to_path_buf(),
        operation: "scan cache directory",
        source: e,
        recovery_hint: RecoveryHint::CheckPermissions {
            path: dir.to_path_buf(),
        },
    })?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_sweepable(&path, known) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %path.display(), "removed orphaned payload file");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove orphaned file");
            }
        }
    }
    Ok(removed)
}

fn is_sweepable(path: &Path, known: &HashSet<String>) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if ext == TEMP_EXTENSION {
        return true;
    }
    if ext != PAYLOAD_EXTENSION {
        return false;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| !known.contains(name))
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| CacheError::Io {
        path: dir.to_path_buf(),
        operation: "create cache directory",
        source: e,
        recovery_hint: RecoveryHint::CheckPermissions {
            path: dir.to_path_buf(),
        },
    })?;
    Ok(dir.to_path_buf())
}
