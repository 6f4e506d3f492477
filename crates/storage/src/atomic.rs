// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe file writes and append-only NDJSON lines.
//!
//! Write-then-rename: create a temp file in the destination's own
//! directory, write the full payload, fsync the file, close it, rename
//! over the destination, then fsync the parent directory. Cross-filesystem
//! renames are a misuse of this API, not a case it works around.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors identify the phase that failed, per the write-then-rename protocol.
#[derive(Debug, Error)]
pub enum AtomicError {
    #[error("create temp file {path}: {source}")]
    CreateTemp { path: PathBuf, source: io::Error },
    #[error("write temp file {path}: {source}")]
    WriteTemp { path: PathBuf, source: io::Error },
    #[error("fsync temp file {path}: {source}")]
    FsyncTemp { path: PathBuf, source: io::Error },
    #[error("rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("fsync parent directory {path}: {source}")]
    FsyncDir { path: PathBuf, source: io::Error },
    #[error("acquire lock on {path}: {source}")]
    AcquireLock { path: PathBuf, source: io::Error },
    #[error("write line to {path}: {source}")]
    WriteLine { path: PathBuf, source: io::Error },
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let basename = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(
        ".tmp.{basename}.{}.{}",
        std::process::id(),
        fastrand_suffix()
    ))
}

/// A small non-cryptographic suffix; uniqueness against a concurrent writer
/// on the same host, not a security property.
fn fastrand_suffix() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    nanos ^ (std::process::id().wrapping_mul(2_654_435_761))
}

fn fsync_dir(dir: &Path) -> Result<(), AtomicError> {
    let dir_file = File::open(dir).map_err(|source| AtomicError::FsyncDir {
        path: dir.to_path_buf(),
        source,
    })?;
    dir_file.sync_all().map_err(|source| AtomicError::FsyncDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes `bytes` to `path` via the write-then-rename protocol. The temp
/// file is cleaned up on every error path.
pub fn write_file_sync(path: &Path, bytes: &[u8]) -> Result<(), AtomicError> {
    let tmp = temp_path_for(path);
    let result = (|| -> Result<(), AtomicError> {
        let mut file = File::create(&tmp).map_err(|source| AtomicError::CreateTemp {
            path: tmp.clone(),
            source,
        })?;
        file.write_all(bytes).map_err(|source| AtomicError::WriteTemp {
            path: tmp.clone(),
            source,
        })?;
        file.sync_all().map_err(|source| AtomicError::FsyncTemp {
            path: tmp.clone(),
            source,
        })?;
        drop(file);
        atomic_rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Renames `src` to `dst`, then fsyncs `dst`'s parent directory so the
/// rename itself survives a crash.
pub fn atomic_rename(src: &Path, dst: &Path) -> Result<(), AtomicError> {
    fs::rename(src, dst).map_err(|source| AtomicError::Rename {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    })?;
    if let Some(parent) = dst.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        fsync_dir(parent)?;
    }
    Ok(())
}

/// An exclusive, host-local advisory lock on a file. Released on drop.
/// Backed by `fs2`, which maps to POSIX `flock` or Windows `LockFileEx`.
pub struct FileLock {
    file: File,
}

impl FileLock {
    pub fn acquire(path: &Path) -> Result<Self, AtomicError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|source| AtomicError::AcquireLock {
                path: path.to_path_buf(),
                source,
            })?;
        file.lock_exclusive().map_err(|source| AtomicError::AcquireLock {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Appends a single NDJSON line to `path` under an exclusive file lock,
/// serializing concurrent writers within one host. The write is a single
/// `write_all` of `line + "\n"` followed by an fsync.
pub fn append_ndjson_line(path: &Path, line: &str) -> Result<(), AtomicError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| AtomicError::AcquireLock {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AtomicError::AcquireLock {
            path: path.to_path_buf(),
            source,
        })?;
    file.lock_exclusive().map_err(|source| AtomicError::AcquireLock {
        path: path.to_path_buf(),
        source,
    })?;
    let write_result = (|| -> io::Result<()> {
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()
    })();
    let _ = FileExt::unlock(&file);
    write_result.map_err(|source| AtomicError::WriteLine {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
