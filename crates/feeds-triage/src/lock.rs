//! # Store Lock
//!
//! Serializes access to the triage document across processes with `fs2`
//! advisory locks (flock on Unix, LockFileEx on Windows).
//!
//! Writers take the lock exclusively; readers take it shared. The lock is
//! held for one load-modify-save cycle and released on drop.

use crate::error::{TriageError, TriageResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// RAII guard over the store's lock file.
pub(crate) struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Block until the exclusive lock on `path` is held.
    pub(crate) fn exclusive(path: &Path) -> TriageResult<Self> {
        let file = Self::open(path)?;
        FileExt::lock_exclusive(&file).map_err(|e| TriageError::io(path, e))?;
        Ok(Self { file })
    }

    /// Block until a shared lock on `path` is held.
    pub(crate) fn shared(path: &Path) -> TriageResult<Self> {
        let file = Self::open(path)?;
        FileExt::lock_shared(&file).map_err(|e| TriageError::io(path, e))?;
        Ok(Self { file })
    }

    fn open(path: &Path) -> TriageResult<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TriageError::io(path, e))
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Lock file path for a store document.
pub(crate) fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    store_path.with_file_name(name)
}
