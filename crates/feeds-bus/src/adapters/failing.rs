//! Fault-injecting adapter for tests.

use super::StdFileSystem;
use crate::ports::FileSystemAdapter;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delegates to [`StdFileSystem`] but fails one chosen call.
///
/// Calls are counted per operation starting at 1. `fail_rename_at(3)` makes
/// the third rename return an error; every other rename succeeds.
#[derive(Debug, Default)]
pub struct FailingFileSystem {
    renames: AtomicUsize,
    writes: AtomicUsize,
    fail_rename: Option<usize>,
    fail_write: Option<usize>,
}

impl FailingFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th rename.
    #[must_use]
    pub fn fail_rename_at(mut self, n: usize) -> Self {
        self.fail_rename = Some(n);
        self
    }

    /// Fail the `n`th synced write. The failing call still leaves the first
    /// half of the bytes on disk, as a write that ran out of space would.
    #[must_use]
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_write = Some(n);
        self
    }

    /// Renames attempted so far, including the failed one.
    #[must_use]
    pub fn renames(&self) -> usize {
        self.renames.load(Ordering::SeqCst)
    }

    fn injected(op: &str, n: usize) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("injected {op} failure at call {n}"))
    }
}

impl FileSystemAdapter for FailingFileSystem {
    fn write_synced(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write == Some(n) {
            std::fs::write(path, &bytes[..bytes.len() / 2])?;
            return Err(Self::injected("write", n));
        }
        StdFileSystem.write_synced(path, bytes)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let n = self.renames.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_rename == Some(n) {
            return Err(Self::injected("rename", n));
        }
        StdFileSystem.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.remove_dir_all(path)
    }
}
