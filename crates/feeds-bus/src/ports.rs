//! # Outbound Ports
//!
//! The filesystem primitives every bus transition is built from.
//!
//! Production: [`StdFileSystem`](crate::adapters::StdFileSystem)
//! Testing: `FailingFileSystem` (feature `test-utils`), which injects
//! failures at a chosen call.
//!
//! Reads and directory listings go straight to `std::fs`; only operations
//! that change the tree pass through this port.

use std::io;
use std::path::Path;

/// Abstract interface for the mutating filesystem operations.
pub trait FileSystemAdapter: Send + Sync {
    /// Create `path` (which must not be visible to consumers yet), write
    /// `bytes` and flush them to stable storage.
    fn write_synced(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Atomically move `from` to `to`. Both paths are on the same volume.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete one file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Delete a directory tree.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

impl<T: FileSystemAdapter + ?Sized> FileSystemAdapter for &T {
    fn write_synced(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write_synced(path, bytes)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }
}

impl<T: FileSystemAdapter + ?Sized> FileSystemAdapter for std::sync::Arc<T> {
    fn write_synced(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write_synced(path, bytes)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }
}
