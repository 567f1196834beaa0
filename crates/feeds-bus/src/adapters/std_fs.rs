//! Production adapter over `std::fs`.

use crate::ports::FileSystemAdapter;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Direct `std::fs` adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystemAdapter for StdFileSystem {
    fn write_synced(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}
