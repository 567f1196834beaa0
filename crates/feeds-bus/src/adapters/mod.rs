//! # Filesystem Adapters
//!
//! Implementations of [`FileSystemAdapter`](crate::ports::FileSystemAdapter).

mod std_fs;
pub use std_fs::StdFileSystem;

#[cfg(any(test, feature = "test-utils"))]
mod failing;
#[cfg(any(test, feature = "test-utils"))]
pub use failing::FailingFileSystem;
