//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Recursive directory walking with one pool unit per directory
//! - Streaming content hashing (SHA-256 or BLAKE3)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: [`TreeScanner`], the pool-driven directory walk
//! - [`hasher`]: [`Hasher`], streaming file hashing
//!
//! # Example
//!
//! ```no_run
//! use fileworker::scanner::{Hasher, TreeScanner};
//! use fileworker::session::ScanSession;
//! use std::sync::Arc;
//!
//! let session = Arc::new(ScanSession::new("/home/user/Downloads"));
//! let scanner = TreeScanner::new(Hasher::default(), 8);
//!
//! let report = scanner.scan(&session).unwrap();
//! println!("{} files in {} directories", report.files, report.directories);
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

use crate::pool::PoolError;

// Re-export main types
pub use hasher::{HashAlgorithm, Hasher, READ_BUFFER_SIZE};
pub use walker::{ScanReport, TreeScanner};

/// Errors that stop a scan before it starts.
///
/// Failures below the root (unreadable subdirectories, unhashable files) are
/// logged and absorbed instead.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing the root directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while listing the root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl ScanError {
    /// Classify an I/O error raised while opening `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while opening or reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
