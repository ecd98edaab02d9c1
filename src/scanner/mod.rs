//! Scanner module for directory traversal and content hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - SHA-256 content hashing
//! - Music-library filtering (extension allow-list, metadata junk, quarantine)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`filter`]: Extension allow-list and junk-file rules
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: SHA-256 file hashing (streaming)
//! - [`scan`]: Walk + parallel hash pipeline producing [`FileRecord`]s
//!
//! # Example
//!
//! ```no_run
//! use tunedupe::scanner::{FileFilter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::new(FileFilter::new(["mp3", "flac"]))
//!     .with_quarantine(Path::new("/music/DUPES"));
//!
//! let walker = Walker::new(Path::new("/music"), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod filter;
pub mod hasher;
pub mod scan;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

// Re-export main types
pub use filter::{is_junk_name, FileFilter};
pub use hasher::{ContentHash, Hasher, ParseHashError, HASH_HEX_LEN};
pub use scan::{ScanConfig, ScanOutcome, ScanStats, Scanner};
pub use walker::Walker;

/// A regular file discovered by the walker, before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// A hashed file: the unit every later stage works on.
///
/// Created by the scan or by reading an inventory; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRecord {
    /// Path under the scan root
    pub path: PathBuf,
    /// SHA-256 of the full content
    pub hash: ContentHash,
}

impl FileRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: PathBuf, hash: ContentHash) -> Self {
        Self { path, hash }
    }

    /// Final path component as text (lossy for non-UTF-8 names).
    #[must_use]
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Which files are eligible at all.
    pub filter: FileFilter,

    /// Quarantine root; pruned from the walk when it lies under the scan root.
    pub quarantine: Option<PathBuf>,
}

impl WalkerConfig {
    /// Create a configuration with the given filter and no quarantine.
    #[must_use]
    pub fn new(filter: FileFilter) -> Self {
        Self {
            filter,
            quarantine: None,
        }
    }

    /// Exclude the quarantine subtree from the walk.
    #[must_use]
    pub fn with_quarantine(mut self, quarantine: &Path) -> Self {
        self.quarantine = Some(quarantine.to_path_buf());
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file vanished between walking and hashing.
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
    /// Classify an I/O error raised while hashing `path`.
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
