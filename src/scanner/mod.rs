//! Scanner module for directory listing and content signatures.
//!
//! This module provides functionality for:
//! - Non-recursive directory listing using jwalk
//! - Reading byte ranges and whole files through a [`ContentSource`]
//! - The three content signatures used by the classifier: prefix,
//!   rapid fingerprint and full digest
//!
//! # Architecture
//!
//! - [`walker`]: single-level directory listing
//! - [`source`]: byte-range and streaming reads
//! - [`signature`]: prefix, rapid fingerprint and full digest computation
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{list_files, HashAlgorithm, SignatureProvider};
//! use std::path::Path;
//!
//! let files = list_files(Path::new(".")).unwrap();
//! let signatures = SignatureProvider::new(HashAlgorithm::Blake3);
//! for file in &files {
//!     println!("{}: {:?}", file.path.display(), signatures.rapid_fingerprint(file));
//! }
//! ```

pub mod signature;
pub mod source;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use signature::{
    sample_offsets, size_tag, Digest, Fingerprint, HashAlgorithm, Probe, SignatureProvider, PREFIX_LEN,
    RAPID_THRESHOLD, SAMPLE_COUNT, SAMPLE_WINDOW, SIZE_TAG_WIDTH, TAIL_RESERVE,
};
pub use source::{ContentSource, FsSource};
pub use walker::list_files;

/// A file discovered in the scanned directory.
///
/// Immutable for the duration of a scan; the classifier only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes, as reported by the listing
    pub size: u64,
    /// Last modification time, used to verify a file before deletion
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }

    /// Build an entry from the current on-disk metadata of `path`.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError` if the metadata cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        Ok(Self::new(
            path.to_path_buf(),
            metadata.len(),
            metadata.modified().ok(),
        ))
    }
}

/// Errors that can occur while listing the target directory.
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

impl ScanError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Errors that can occur while reading file content for a signature.
///
/// The classifier never propagates these: a failed read turns into an
/// unreadable probe that matches nothing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while opening, seeking or reading the file.
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
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}
