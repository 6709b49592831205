//! File deletion for duplicate and empty files.
//!
//! # Overview
//!
//! [`DeletionExecutor`] removes one file per call through a [`Remover`]:
//! - [`PermanentRemover`]: `fs::remove_file` (default)
//! - [`TrashRemover`]: move to the system trash via the `trash` crate
//!
//! Before removing, the executor re-reads the file's metadata and refuses to
//! delete it if its size or modification time differ from the listing.
//! Every failure is returned as a [`DeleteError`]; the caller logs it and
//! moves on to the next file.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::delete::{DeleteConfig, DeletionExecutor};
//! use dupsweep::scanner::FileEntry;
//! use std::path::Path;
//!
//! let executor = DeletionExecutor::new(DeleteConfig::default());
//! let file = FileEntry::from_path(Path::new("/tmp/copy.txt")).unwrap();
//! match executor.delete(&file) {
//!     Ok(result) => println!("Freed {} bytes", result.size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::FileEntry;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since it was listed.
    #[error("file modified since listing: {0}")]
    Modified(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error while checking the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Path of the file that could not be deleted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_metadata(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    fn from_remove(path: &Path, err: io::Error, permanent: bool) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ if permanent => Self::PermanentDeleteFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
            _ => Self::TrashFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Remove the file from the filesystem.
    #[default]
    Permanent,
    /// Move the file to the system trash.
    Trash,
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Configuration for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Permanent removal or trash.
    pub mode: DeleteMode,
    /// Re-check size and modification time before deleting.
    pub verify_before_delete: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            mode: DeleteMode::Permanent,
            verify_before_delete: true,
        }
    }
}

impl DeleteConfig {
    /// Set the deletion mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DeleteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable/disable pre-delete verification.
    #[must_use]
    pub fn with_verify_before_delete(mut self, verify: bool) -> Self {
        self.verify_before_delete = verify;
        self
    }
}

/// Removes one file from the filesystem.
pub trait Remover: Send + Sync {
    /// Remove the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be removed.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Whether removed files are gone for good.
    fn is_permanent(&self) -> bool;
}

/// Permanent removal with `fs::remove_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermanentRemover;

impl Remover for PermanentRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn is_permanent(&self) -> bool {
        true
    }
}

/// Move to the system trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashRemover;

impl Remover for TrashRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
    }

    fn is_permanent(&self) -> bool {
        false
    }
}

/// Deletes files handed over by the scan session.
pub struct DeletionExecutor {
    config: DeleteConfig,
    remover: Box<dyn Remover>,
}

impl fmt::Debug for DeletionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeletionExecutor")
            .field("config", &self.config)
            .field("permanent", &self.remover.is_permanent())
            .finish()
    }
}

impl Default for DeletionExecutor {
    fn default() -> Self {
        Self::new(DeleteConfig::default())
    }
}

impl DeletionExecutor {
    /// Executor using the remover selected by `config.mode`.
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        let remover: Box<dyn Remover> = match config.mode {
            DeleteMode::Permanent => Box::new(PermanentRemover),
            DeleteMode::Trash => Box::new(TrashRemover),
        };
        Self { config, remover }
    }

    /// Executor using a custom remover; `config.mode` is ignored.
    #[must_use]
    pub fn with_remover(config: DeleteConfig, remover: Box<dyn Remover>) -> Self {
        Self { config, remover }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DeleteConfig {
        &self.config
    }

    /// Whether deletions are permanent.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.remover.is_permanent()
    }

    /// Delete one file.
    ///
    /// # Errors
    ///
    /// - `Modified` if verification is enabled and the file changed since listing
    /// - `NotFound` / `PermissionDenied` if the file is gone or protected
    /// - `TrashFailed` / `PermanentDeleteFailed` if the remover fails otherwise
    pub fn delete(&self, file: &FileEntry) -> Result<DeleteResult, DeleteError> {
        let path = file.path.as_path();
        if self.config.verify_before_delete {
            verify_unchanged(file)?;
        }

        let permanent = self.remover.is_permanent();
        self.remover
            .remove(path)
            .map_err(|e| DeleteError::from_remove(path, e, permanent))?;

        log::info!("deleted {}", path.display());
        Ok(DeleteResult::new(path.to_path_buf(), file.size, permanent))
    }
}

/// Check that `file` still has the size and modification time it was listed with.
///
/// # Errors
///
/// Returns `Modified` on a mismatch, or the metadata failure.
pub fn verify_unchanged(file: &FileEntry) -> Result<(), DeleteError> {
    let path = file.path.as_path();
    let metadata = fs::metadata(path).map_err(|e| DeleteError::from_metadata(path, e))?;

    if metadata.len() != file.size {
        log::warn!(
            "File modified since listing: {} (size changed from {} to {})",
            path.display(),
            file.size,
            metadata.len()
        );
        return Err(DeleteError::Modified(path.to_path_buf()));
    }

    if let (Some(listed), Ok(current)) = (file.modified, metadata.modified()) {
        if listed != current {
            log::warn!(
                "File modified since listing: {} (mtime changed)",
                path.display()
            );
            return Err(DeleteError::Modified(path.to_path_buf()));
        }
    }

    Ok(())
}
