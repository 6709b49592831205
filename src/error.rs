//! Exit codes and usage errors.

use std::path::PathBuf;

use thiserror::Error;

/// Exit codes for the dupsweep binary.
///
/// - 0: Success (scan completed, or a usage problem was reported)
/// - 1: General error (unexpected failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: the scan ran to the end of the listing.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
        }
    }
}

/// Problems with the command-line arguments.
///
/// Reported once with the usage text; the process still exits with
/// [`ExitCode::Success`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    /// No directory argument was given.
    #[error("no directory given")]
    MissingPath,

    /// The path does not exist.
    #[error("directory not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
