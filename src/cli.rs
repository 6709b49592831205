//! Command-line interface definitions for dupsweep.
//!
//! One positional argument, the directory to sweep, plus the logging
//! switches. Everything else comes from the configuration file and
//! environment (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Remove duplicate and empty files from ~/Downloads
//! dupsweep ~/Downloads
//!
//! # Show per-file verdicts
//! dupsweep -v ~/Downloads
//! ```

use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};

use crate::error::UsageError;

/// Remove duplicate and empty files from one directory.
///
/// The first file of each size is kept; every later file with the same
/// content is deleted. Subdirectories are not entered.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to sweep
    #[arg(value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// The directory argument, checked to exist and be a directory.
    ///
    /// # Errors
    ///
    /// Returns a `UsageError` describing what is wrong with the argument.
    pub fn target_dir(&self) -> Result<&Path, UsageError> {
        let path = self.path.as_deref().ok_or(UsageError::MissingPath)?;
        if !path.exists() {
            return Err(UsageError::NotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(UsageError::NotADirectory(path.to_path_buf()));
        }
        Ok(path)
    }
}

/// One-line usage text.
#[must_use]
pub fn usage() -> String {
    Cli::command().render_usage().to_string()
}
