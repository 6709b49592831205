//! dupsweep - staged duplicate file remover
//!
//! Scans one directory and deletes every file whose content duplicates the
//! first file of the same size, plus every empty file. Candidates are
//! compared through increasingly expensive signatures (size, 64-byte
//! prefix, sampled fingerprint, full digest) so most files are never read
//! in full.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;

use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::ScanSession;
use crate::error::ExitCode;
use crate::progress::Progress;

/// Run the application with parsed arguments.
///
/// Usage problems are reported on stderr and still return
/// [`ExitCode::Success`].
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let dir = match cli.target_dir() {
        Ok(dir) => dir.to_path_buf(),
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{}", cli::usage());
            return Ok(ExitCode::Success);
        }
    };

    let config = Config::load();
    let mut session_config = config.session_config();
    if config.show_progress && !cli.quiet {
        session_config = session_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    log::debug!("Session configuration: {:?}", session_config);

    let session = ScanSession::new(session_config);
    let report = session
        .scan_directory(&dir)
        .with_context(|| format!("failed to scan {}", dir.display()))?;

    report.summary.log_summary();
    log::info!("Finish");
    Ok(ExitCode::Success)
}
