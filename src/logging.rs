//! Logging infrastructure for dupsweep.
//!
//! This module provides structured logging using the `log` facade and `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! At info level a run prints one `deleted <path>` line per removed file and
//! a closing summary. Per-file verdicts appear at debug, signature
//! computations at trace.
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: Include timestamp, level, and module path for detailed debugging
//! - **Release builds**: Compact format with level and message only for cleaner output
//!
//! # Example
//!
//! ```rust,no_run
//! use dupsweep::logging::init_logging;
//!
//! // Initialize with verbose mode (-v)
//! init_logging(1, false);
//! log::debug!("visible");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Call once at startup. A second call leaves the first logger in place.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

/// Determine the log level from CLI flags.
///
/// `quiet` wins over any verbosity count.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configure the log format based on build type and verbosity.
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}
