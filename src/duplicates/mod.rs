//! Duplicate detection: size index, staged classifier and scan session.
//!
//! # Architecture
//!
//! - [`index`]: one retained entry per file size, with cached signatures
//! - [`classifier`]: decides a [`Verdict`] for each incoming file
//! - [`session`]: runs the classifier over a listing and deletes the losers
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{ScanSession, SessionConfig};
//! use std::path::Path;
//!
//! let report = ScanSession::new(SessionConfig::default().with_io_threads(4))
//!     .scan_directory(Path::new("."))
//!     .unwrap();
//! report.summary.log_summary();
//! ```

pub mod classifier;
pub mod index;
pub mod session;

pub use classifier::{Classification, ClassifyError, DuplicateClassifier, Stage, Verdict};
pub use index::{EntryId, IndexError, RetainedEntry, SizeIndex};
pub use session::{FileOutcome, ScanReport, ScanSession, ScanSummary, SessionConfig};
