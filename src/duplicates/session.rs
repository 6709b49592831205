//! Scan session: drives classification and deletion over one directory.
//!
//! # Overview
//!
//! A [`ScanSession`] owns everything one scan needs: the signature provider,
//! the deletion executor and, for the duration of [`ScanSession::run`], the
//! size index. Nothing survives between runs.
//!
//! # Modes
//!
//! - **Sequential** (`io_threads == 1`, default): files are classified in
//!   listing order and each duplicate or empty file is deleted right after
//!   its verdict.
//! - **Parallel** (`io_threads > 1`): files are grouped by size, each group
//!   is classified on a rayon pool with its own index, and deletions are then
//!   applied in listing order. Verdicts match sequential mode because files
//!   of different sizes are never compared. Progress advances as files are
//!   classified, in completion order.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{ScanSession, SessionConfig};
//! use std::path::Path;
//!
//! let session = ScanSession::new(SessionConfig::default());
//! let report = session.scan_directory(Path::new("/home/user/Downloads")).unwrap();
//! println!("Deleted {} files", report.summary.deleted_files);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::classifier::{Classification, ClassifyError, DuplicateClassifier, Stage, Verdict};
use crate::actions::{DeleteConfig, DeletionExecutor};
use crate::progress::{ProgressCallback, PHASE_CLASSIFY};
use crate::scanner::{
    list_files, ContentSource, FileEntry, FsSource, HashAlgorithm, ScanError, SignatureProvider,
};

/// Configuration for a scan session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Worker threads; more than one enables parallel bucket classification.
    pub io_threads: usize,
    /// Digest algorithm for signatures.
    pub algorithm: HashAlgorithm,
    /// Deletion settings.
    pub delete: DeleteConfig,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("delete", &self.delete)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            algorithm: HashAlgorithm::default(),
            delete: DeleteConfig::default(),
            progress_callback: None,
        }
    }
}

impl SessionConfig {
    /// Set the number of worker threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the deletion settings.
    #[must_use]
    pub fn with_delete_config(mut self, delete: DeleteConfig) -> Self {
        self.delete = delete;
        self
    }

    /// Set a progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_parallel(&self) -> bool {
        self.io_threads > 1
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// The file's path
    pub path: PathBuf,
    /// Size at listing time
    pub size: u64,
    /// Classifier verdict
    pub verdict: Verdict,
    /// Stage that produced the verdict
    pub stage: Stage,
    /// Whether the file was removed
    pub deleted: bool,
}

/// Counters for a finished scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Files in the listing
    pub total_files: usize,
    /// Bytes in the listing
    pub total_size: u64,
    /// Files kept as the first of their size
    pub unique_files: usize,
    /// Files kept because their content differs from the retained file
    pub distinct_same_size: usize,
    /// Files classified as duplicates
    pub duplicate_files: usize,
    /// Zero-length files
    pub empty_files: usize,
    /// Files actually removed
    pub deleted_files: usize,
    /// Bytes freed by removed files
    pub bytes_reclaimed: u64,
    /// Files whose content could not be read, each listed once
    pub unreadable_files: BTreeSet<PathBuf>,
    /// Files that should have been deleted but were not
    pub delete_failures: Vec<(PathBuf, String)>,
    /// Files the classifier could not handle
    pub classify_errors: usize,
    /// Wall-clock time of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    fn record(&mut self, classification: &Classification) {
        match classification.verdict {
            Verdict::Unique => self.unique_files += 1,
            Verdict::Duplicate => self.duplicate_files += 1,
            Verdict::DistinctSameSize => self.distinct_same_size += 1,
            Verdict::Empty => self.empty_files += 1,
        }
        if let Some(path) = &classification.unreadable {
            self.unreadable_files.insert(path.clone());
        }
    }

    /// Files left in place.
    #[must_use]
    pub fn kept_files(&self) -> usize {
        self.total_files - self.deleted_files
    }

    /// Format reclaimed space as human-readable string.
    #[must_use]
    pub fn reclaimed_display(&self) -> String {
        ByteSize::b(self.bytes_reclaimed).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// Whether any deletion or classification failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.delete_failures.is_empty() || self.classify_errors > 0
    }

    /// Write the summary to the log at info level.
    pub fn log_summary(&self) {
        log::info!(
            "Scanned {} files ({}) in {:.2?}",
            self.total_files,
            self.total_size_display(),
            self.scan_duration
        );
        log::info!(
            "{} unique, {} distinct same-size, {} duplicate, {} empty",
            self.unique_files,
            self.distinct_same_size,
            self.duplicate_files,
            self.empty_files
        );
        log::info!(
            "Deleted {} files, reclaimed {}",
            self.deleted_files,
            self.reclaimed_display()
        );
        if !self.unreadable_files.is_empty() {
            log::warn!("{} files could not be read", self.unreadable_files.len());
            for path in &self.unreadable_files {
                log::debug!("Unreadable: {}", path.display());
            }
        }
        if !self.delete_failures.is_empty() {
            log::warn!("{} files could not be deleted", self.delete_failures.len());
        }
        if self.classify_errors > 0 {
            log::warn!("{} files could not be classified", self.classify_errors);
        }
    }
}

/// Result of a scan: per-file outcomes in listing order plus counters.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Counters
    pub summary: ScanSummary,
    /// One entry per classified file, in listing order
    pub outcomes: Vec<FileOutcome>,
}

impl ScanReport {
    /// Paths that were deleted, in deletion order.
    #[must_use]
    pub fn deleted_paths(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|o| o.deleted)
            .map(|o| o.path.as_path())
            .collect()
    }

    /// Outcome for `path`, if it was classified.
    #[must_use]
    pub fn outcome(&self, path: &Path) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.path == path)
    }
}

type Classified = (usize, Result<Classification, ClassifyError>);

/// One scan over one directory.
pub struct ScanSession<S = FsSource> {
    config: SessionConfig,
    signatures: Arc<SignatureProvider<S>>,
    executor: DeletionExecutor,
}

impl<S> fmt::Debug for ScanSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish()
    }
}

impl ScanSession<FsSource> {
    /// Session over the filesystem using `config`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let signatures = SignatureProvider::new(config.algorithm);
        let executor = DeletionExecutor::new(config.delete);
        Self::with_parts(config, signatures, executor)
    }
}

impl<S: ContentSource> ScanSession<S> {
    /// Session with a custom signature provider and deletion executor.
    ///
    /// `config.algorithm` and `config.delete` are ignored in favor of the
    /// given parts.
    #[must_use]
    pub fn with_parts(
        config: SessionConfig,
        signatures: SignatureProvider<S>,
        executor: DeletionExecutor,
    ) -> Self {
        Self {
            config,
            signatures: Arc::new(signatures),
            executor,
        }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// List `dir` and run the scan over its files.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` only if `dir` cannot be listed. Failures on
    /// individual files are recorded in the report.
    pub fn scan_directory(&self, dir: &Path) -> Result<ScanReport, ScanError> {
        let files = list_files(dir)?;
        log::info!("Scanning {} files in {}", files.len(), dir.display());
        Ok(self.run(files))
    }

    /// Classify `files` in the given order and delete duplicates and empty files.
    pub fn run(&self, files: Vec<FileEntry>) -> ScanReport {
        let start = Instant::now();
        let mut report = ScanReport {
            summary: ScanSummary {
                total_files: files.len(),
                total_size: files.iter().map(|f| f.size).sum(),
                ..ScanSummary::default()
            },
            outcomes: Vec::with_capacity(files.len()),
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_CLASSIFY, files.len());
        }

        if self.config.is_parallel() {
            log::debug!(
                "Classifying by size bucket on {} threads",
                self.config.io_threads
            );
            for (index, result) in self.classify_buckets(&files) {
                self.apply(&files[index], result, &mut report);
            }
        } else {
            let mut classifier = DuplicateClassifier::new(Arc::clone(&self.signatures));
            for (index, file) in files.iter().enumerate() {
                self.report_progress(index + 1, file);
                let result = classifier.classify(file);
                self.apply(file, result, &mut report);
            }
            log::debug!("Size index holds {} entries", classifier.index().len());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_CLASSIFY);
        }

        report.summary.scan_duration = start.elapsed();
        report
    }

    /// Classify each size bucket on its own classifier, in parallel.
    ///
    /// Progress is reported as files are classified, in completion order.
    /// Returns results sorted by listing index.
    fn classify_buckets(&self, files: &[FileEntry]) -> Vec<Classified> {
        let mut bucket_of_size: HashMap<u64, usize> = HashMap::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        for (index, file) in files.iter().enumerate() {
            let bucket = *bucket_of_size.entry(file.size).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[bucket].push(index);
        }

        let classified = AtomicUsize::new(0);
        let classify_bucket = |indices: &Vec<usize>| -> Vec<Classified> {
            let mut classifier = DuplicateClassifier::new(Arc::clone(&self.signatures));
            indices
                .iter()
                .map(|&index| {
                    let file = &files[index];
                    let position = classified.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report_progress(position, file);
                    (index, classifier.classify(file))
                })
                .collect()
        };

        let mut results: Vec<Classified> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(|| buckets.par_iter().flat_map_iter(classify_bucket).collect()),
            Err(e) => {
                log::warn!(
                    "Failed to create thread pool ({}), classifying on the calling thread",
                    e
                );
                buckets.iter().flat_map(classify_bucket).collect()
            }
        };

        results.sort_by_key(|(index, _)| *index);
        results
    }

    fn report_progress(&self, position: usize, file: &FileEntry) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(position, &file.path.to_string_lossy());
        }
    }

    fn apply(
        &self,
        file: &FileEntry,
        result: Result<Classification, ClassifyError>,
        report: &mut ScanReport,
    ) {
        let classification = match result {
            Ok(classification) => classification,
            Err(e) => {
                log::warn!("Cannot classify {}: {}", file.path.display(), e);
                report.summary.classify_errors += 1;
                return;
            }
        };
        report.summary.record(&classification);

        let mut deleted = false;
        if classification.verdict.should_delete() {
            match self.executor.delete(file) {
                Ok(result) => {
                    deleted = true;
                    report.summary.deleted_files += 1;
                    report.summary.bytes_reclaimed += result.size;
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_item_completed(result.size);
                    }
                }
                Err(e) => {
                    log::warn!("Cannot delete {}: {}", file.path.display(), e);
                    report
                        .summary
                        .delete_failures
                        .push((file.path.clone(), e.to_string()));
                }
            }
        }

        report.outcomes.push(FileOutcome {
            path: file.path.clone(),
            size: file.size,
            verdict: classification.verdict,
            stage: classification.stage,
            deleted,
        });
    }
}
