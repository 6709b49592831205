//! Staged duplicate classification.
//!
//! # Overview
//!
//! [`DuplicateClassifier::classify`] decides, for one incoming file, whether
//! it duplicates the retained entry of its size bucket:
//!
//! 1. **Size** - empty files are [`Verdict::Empty`]; the first file of a size
//!    becomes the retained entry ([`Verdict::Unique`]).
//! 2. **Prefix** - different first 64 bytes ⇒ [`Verdict::DistinctSameSize`].
//! 3. **Rapid fingerprint** - different ⇒ `DistinctSameSize`. Below 1 MiB the
//!    fingerprint already is the full digest, so a match is final.
//! 4. **Full digest** - equal ⇒ [`Verdict::Duplicate`], else `DistinctSameSize`.
//!
//! Only the first file of a size is ever indexed. A later file that differs
//! from it is left alone but never becomes a second anchor, so a third file
//! of that size is compared only against the first.
//!
//! An unreadable signature on either side ends the comparison with
//! `DistinctSameSize`: an unreadable file is never deleted. The
//! classification names the file that failed, which is the retained entry
//! when its side is checked first.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::index::{IndexError, RetainedEntry, SizeIndex};
use crate::scanner::{ContentSource, FileEntry, Fingerprint, FsSource, Probe, SignatureProvider};

/// Result of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// First file of its size; now the retained entry.
    Unique,
    /// Content-equal to the retained entry of its size.
    Duplicate,
    /// Same size as the retained entry, different (or unreadable) content.
    DistinctSameSize,
    /// Zero-length file.
    Empty,
}

impl Verdict {
    /// Whether the file should be deleted.
    #[must_use]
    pub fn should_delete(self) -> bool {
        matches!(self, Self::Duplicate | Self::Empty)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "unique"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::DistinctSameSize => write!(f, "distinct"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Comparison stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Decided by size alone.
    Size,
    /// Decided by the prefix signature.
    Prefix,
    /// Decided by the rapid fingerprint.
    RapidFingerprint,
    /// Decided by the full digest.
    FullDigest,
}

/// A verdict with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The verdict
    pub verdict: Verdict,
    /// Deciding stage
    pub stage: Stage,
    /// Retained entry the file was compared against (none for size decisions)
    pub retained: Option<PathBuf>,
    /// File whose signature could not be read, on either side
    pub unreadable: Option<PathBuf>,
}

impl Classification {
    fn by_size(verdict: Verdict) -> Self {
        Self {
            verdict,
            stage: Stage::Size,
            retained: None,
            unreadable: None,
        }
    }

    fn against(entry: &RetainedEntry, verdict: Verdict, stage: Stage) -> Self {
        Self {
            verdict,
            stage,
            retained: Some(entry.file().path.clone()),
            unreadable: None,
        }
    }

    fn unreadable(mut self, path: &Path) -> Self {
        self.unreadable = Some(path.to_path_buf());
        self
    }
}

/// Errors that can occur while classifying.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    /// The size index rejected an insert.
    #[error("size index error: {0}")]
    Index(#[from] IndexError),
}

/// Staged comparator over a [`SizeIndex`].
///
/// Owns its index for the lifetime of one scan; the signature provider is
/// shared so several classifiers can run over disjoint size buckets.
pub struct DuplicateClassifier<S = FsSource> {
    index: SizeIndex,
    signatures: Arc<SignatureProvider<S>>,
}

impl<S> fmt::Debug for DuplicateClassifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateClassifier")
            .field("index", &self.index)
            .field("signatures", &"<provider>")
            .finish()
    }
}

impl<S: ContentSource> DuplicateClassifier<S> {
    /// Create a classifier with an empty index.
    #[must_use]
    pub fn new(signatures: Arc<SignatureProvider<S>>) -> Self {
        Self {
            index: SizeIndex::new(),
            signatures,
        }
    }

    /// The size index built so far.
    #[must_use]
    pub fn index(&self) -> &SizeIndex {
        &self.index
    }

    /// Classify one file against the retained entry of its size.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::Index` only if the size index contract is
    /// violated; I/O failures are folded into the verdict.
    pub fn classify(&mut self, file: &FileEntry) -> Result<Classification, ClassifyError> {
        let classification = self.decide(file)?;
        log::debug!(
            "{}: {} ({:?} stage)",
            file.path.display(),
            classification.verdict,
            classification.stage
        );
        Ok(classification)
    }

    fn decide(&mut self, file: &FileEntry) -> Result<Classification, ClassifyError> {
        if file.size == 0 {
            return Ok(Classification::by_size(Verdict::Empty));
        }

        let signatures = &self.signatures;
        let Some(entry) = self.index.lookup(file.size) else {
            self.index
                .insert(file.size, RetainedEntry::new(file.clone()))?;
            return Ok(Classification::by_size(Verdict::Unique));
        };

        // Stage 1: prefix
        if entry.prefix_with(|f| signatures.prefix(f)).is_unreadable() {
            return Ok(distinct(entry, Stage::Prefix).unreadable(&entry.file().path));
        }
        let incoming_prefix = signatures.prefix(file);
        if incoming_prefix.is_unreadable() {
            return Ok(distinct(entry, Stage::Prefix).unreadable(&file.path));
        }
        if !entry.prefix_with(|f| signatures.prefix(f)).matches(&incoming_prefix) {
            return Ok(distinct(entry, Stage::Prefix));
        }

        // Stage 2: rapid fingerprint
        if entry
            .rapid_with(|f| signatures.rapid_fingerprint(f))
            .is_unreadable()
        {
            return Ok(distinct(entry, Stage::RapidFingerprint).unreadable(&entry.file().path));
        }
        let incoming_rapid = signatures.rapid_fingerprint(file);
        if incoming_rapid.is_unreadable() {
            return Ok(distinct(entry, Stage::RapidFingerprint).unreadable(&file.path));
        }
        let retained_rapid = entry.rapid_with(|f| signatures.rapid_fingerprint(f));
        if !retained_rapid.matches(&incoming_rapid) {
            return Ok(distinct(entry, Stage::RapidFingerprint));
        }
        let both_full = is_full(retained_rapid) && is_full(&incoming_rapid);
        if both_full {
            return Ok(Classification::against(
                entry,
                Verdict::Duplicate,
                Stage::RapidFingerprint,
            ));
        }

        // Stage 3: full digest
        if entry.full_with(|f| signatures.full_digest(f)).is_unreadable() {
            return Ok(distinct(entry, Stage::FullDigest).unreadable(&entry.file().path));
        }
        let incoming_full = signatures.full_digest(file);
        if incoming_full.is_unreadable() {
            return Ok(distinct(entry, Stage::FullDigest).unreadable(&file.path));
        }
        let verdict = if entry
            .full_with(|f| signatures.full_digest(f))
            .matches(&incoming_full)
        {
            Verdict::Duplicate
        } else {
            Verdict::DistinctSameSize
        };
        Ok(Classification::against(entry, verdict, Stage::FullDigest))
    }
}

fn distinct(entry: &RetainedEntry, stage: Stage) -> Classification {
    Classification::against(entry, Verdict::DistinctSameSize, stage)
}

fn is_full(probe: &Probe<Fingerprint>) -> bool {
    probe.ready().is_some_and(Fingerprint::is_full)
}
