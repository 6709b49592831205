//! Size index: one retained entry per file size.
//!
//! # Overview
//!
//! The [`SizeIndex`] maps a file size to the first file seen with that size
//! (its [`RetainedEntry`]). Entries live in an arena owned by the index and
//! are addressed through [`EntryId`]; nothing else holds a reference to them,
//! so the classifier processing a size is the only writer of its entry.
//!
//! Each entry caches its prefix, rapid fingerprint and full digest. A cached
//! value is computed on first use and reused for every later comparison
//! against that size, including an [`Probe::Unreadable`] outcome.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::{RetainedEntry, SizeIndex};
//! use dupsweep::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let mut index = SizeIndex::new();
//! let file = FileEntry::new(PathBuf::from("/a.txt"), 5, None);
//!
//! assert!(index.lookup(5).is_none());
//! index.insert(5, RetainedEntry::new(file)).unwrap();
//! assert!(index.lookup(5).is_some());
//! assert!(index.insert(5, RetainedEntry::new(FileEntry::new(PathBuf::from("/b.txt"), 5, None))).is_err());
//! ```

use std::collections::HashMap;

use crate::scanner::{Digest, FileEntry, Fingerprint, Probe};

/// Position of an entry in the index arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

impl EntryId {
    /// Arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised by [`SizeIndex::insert`].
///
/// These are contract violations by the caller, not user-facing failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The size already has a retained entry.
    #[error("size {size} already has a retained entry")]
    SizeOccupied {
        /// The occupied size
        size: u64,
    },

    /// The entry's file does not have the size it is filed under.
    #[error("entry of {actual} bytes filed under size {size}")]
    SizeMismatch {
        /// Size key used for the insert
        size: u64,
        /// Size of the entry's file
        actual: u64,
    },
}

/// The retained representative of one size bucket and its cached signatures.
#[derive(Debug, Clone)]
pub struct RetainedEntry {
    file: FileEntry,
    prefix: Option<Probe<Vec<u8>>>,
    rapid: Option<Probe<Fingerprint>>,
    full: Option<Probe<Digest>>,
}

impl RetainedEntry {
    /// Wrap a file with no signatures computed yet.
    #[must_use]
    pub fn new(file: FileEntry) -> Self {
        Self {
            file,
            prefix: None,
            rapid: None,
            full: None,
        }
    }

    /// The retained file.
    #[must_use]
    pub fn file(&self) -> &FileEntry {
        &self.file
    }

    /// Cached prefix, computing it with `compute` on first use.
    pub fn prefix_with(
        &mut self,
        compute: impl FnOnce(&FileEntry) -> Probe<Vec<u8>>,
    ) -> &Probe<Vec<u8>> {
        let file = &self.file;
        self.prefix.get_or_insert_with(|| compute(file))
    }

    /// Cached rapid fingerprint, computing it with `compute` on first use.
    pub fn rapid_with(
        &mut self,
        compute: impl FnOnce(&FileEntry) -> Probe<Fingerprint>,
    ) -> &Probe<Fingerprint> {
        let file = &self.file;
        self.rapid.get_or_insert_with(|| compute(file))
    }

    /// Cached full digest, computing it with `compute` on first use.
    pub fn full_with(&mut self, compute: impl FnOnce(&FileEntry) -> Probe<Digest>) -> &Probe<Digest> {
        let file = &self.file;
        self.full.get_or_insert_with(|| compute(file))
    }

    /// Cached prefix, if computed.
    #[must_use]
    pub fn cached_prefix(&self) -> Option<&Probe<Vec<u8>>> {
        self.prefix.as_ref()
    }

    /// Cached rapid fingerprint, if computed.
    #[must_use]
    pub fn cached_rapid(&self) -> Option<&Probe<Fingerprint>> {
        self.rapid.as_ref()
    }

    /// Cached full digest, if computed.
    #[must_use]
    pub fn cached_full(&self) -> Option<&Probe<Digest>> {
        self.full.as_ref()
    }
}

/// Mapping from file size to its retained entry.
#[derive(Debug, Clone, Default)]
pub struct SizeIndex {
    slots: HashMap<u64, EntryId>,
    entries: Vec<RetainedEntry>,
}

impl SizeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The retained entry for `size`, if any.
    pub fn lookup(&mut self, size: u64) -> Option<&mut RetainedEntry> {
        let id = *self.slots.get(&size)?;
        self.entries.get_mut(id.0)
    }

    /// Read-only access to the retained entry for `size`.
    #[must_use]
    pub fn get(&self, size: u64) -> Option<&RetainedEntry> {
        self.slots.get(&size).and_then(|id| self.entries.get(id.0))
    }

    /// Whether `size` already has a retained entry.
    #[must_use]
    pub fn contains(&self, size: u64) -> bool {
        self.slots.contains_key(&size)
    }

    /// Record the retained entry for `size`.
    ///
    /// # Errors
    ///
    /// - `SizeOccupied` if `size` already has an entry; callers check
    ///   [`Self::lookup`] first
    /// - `SizeMismatch` if the entry's file is not `size` bytes
    pub fn insert(&mut self, size: u64, entry: RetainedEntry) -> Result<EntryId, IndexError> {
        if entry.file.size != size {
            return Err(IndexError::SizeMismatch {
                size,
                actual: entry.file.size,
            });
        }
        if self.slots.contains_key(&size) {
            return Err(IndexError::SizeOccupied { size });
        }

        let id = EntryId(self.entries.len());
        self.entries.push(entry);
        self.slots.insert(size, id);
        Ok(id)
    }

    /// Number of retained entries (distinct sizes seen).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no size has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &RetainedEntry> {
        self.entries.iter()
    }
}
