//! Content signatures: prefix, rapid fingerprint and full digest.
//!
//! # Overview
//!
//! Three signatures of increasing cost, compared in order by the classifier:
//!
//! 1. **Prefix** - the first [`PREFIX_LEN`] bytes (the whole file if smaller).
//!    Different prefixes rule a duplicate out; equal prefixes prove nothing.
//! 2. **Rapid fingerprint** - the full digest for files under
//!    [`RAPID_THRESHOLD`]. Larger files sample [`SAMPLE_COUNT`] windows of
//!    [`SAMPLE_WINDOW`] bytes, hash the concatenation and tag the result with
//!    the file size. Not collision-free.
//! 3. **Full digest** - the whole content streamed through the digest
//!    algorithm. Authoritative.
//!
//! A signature that cannot be computed because of an I/O failure is reported
//! as [`Probe::Unreadable`], which never matches anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::source::{ContentSource, FsSource};
use super::{FileEntry, HashError};

/// Number of leading bytes in the prefix signature.
pub const PREFIX_LEN: usize = 64;

/// Files below this size use the full digest as their rapid fingerprint (1 MiB).
pub const RAPID_THRESHOLD: u64 = 1024 * 1024;

/// Number of sampled windows in a rapid fingerprint.
pub const SAMPLE_COUNT: u64 = 256;

/// Bytes read at the start of each sampling stride.
pub const SAMPLE_WINDOW: usize = 8;

/// Bytes at the end of the file excluded from the stride computation.
pub const TAIL_RESERVE: u64 = 100;

/// Width of the size tag prepended to sampled fingerprints.
pub const SIZE_TAG_WIDTH: usize = 16;

const SIZE_TAG_FILL: u8 = b'*';

/// Digest algorithm used for full digests and sampled fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Digest a byte slice in one call.
    #[must_use]
    pub fn digest(self, bytes: &[u8]) -> Digest {
        let mut state = self.start();
        state.update(bytes);
        state.finalize()
    }

    /// Start an incremental digest.
    #[must_use]
    pub fn start(self) -> DigestState {
        match self {
            Self::Blake3 => DigestState::Blake3(Box::new(blake3::Hasher::new())),
            Self::Sha256 => DigestState::Sha256(sha2::Sha256::new()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Incremental digest state for a [`HashAlgorithm`].
pub enum DigestState {
    /// BLAKE3 hasher
    Blake3(Box<blake3::Hasher>),
    /// SHA-256 hasher
    Sha256(sha2::Sha256),
}

impl DigestState {
    /// Feed more bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(bytes);
            }
            Self::Sha256(hasher) => hasher.update(bytes),
        }
    }

    /// Finish and return the digest.
    #[must_use]
    pub fn finalize(self) -> Digest {
        match self {
            Self::Blake3(hasher) => Digest(*hasher.finalize().as_bytes()),
            Self::Sha256(hasher) => Digest(hasher.finalize().into()),
        }
    }
}

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Rapid fingerprint of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// File below [`RAPID_THRESHOLD`]: the fingerprint is the full digest.
    Full(Digest),
    /// Larger file: size tag plus digest of the sampled windows.
    Sampled {
        /// Size in lowercase hex, left-justified and padded with `*`
        size_tag: [u8; SIZE_TAG_WIDTH],
        /// Digest of the concatenated sample windows
        digest: Digest,
    },
}

impl Fingerprint {
    /// Byte form of the fingerprint.
    ///
    /// For [`Fingerprint::Full`] this is exactly the full digest.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Full(digest) => digest.0.to_vec(),
            Self::Sampled { size_tag, digest } => {
                let mut bytes = Vec::with_capacity(SIZE_TAG_WIDTH + digest.0.len());
                bytes.extend_from_slice(size_tag);
                bytes.extend_from_slice(&digest.0);
                bytes
            }
        }
    }

    /// Whether this fingerprint already is the full digest.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Outcome of computing one signature.
///
/// `Unreadable` stands in for a signature whose file could not be read. It
/// never matches, not even another `Unreadable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The signature was computed.
    Ready(T),
    /// The file could not be read.
    Unreadable,
}

impl<T> Probe<T> {
    /// Whether the file could not be read.
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable)
    }

    /// The computed signature, if any.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unreadable => None,
        }
    }

    /// Convert a read result, logging the failure.
    pub fn from_result(result: Result<T, HashError>, what: &str) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => {
                log::warn!("Cannot compute {}: {}", what, e);
                Self::Unreadable
            }
        }
    }
}

impl<T: PartialEq> Probe<T> {
    /// Whether two probes prove equal signatures.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ready(a), Self::Ready(b)) => a == b,
            _ => false,
        }
    }
}

/// Fixed-width size tag: lowercase hex, left-justified, padded with `*`.
#[must_use]
pub fn size_tag(size: u64) -> [u8; SIZE_TAG_WIDTH] {
    let hex = format!("{size:x}");
    let mut tag = [SIZE_TAG_FILL; SIZE_TAG_WIDTH];
    // u64 never needs more than 16 hex digits
    tag[..hex.len()].copy_from_slice(hex.as_bytes());
    tag
}

/// Offsets of the sampled windows for a file of `size` bytes.
#[must_use]
pub fn sample_offsets(size: u64) -> Vec<u64> {
    let stride = size.saturating_sub(TAIL_RESERVE) / SAMPLE_COUNT;
    (0..SAMPLE_COUNT).map(|i| stride * i).collect()
}

/// Computes signatures over a [`ContentSource`].
#[derive(Debug, Clone)]
pub struct SignatureProvider<S = FsSource> {
    source: S,
    algorithm: HashAlgorithm,
}

impl SignatureProvider<FsSource> {
    /// Signature provider over the filesystem.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self::with_source(FsSource::new(), algorithm)
    }
}

impl<S: ContentSource> SignatureProvider<S> {
    /// Signature provider over a custom content source.
    #[must_use]
    pub fn with_source(source: S, algorithm: HashAlgorithm) -> Self {
        Self { source, algorithm }
    }

    /// The digest algorithm in use.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The underlying content source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// First [`PREFIX_LEN`] bytes of the file, or the whole file if smaller.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened or read.
    pub fn try_prefix(&self, file: &FileEntry) -> Result<Vec<u8>, HashError> {
        let len = file.size.min(PREFIX_LEN as u64) as usize;
        let prefix = self.source.read_at(&file.path, 0, len)?;
        log::trace!("Prefix computed: {} ({} bytes)", file.path.display(), prefix.len());
        Ok(prefix)
    }

    /// Digest of the entire file content.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened or read fully.
    pub fn try_full_digest(&self, file: &FileEntry) -> Result<Digest, HashError> {
        let mut state = self.algorithm.start();
        let bytes = self
            .source
            .stream(&file.path, &mut |chunk| state.update(chunk))?;
        let digest = state.finalize();
        log::trace!(
            "Full digest computed: {} ({} bytes) {}",
            file.path.display(),
            bytes,
            digest.to_hex()
        );
        Ok(digest)
    }

    /// Rapid fingerprint: the full digest below [`RAPID_THRESHOLD`], a
    /// size-tagged sampled digest otherwise.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if any read fails.
    pub fn try_rapid_fingerprint(&self, file: &FileEntry) -> Result<Fingerprint, HashError> {
        if file.size < RAPID_THRESHOLD {
            return self.try_full_digest(file).map(Fingerprint::Full);
        }

        let offsets = sample_offsets(file.size);
        let samples = self
            .source
            .read_windows(&file.path, &offsets, SAMPLE_WINDOW)?;
        let fingerprint = Fingerprint::Sampled {
            size_tag: size_tag(file.size),
            digest: self.algorithm.digest(&samples),
        };
        log::trace!(
            "Rapid fingerprint computed: {} ({} sampled bytes)",
            file.path.display(),
            samples.len()
        );
        Ok(fingerprint)
    }

    /// [`Self::try_prefix`], with failures turned into [`Probe::Unreadable`].
    pub fn prefix(&self, file: &FileEntry) -> Probe<Vec<u8>> {
        Probe::from_result(self.try_prefix(file), "prefix")
    }

    /// [`Self::try_full_digest`], with failures turned into [`Probe::Unreadable`].
    pub fn full_digest(&self, file: &FileEntry) -> Probe<Digest> {
        Probe::from_result(self.try_full_digest(file), "full digest")
    }

    /// [`Self::try_rapid_fingerprint`], with failures turned into [`Probe::Unreadable`].
    pub fn rapid_fingerprint(&self, file: &FileEntry) -> Probe<Fingerprint> {
        Probe::from_result(self.try_rapid_fingerprint(file), "rapid fingerprint")
    }
}
