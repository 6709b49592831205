//! Byte-range and streaming reads over file content.
//!
//! Signature computation goes through the [`ContentSource`] trait so the
//! classifier can be exercised against in-memory content as well as the
//! filesystem. [`FsSource`] is the filesystem implementation.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::HashError;

/// Default buffer size for streaming reads (64 KiB).
pub const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Read access to file content.
pub trait ContentSource: Send + Sync {
    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes when the file ends before `offset + len`.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened, seeked or read.
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, HashError>;

    /// Read a `len`-byte window at each offset and concatenate them in order.
    ///
    /// # Errors
    ///
    /// Returns `HashError` on the first failed window.
    fn read_windows(&self, path: &Path, offsets: &[u64], len: usize) -> Result<Vec<u8>, HashError> {
        let mut out = Vec::with_capacity(offsets.len() * len);
        for &offset in offsets {
            out.extend(self.read_at(path, offset, len)?);
        }
        Ok(out)
    }

    /// Feed the whole file to `sink` in order and return the byte count.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened or read fully.
    fn stream(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64, HashError>;
}

/// Filesystem-backed [`ContentSource`].
#[derive(Debug, Clone)]
pub struct FsSource {
    buffer_size: usize,
}

impl Default for FsSource {
    fn default() -> Self {
        Self {
            buffer_size: STREAM_BUFFER_SIZE,
        }
    }
}

impl FsSource {
    /// Create a source with the default streaming buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom streaming buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    fn open(path: &Path) -> Result<File, HashError> {
        File::open(path).map_err(|e| HashError::from_io(path, e))
    }

    fn read_window(
        file: &mut File,
        path: &Path,
        offset: u64,
        len: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), HashError> {
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| HashError::from_io(path, e))?;
        file.by_ref()
            .take(len as u64)
            .read_to_end(out)
            .map_err(|e| HashError::from_io(path, e))?;
        Ok(())
    }
}

impl ContentSource for FsSource {
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, HashError> {
        let mut file = Self::open(path)?;
        let mut out = Vec::with_capacity(len);
        Self::read_window(&mut file, path, offset, len, &mut out)?;
        Ok(out)
    }

    // One open for all windows instead of one per window.
    fn read_windows(&self, path: &Path, offsets: &[u64], len: usize) -> Result<Vec<u8>, HashError> {
        let mut file = Self::open(path)?;
        let mut out = Vec::with_capacity(offsets.len() * len);
        for &offset in offsets {
            Self::read_window(&mut file, path, offset, len, &mut out)?;
        }
        Ok(out)
    }

    fn stream(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64, HashError> {
        let mut file = Self::open(path)?;
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            sink(&buffer[..read]);
            total += read as u64;
        }

        Ok(total)
    }
}
