//! Single-level directory listing using jwalk.
//!
//! # Overview
//!
//! [`list_files`] returns the regular, writable files directly inside a
//! directory, sorted by file name without regard to case. Subdirectories are never entered,
//! symbolic links and hidden entries are skipped. Per-entry failures are
//! logged and skipped; only a bad root aborts the listing.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::list_files;
//! use std::path::Path;
//!
//! for file in list_files(Path::new("/home/user/Downloads")).unwrap() {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

use std::path::Path;

use jwalk::{Parallelism, WalkDir};

use super::{FileEntry, ScanError};

/// List the regular, writable files directly inside `root`.
///
/// Paths are absolute; the order is by file name, compared case-insensitively
/// with the exact name as the tie-break, and is the order in which the
/// classifier sees the files.
///
/// # Errors
///
/// - `NotFound` if `root` does not exist
/// - `NotADirectory` if `root` is not a directory
/// - `Io` / `PermissionDenied` if `root` cannot be resolved
pub fn list_files(root: &Path) -> Result<Vec<FileEntry>, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = root
        .canonicalize()
        .map_err(|e| ScanError::from_io(root, e))?;

    log::debug!("Listing {}", root.display());

    let walk_dir = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .skip_hidden(true)
        .sort(false)
        .parallelism(Parallelism::Serial);

    let mut files = Vec::new();
    for entry_result in walk_dir {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if path == root {
            continue;
        }

        let file_type = entry.file_type();
        if !file_type.is_file() {
            log::trace!("Skipping non-regular entry: {}", path.display());
            continue;
        }

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("{}", ScanError::from_io(&path, e));
                continue;
            }
        };

        if metadata.permissions().readonly() || !writable_by_current_user(&path) {
            log::debug!("Skipping read-only file: {}", path.display());
            continue;
        }

        files.push(FileEntry::new(
            path,
            metadata.len(),
            metadata.modified().ok(),
        ));
    }

    files.sort_by_cached_key(|file| {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.to_lowercase(), name)
    });

    log::debug!("Listed {} files in {}", files.len(), root.display());
    Ok(files)
}

/// Whether the current user may write `path`, as answered by access(2).
///
/// A 0644 file owned by another user passes the `readonly()` check but
/// fails this one.
#[cfg(unix)]
fn writable_by_current_user(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn writable_by_current_user(_path: &Path) -> bool {
    true
}
