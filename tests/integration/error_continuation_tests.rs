use dupsweep::actions::{DeleteConfig, DeleteError, DeletionExecutor, Remover};
use dupsweep::duplicates::{ScanSession, SessionConfig, Verdict};
use dupsweep::scanner::{
    ContentSource, FileEntry, FsSource, HashAlgorithm, HashError, SignatureProvider,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write file");
    FileEntry::from_path(&path).unwrap()
}

/// Fails every removal of a path whose name starts with "stuck".
struct SelectiveRemover;

impl Remover for SelectiveRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        let stuck = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with("stuck"));
        if stuck {
            Err(io::Error::other("resource busy"))
        } else {
            fs::remove_file(path)
        }
    }

    fn is_permanent(&self) -> bool {
        true
    }
}

/// Filesystem reads, except for paths containing "locked".
struct LockedSource(FsSource);

impl LockedSource {
    fn check(path: &Path) -> Result<(), HashError> {
        if path.to_string_lossy().contains("locked") {
            Err(HashError::PermissionDenied(path.to_path_buf()))
        } else {
            Ok(())
        }
    }
}

impl ContentSource for LockedSource {
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, HashError> {
        Self::check(path)?;
        self.0.read_at(path, offset, len)
    }

    fn stream(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64, HashError> {
        Self::check(path)?;
        self.0.stream(path, sink)
    }
}

#[test]
fn test_failed_deletion_does_not_abort_scan() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        create_temp_file(&dir, "a_orig.txt", b"hello"),
        create_temp_file(&dir, "b_copy.txt", b"hello"),
        create_temp_file(&dir, "stuck_copy.txt", b"hello"),
        create_temp_file(&dir, "stuck_empty.txt", b""),
        create_temp_file(&dir, "z_copy.txt", b"hello"),
    ];

    let executor =
        DeletionExecutor::with_remover(DeleteConfig::default(), Box::new(SelectiveRemover));
    let session = ScanSession::with_parts(
        SessionConfig::default(),
        SignatureProvider::new(HashAlgorithm::Blake3),
        executor,
    );
    let report = session.run(files.clone());

    assert_eq!(report.summary.deleted_files, 2);
    assert_eq!(report.summary.delete_failures.len(), 2);
    assert!(report.summary.has_failures());
    assert!(files[0].path.exists());
    assert!(!files[1].path.exists());
    assert!(files[2].path.exists());
    assert!(files[3].path.exists());
    assert!(!files[4].path.exists());

    let failed: Vec<&PathBuf> = report.summary.delete_failures.iter().map(|(p, _)| p).collect();
    assert_eq!(failed, vec![&files[2].path, &files[3].path]);
    assert!(report.summary.delete_failures[0].1.contains("resource busy"));
}

#[test]
fn test_unreadable_files_are_kept() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        create_temp_file(&dir, "a_locked.txt", b"hello"),
        create_temp_file(&dir, "b.txt", b"hello"),
        create_temp_file(&dir, "c.txt", b"hello"),
        create_temp_file(&dir, "d.txt", b"other!"),
        create_temp_file(&dir, "e_locked.txt", b"other!"),
    ];

    let session = ScanSession::with_parts(
        SessionConfig::default(),
        SignatureProvider::with_source(LockedSource(FsSource::new()), HashAlgorithm::Blake3),
        DeletionExecutor::new(DeleteConfig::default()),
    );
    let report = session.run(files.clone());

    let verdicts: Vec<Verdict> = report.outcomes.iter().map(|o| o.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Unique,
            Verdict::DistinctSameSize,
            Verdict::DistinctSameSize,
            Verdict::Unique,
            Verdict::DistinctSameSize,
        ]
    );
    // The locked anchor is hit twice but counted once; readable files are not counted
    let unreadable: Vec<&PathBuf> = report.summary.unreadable_files.iter().collect();
    assert_eq!(unreadable, vec![&files[0].path, &files[4].path]);
    assert_eq!(report.summary.deleted_files, 0);
    assert!(files.iter().all(|f| f.path.exists()));
}

#[test]
fn test_file_vanished_before_deletion() {
    let dir = TempDir::new().unwrap();
    let a = create_temp_file(&dir, "a.txt", b"");
    fs::remove_file(&a.path).unwrap();

    let report = ScanSession::new(SessionConfig::default()).run(vec![a.clone()]);

    assert_eq!(report.outcomes[0].verdict, Verdict::Empty);
    assert!(!report.outcomes[0].deleted);
    assert_eq!(report.summary.delete_failures.len(), 1);
}

#[test]
fn test_file_changed_after_listing_is_kept() {
    let dir = TempDir::new().unwrap();
    let a = create_temp_file(&dir, "a.txt", b"hello");
    let b = create_temp_file(&dir, "b.txt", b"hello");
    // Grows after it was listed; signatures still see the old size bucket
    fs::write(&b.path, b"hello, much longer now").unwrap();

    let executor = DeletionExecutor::new(DeleteConfig::default());
    let err = executor.delete(&b).unwrap_err();
    assert!(matches!(err, DeleteError::Modified(_)));

    let report = ScanSession::new(SessionConfig::default()).run(vec![a.clone(), b.clone()]);
    assert!(a.path.exists());
    assert!(b.path.exists());
    assert_eq!(report.summary.deleted_files, 0);
}
