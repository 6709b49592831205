use dupsweep::actions::{DeleteConfig, DeleteMode};
use dupsweep::duplicates::{ScanSession, SessionConfig, Stage, Verdict};
use dupsweep::scanner::{list_files, HashAlgorithm};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write file");
    path
}

fn remaining(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sweep(dir: &Path, config: SessionConfig) -> dupsweep::duplicates::ScanReport {
    ScanSession::new(config)
        .scan_directory(dir)
        .expect("Scan failed")
}

#[test]
fn test_basic_scenario() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "a.txt", b"hello");
    create_temp_file(&dir, "b.txt", b"hello");
    create_temp_file(&dir, "c.txt", b"world");
    create_temp_file(&dir, "empty.txt", b"");

    let report = sweep(dir.path(), SessionConfig::default());

    assert_eq!(remaining(dir.path()), vec!["a.txt", "c.txt"]);

    let verdicts: Vec<(String, Verdict)> = report
        .outcomes
        .iter()
        .map(|o| {
            (
                o.path.file_name().unwrap().to_string_lossy().into_owned(),
                o.verdict,
            )
        })
        .collect();
    assert_eq!(
        verdicts,
        vec![
            ("a.txt".to_string(), Verdict::Unique),
            ("b.txt".to_string(), Verdict::Duplicate),
            ("c.txt".to_string(), Verdict::DistinctSameSize),
            ("empty.txt".to_string(), Verdict::Empty),
        ]
    );

    let summary = &report.summary;
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.deleted_files, 2);
    assert_eq!(summary.bytes_reclaimed, 5);
    assert!(!summary.has_failures());
}

#[test]
fn test_second_scan_deletes_nothing() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "a.txt", b"hello");
    create_temp_file(&dir, "b.txt", b"hello");
    create_temp_file(&dir, "c.txt", b"hello again");
    create_temp_file(&dir, "d.txt", b"hello again");

    let first = sweep(dir.path(), SessionConfig::default());
    assert_eq!(first.summary.deleted_files, 2);

    let second = sweep(dir.path(), SessionConfig::default());
    assert_eq!(second.summary.deleted_files, 0);
    assert_eq!(second.summary.unique_files, 2);
    assert_eq!(remaining(dir.path()), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_empty_files_always_deleted() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "only_empty_1", b"");
    create_temp_file(&dir, "only_empty_2", b"");
    create_temp_file(&dir, "z_content", b"data");

    let report = sweep(dir.path(), SessionConfig::default());

    assert_eq!(report.summary.empty_files, 2);
    assert_eq!(remaining(dir.path()), vec!["z_content"]);
}

#[test]
fn test_first_seen_wins_by_name_order() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "zeta.txt", b"payload");
    create_temp_file(&dir, "alpha.txt", b"payload");
    create_temp_file(&dir, "mid.txt", b"payload");

    sweep(dir.path(), SessionConfig::default());

    assert_eq!(remaining(dir.path()), vec!["alpha.txt"]);
}

#[test]
fn test_subdirectories_untouched() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "a.txt", b"same");
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("a.txt"), b"same").unwrap();
    fs::write(sub.join("empty"), b"").unwrap();

    let report = sweep(dir.path(), SessionConfig::default());

    assert_eq!(report.summary.total_files, 1);
    assert!(sub.join("a.txt").exists());
    assert!(sub.join("empty").exists());
}

#[test]
fn test_third_file_only_compared_with_first() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "1.txt", b"aaaa");
    create_temp_file(&dir, "2.txt", b"bbbb");
    create_temp_file(&dir, "3.txt", b"bbbb");

    let report = sweep(dir.path(), SessionConfig::default());

    // 3.txt equals 2.txt, but only 1.txt anchors the size
    assert_eq!(remaining(dir.path()), vec!["1.txt", "2.txt", "3.txt"]);
    assert_eq!(report.summary.distinct_same_size, 2);
}

#[test]
fn test_prefix_stage_rejects_early() {
    let dir = TempDir::new().unwrap();
    let mut a = vec![b'x'; 4096];
    let b = a.clone();
    a[0] = b'y';
    create_temp_file(&dir, "a.bin", &a);
    create_temp_file(&dir, "b.bin", &b);

    let report = sweep(dir.path(), SessionConfig::default());

    let outcome = &report.outcomes[1];
    assert_eq!(outcome.verdict, Verdict::DistinctSameSize);
    assert_eq!(outcome.stage, Stage::Prefix);
}

#[test]
fn test_sha256_gives_same_result() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "a.txt", b"hello");
    create_temp_file(&dir, "b.txt", b"hello");
    create_temp_file(&dir, "c.txt", b"world");

    let report = sweep(
        dir.path(),
        SessionConfig::default().with_algorithm(HashAlgorithm::Sha256),
    );

    assert_eq!(report.summary.deleted_files, 1);
    assert_eq!(remaining(dir.path()), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_parallel_mode_matches_sequential() {
    let make_tree = || {
        let dir = TempDir::new().unwrap();
        for i in 0..60u32 {
            let len = 20 + (i % 7) as usize;
            let fill = b'a' + (i % 3) as u8;
            let content = if i % 11 == 0 { Vec::new() } else { vec![fill; len] };
            create_temp_file(&dir, &format!("file_{i:03}.dat"), &content);
        }
        dir
    };

    let seq_dir = make_tree();
    let par_dir = make_tree();

    let seq = sweep(seq_dir.path(), SessionConfig::default());
    let par = sweep(par_dir.path(), SessionConfig::default().with_io_threads(4));

    let seq_verdicts: Vec<_> = seq.outcomes.iter().map(|o| (o.verdict, o.deleted)).collect();
    let par_verdicts: Vec<_> = par.outcomes.iter().map(|o| (o.verdict, o.deleted)).collect();
    assert_eq!(seq_verdicts, par_verdicts);
    assert_eq!(remaining(seq_dir.path()), remaining(par_dir.path()));
}

#[test]
fn test_listing_matches_scan_order() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "b", b"1");
    create_temp_file(&dir, "a", b"22");
    create_temp_file(&dir, "c", b"333");

    let listed: Vec<PathBuf> = list_files(dir.path())
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect();
    let report = sweep(dir.path(), SessionConfig::default());
    let scanned: Vec<PathBuf> = report.outcomes.iter().map(|o| o.path.clone()).collect();

    assert_eq!(listed, scanned);
}

#[test]
fn test_verification_disabled_still_deletes() {
    let dir = TempDir::new().unwrap();
    create_temp_file(&dir, "a.txt", b"copy");
    create_temp_file(&dir, "b.txt", b"copy");

    let config = SessionConfig::default().with_delete_config(
        DeleteConfig::default()
            .with_mode(DeleteMode::Permanent)
            .with_verify_before_delete(false),
    );
    let report = sweep(dir.path(), config);

    assert_eq!(report.summary.deleted_files, 1);
    assert_eq!(remaining(dir.path()), vec!["a.txt"]);
}

#[test]
fn test_scan_missing_directory_fails() {
    let result = ScanSession::new(SessionConfig::default())
        .scan_directory(Path::new("/nonexistent/dupsweep/dir"));
    assert!(result.is_err());
}
