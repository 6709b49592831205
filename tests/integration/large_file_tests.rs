use dupsweep::duplicates::{ScanSession, SessionConfig, Stage, Verdict};
use dupsweep::scanner::{
    sample_offsets, FileEntry, Fingerprint, HashAlgorithm, SignatureProvider, PREFIX_LEN,
    RAPID_THRESHOLD, SAMPLE_WINDOW,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TWO_MIB: usize = 2 * 1024 * 1024;

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn create_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// An offset outside the prefix and every sampled window.
fn unsampled_offset(size: u64) -> usize {
    let offsets = sample_offsets(size);
    let offset = offsets[1] + 100;
    assert!(offset as usize >= PREFIX_LEN);
    assert!(offsets
        .iter()
        .all(|&o| offset < o || offset >= o + SAMPLE_WINDOW as u64));
    offset as usize
}

#[test]
fn test_identical_large_files_are_duplicates() {
    let dir = TempDir::new().unwrap();
    let content = patterned(TWO_MIB);
    create_temp_file(&dir, "a.bin", &content);
    let b = create_temp_file(&dir, "b.bin", &content);

    let report = ScanSession::new(SessionConfig::default())
        .scan_directory(dir.path())
        .unwrap();

    let outcome = &report.outcomes[1];
    assert_eq!(outcome.verdict, Verdict::Duplicate);
    assert_eq!(outcome.stage, Stage::FullDigest);
    assert!(!b.exists());
    assert_eq!(report.summary.bytes_reclaimed, TWO_MIB as u64);
}

#[test]
fn test_unsampled_difference_is_not_deleted() {
    let dir = TempDir::new().unwrap();
    let a = patterned(TWO_MIB);
    let mut b = a.clone();
    let offset = unsampled_offset(TWO_MIB as u64);
    b[offset] ^= 0xFF;
    let path_a = create_temp_file(&dir, "a.bin", &a);
    let path_b = create_temp_file(&dir, "b.bin", &b);

    // The sampled fingerprints collide
    let provider = SignatureProvider::new(HashAlgorithm::Blake3);
    let entry_a = FileEntry::from_path(&path_a).unwrap();
    let entry_b = FileEntry::from_path(&path_b).unwrap();
    let rapid_a = provider.try_rapid_fingerprint(&entry_a).unwrap();
    let rapid_b = provider.try_rapid_fingerprint(&entry_b).unwrap();
    assert!(matches!(rapid_a, Fingerprint::Sampled { .. }));
    assert_eq!(rapid_a, rapid_b);

    let report = ScanSession::new(SessionConfig::default())
        .scan_directory(dir.path())
        .unwrap();

    let outcome = &report.outcomes[1];
    assert_eq!(outcome.verdict, Verdict::DistinctSameSize);
    assert_eq!(outcome.stage, Stage::FullDigest);
    assert!(path_a.exists());
    assert!(path_b.exists());
    assert_eq!(report.summary.deleted_files, 0);
}

#[test]
fn test_sampled_difference_rejected_at_fingerprint() {
    let dir = TempDir::new().unwrap();
    let a = patterned(TWO_MIB);
    let mut b = a.clone();
    let offsets = sample_offsets(TWO_MIB as u64);
    b[offsets[10] as usize] ^= 0xFF;
    create_temp_file(&dir, "a.bin", &a);
    create_temp_file(&dir, "b.bin", &b);

    let report = ScanSession::new(SessionConfig::default())
        .scan_directory(dir.path())
        .unwrap();

    let outcome = &report.outcomes[1];
    assert_eq!(outcome.verdict, Verdict::DistinctSameSize);
    assert_eq!(outcome.stage, Stage::RapidFingerprint);
}

#[test]
fn test_small_file_fingerprint_equals_full_digest() {
    let dir = TempDir::new().unwrap();
    let provider = SignatureProvider::new(HashAlgorithm::Blake3);

    for len in [1usize, 63, 64, 65, 4096, RAPID_THRESHOLD as usize - 1] {
        let path = create_temp_file(&dir, &format!("f{len}.bin"), &patterned(len));
        let entry = FileEntry::from_path(&path).unwrap();

        let rapid = provider.try_rapid_fingerprint(&entry).unwrap();
        let full = provider.try_full_digest(&entry).unwrap();
        assert_eq!(rapid.to_bytes(), full.as_bytes().to_vec(), "size {len}");
    }
}
