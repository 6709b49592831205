use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use dupsweep::run_app;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn quiet_cli(path: Option<PathBuf>) -> Cli {
    Cli {
        path,
        verbose: 0,
        quiet: true,
    }
}

#[test]
fn test_missing_argument_exits_successfully() {
    let code = run_app(quiet_cli(None)).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_nonexistent_path_exits_successfully() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let code = run_app(quiet_cli(Some(missing.clone()))).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!missing.exists());
}

#[test]
fn test_file_path_exits_successfully_and_leaves_files() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("a.txt");
    let twin = dir.path().join("b.txt");
    let empty = dir.path().join("empty.txt");
    fs::write(&target, b"hello").unwrap();
    fs::write(&twin, b"hello").unwrap();
    fs::write(&empty, b"").unwrap();

    let code = run_app(quiet_cli(Some(target.clone()))).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read(&target).unwrap(), b"hello");
    assert!(twin.exists());
    assert!(empty.exists());
}
