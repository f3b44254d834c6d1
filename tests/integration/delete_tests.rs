use fileworker::actions::{ConfirmError, DeleteError, DuplicateDeleter};
use fileworker::app::run_duplicate_scan;
use fileworker::config::Settings;
use fileworker::scanner::{Hasher, TreeScanner};
use fileworker::session::ScanSession;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn scan(root: &Path) -> Arc<ScanSession> {
    let session = Arc::new(ScanSession::new(root));
    TreeScanner::new(Hasher::default(), 4)
        .scan(&session)
        .unwrap();
    session
}

fn settings(root: &Path) -> Settings {
    Settings {
        source_path: root.to_path_buf(),
        workers: 3,
        delete_duplicates: true,
        ..Settings::default()
    }
}

#[test]
fn test_scenario_unattended_delete() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("sub/b.txt"), "X").unwrap();
    fs::write(dir.path().join("sub/c.txt"), "Y").unwrap();

    let settings = Settings {
        unattended: true,
        ..settings(dir.path())
    };
    let mut out = Vec::new();
    let run = run_duplicate_scan(&settings, None, &b""[..], &mut out).unwrap();

    let deletion = run.deletion.unwrap();
    assert_eq!(deletion.attempted, 1);
    assert_eq!(deletion.deleted, 1);
    assert_eq!(run.session.deleted_count(), 1);
    assert_eq!(run.session.deleted()[0].path, dir.path().join("sub/b.txt"));

    assert!(!dir.path().join("sub/b.txt").exists());
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("sub/c.txt").exists());

    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("(Y/N)"));
    assert!(text.contains("Files deleted: 1 of 1"));
}

#[test]
fn test_rescan_after_delete_finds_no_duplicates() {
    let dir = tempdir().unwrap();
    for group in 0..4 {
        for copy in 0..=group {
            let sub = dir.path().join(format!("g{group}"));
            fs::create_dir_all(&sub).unwrap();
            fs::write(sub.join(format!("c{copy}.bin")), format!("group {group}")).unwrap();
        }
    }

    let session = scan(dir.path());
    let duplicates = session.classify();
    assert_eq!(duplicates.len(), 1 + 2 + 3);

    let report = DuplicateDeleter::new(2)
        .delete(&session, &duplicates)
        .unwrap();
    assert_eq!(report.deleted, 6);
    assert!(report.all_succeeded());

    let rescanned = scan(dir.path());
    assert_eq!(rescanned.file_count(), 4);
    assert!(rescanned.classify().is_empty());

    let hashes: HashSet<_> = rescanned.files().into_iter().map(|f| f.hash).collect();
    assert_eq!(hashes.len(), 4);
}

#[test]
fn test_prompt_accepts_after_reprompt() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();

    let mut out = Vec::new();
    let run = run_duplicate_scan(&settings(dir.path()), None, &b"maybe\ny\n"[..], &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("Delete this duplicate files? (Y/N): ").count(), 2);
    assert_eq!(run.deletion.unwrap().deleted, 1);
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_prompt_declined_keeps_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();

    let mut out = Vec::new();
    let run = run_duplicate_scan(&settings(dir.path()), None, &b"N\n"[..], &mut out).unwrap();

    assert!(run.deletion.unwrap().declined);
    assert!(dir.path().join("b.txt").exists());
    assert_eq!(run.session.deleted_count(), 0);
}

#[test]
fn test_prompt_eof_fails_the_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();

    let mut out = Vec::new();
    let err = run_duplicate_scan(&settings(dir.path()), None, &b""[..], &mut out).unwrap_err();

    let cause = err.downcast_ref::<DeleteError>().unwrap();
    assert!(matches!(cause, DeleteError::Confirm(ConfirmError::Eof)));
    assert!(dir.path().join("b.txt").exists());
}

#[test]
fn test_vanished_duplicate_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();
    fs::write(dir.path().join("c.txt"), "X").unwrap();

    let session = scan(dir.path());
    let duplicates = session.classify();
    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let report = DuplicateDeleter::new(4)
        .delete(&session, &duplicates)
        .unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, dir.path().join("b.txt"));
    assert!(dir.path().join("a.txt").exists());
}
