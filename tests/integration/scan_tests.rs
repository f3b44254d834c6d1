use fileworker::scanner::{HashAlgorithm, Hasher, TreeScanner};
use fileworker::session::ScanSession;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn scan(root: &Path, workers: usize) -> Arc<ScanSession> {
    let session = Arc::new(ScanSession::new(root));
    TreeScanner::new(Hasher::default(), workers)
        .scan(&session)
        .unwrap();
    session
}

/// `a.txt` = "X", `sub/b.txt` = "X", `sub/c.txt` = "Y".
fn scenario_tree(root: &Path) {
    fs::create_dir(root.join("sub")).unwrap();
    File::create(root.join("a.txt"))
        .unwrap()
        .write_all(b"X")
        .unwrap();
    File::create(root.join("sub/b.txt"))
        .unwrap()
        .write_all(b"X")
        .unwrap();
    File::create(root.join("sub/c.txt"))
        .unwrap()
        .write_all(b"Y")
        .unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let session = scan(dir.path(), 4);

    assert_eq!(session.file_count(), 0);
    assert!(session.classify().is_empty());
    assert_eq!(session.directories(), vec![dir.path().to_path_buf()]);
}

#[test]
fn test_scan_scenario_one_duplicate() {
    let dir = tempdir().unwrap();
    scenario_tree(dir.path());

    let session = scan(dir.path(), 4);
    let duplicates = session.classify();

    assert_eq!(session.file_count(), 3);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].path, dir.path().join("sub/b.txt"));

    let original = session.original_of(&duplicates[0]).unwrap();
    assert_eq!(original.path, dir.path().join("a.txt"));

    let files = session.files();
    let c = files.iter().find(|f| f.name == "c.txt").unwrap();
    assert!(!c.is_duplicate());
    assert!(files.iter().all(|f| f.original != Some(c.id)));
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    for (name, content) in [("a.txt", "content a"), ("b.txt", "content b"), ("c.txt", "c")] {
        fs::write(dir.path().join(name), content).unwrap();
    }

    let session = scan(dir.path(), 2);

    assert_eq!(session.file_count(), 3);
    assert!(session.classify().is_empty());
}

#[test]
fn test_scan_result_is_independent_of_worker_count() {
    let dir = tempdir().unwrap();
    for d in 0..5 {
        let sub = dir.path().join(format!("d{d}"));
        fs::create_dir(&sub).unwrap();
        for f in 0..6 {
            fs::write(sub.join(format!("f{f}.txt")), format!("{}", f % 3)).unwrap();
        }
    }

    let pairs = |workers| -> Vec<(PathBuf, PathBuf)> {
        let session = scan(dir.path(), workers);
        session
            .classify()
            .iter()
            .map(|d| (d.path.clone(), session.original_of(d).unwrap().path))
            .collect()
    };

    let single = pairs(1);
    assert_eq!(single.len(), 30 - 3);
    assert_eq!(single, pairs(8));
}

#[test]
fn test_scan_records_metadata() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("sized.bin"), vec![0u8; 1234]).unwrap();

    let session = scan(dir.path(), 1);
    let files = session.files();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "sized.bin");
    assert_eq!(files[0].size, 1234);
    assert!(files[0].path.is_absolute());
    assert!(files[0].modified > std::time::SystemTime::UNIX_EPOCH);
}

#[test]
fn test_scan_with_blake3_finds_same_duplicates() {
    let dir = tempdir().unwrap();
    scenario_tree(dir.path());

    let session = Arc::new(ScanSession::new(dir.path()));
    TreeScanner::new(Hasher::new(HashAlgorithm::Blake3), 3)
        .scan(&session)
        .unwrap();

    let duplicates = session.classify();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].hash.len(), 64);
}

#[test]
#[cfg(unix)]
fn test_unreadable_file_is_never_a_duplicate() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("b.txt"), "same").unwrap();
    let locked = dir.path().join("0-locked.txt");
    fs::write(&locked, "same").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read the file anyway; nothing to check then.
    if File::open(&locked).is_ok() {
        return;
    }

    let session = Arc::new(ScanSession::new(dir.path()));
    let report = TreeScanner::new(Hasher::default(), 2)
        .scan(&session)
        .unwrap();
    let duplicates = session.classify();

    assert_eq!(report.hash_failures, 1);
    assert_eq!(session.file_count(), 3);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].path, dir.path().join("b.txt"));

    let locked_record = session.files().into_iter().find(|f| f.path == locked).unwrap();
    assert!(!locked_record.has_hash());
    assert!(!locked_record.is_duplicate());
    assert!(duplicates.iter().all(|d| d.original != Some(locked_record.id)));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
#[cfg(unix)]
fn test_unreadable_directory_contributes_nothing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("visible.txt"), "v").unwrap();
    let closed = dir.path().join("closed");
    fs::create_dir(&closed).unwrap();
    fs::write(closed.join("hidden.txt"), "h").unwrap();
    fs::set_permissions(&closed, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&closed).is_ok() {
        fs::set_permissions(&closed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let session = Arc::new(ScanSession::new(dir.path()));
    let report = TreeScanner::new(Hasher::default(), 2)
        .scan(&session)
        .unwrap();

    assert_eq!(session.file_count(), 1);
    assert_eq!(report.listing_failures, 1);
    assert!(report.has_failures());

    fs::set_permissions(&closed, fs::Permissions::from_mode(0o755)).unwrap();
}
