use fileworker::actions::{CopyReport, RandomCopier};
use fileworker::app::run_random_copy;
use fileworker::config::Settings;
use fileworker::scanner::{Hasher, TreeScanner};
use fileworker::session::ScanSession;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn scan(root: &Path) -> Arc<ScanSession> {
    let session = Arc::new(ScanSession::new(root));
    TreeScanner::new(Hasher::default(), 2)
        .scan(&session)
        .unwrap();
    session
}

fn copy_with_seed(root: &Path, bound: usize, seed: u64) -> (Arc<ScanSession>, CopyReport) {
    let session = scan(root);
    let report = RandomCopier::new(4, 7, bound)
        .with_seed(seed)
        .random_copy(&session, &session.files(), &session.directories())
        .unwrap();
    (session, report)
}

#[test]
fn test_zero_bound_creates_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();

    let (session, report) = copy_with_seed(dir.path(), 0, 1);

    assert_eq!(report.planned, 0);
    assert_eq!(report.copied, 0);
    assert_eq!(report.pool.submitted, 0);
    assert_eq!(session.random_copy_count(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    fs::write(dir.path().join("copy_a.txt"), "keep me").unwrap();

    // Only a.txt is offered as a source, so every unit targets copy_a.txt.
    let mut any_planned = false;
    for seed in 0..20 {
        let session = scan(dir.path());
        let sources: Vec<_> = session
            .files()
            .into_iter()
            .filter(|f| f.name == "a.txt")
            .collect();
        let report = RandomCopier::new(3, 512, 20)
            .with_seed(seed)
            .random_copy(&session, &sources, &session.directories())
            .unwrap();

        any_planned |= report.planned > 0;
        assert_eq!(report.copied, 0);
        assert_eq!(report.skipped_existing, report.planned);
        assert!(report.failures.is_empty());
        assert_eq!(session.random_copy_count(), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("copy_a.txt")).unwrap(),
            "keep me"
        );
    }
    assert!(any_planned);
}

#[test]
fn test_copies_carry_source_hash_and_back_reference() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("only.txt"), "payload bytes").unwrap();

    let mut checked = false;
    for seed in 0..20 {
        let (session, report) = copy_with_seed(dir.path(), 10, seed);
        let source = session
            .files()
            .into_iter()
            .find(|f| f.name == "only.txt")
            .unwrap();

        assert_eq!(
            report.copied + report.skipped_existing + report.failures.len(),
            report.planned
        );
        assert_eq!(session.random_copy_count(), report.copied);

        for copy in session.random_copies() {
            assert_eq!(copy.name, "copy_only.txt");
            assert_eq!(copy.hash, source.hash);
            assert_eq!(copy.original, Some(source.id));
            assert_eq!(copy.size, source.size);
            assert_eq!(fs::read(&copy.path).unwrap(), b"payload bytes");
            checked = true;
        }

        if checked {
            break;
        }
    }
    assert!(checked);
}

#[test]
fn test_copy_without_directories_or_files_submits_nothing() {
    let dir = tempdir().unwrap();
    let session = scan(dir.path());

    let report = RandomCopier::new(2, 512, 50)
        .with_seed(3)
        .random_copy(&session, &session.files(), &session.directories())
        .unwrap();

    assert_eq!(report.planned, 0);
    assert_eq!(report.copied, 0);
    assert_eq!(report.pool.submitted, 0);
    assert!(report.all_succeeded());
    assert!(report.summary().starts_with("Created 0 of 0 planned copies"));
}

#[test]
fn test_run_random_copy_totals() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("one.txt"), "1").unwrap();
    fs::write(dir.path().join("nested/two.txt"), "2").unwrap();

    let settings = Settings {
        source_path: dir.path().to_path_buf(),
        workers: 2,
        random_copy_iterations: 5,
        random_copy: true,
        ..Settings::default()
    };
    let mut out = Vec::new();
    let run = run_random_copy(&settings, None, &mut out).unwrap();

    assert_eq!(run.scan.files, 2);
    assert!(run.copy.copied <= 4);
    assert!(run.copy.planned < 5);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!(
        "Count created random copy files: {}",
        run.copy.copied
    )));
    assert!(text.contains(&format!(
        "Total files after random copy: {}",
        2 + run.copy.copied
    )));

    let on_disk = scan(dir.path()).file_count();
    assert_eq!(on_disk, 2 + run.copy.copied);
}
