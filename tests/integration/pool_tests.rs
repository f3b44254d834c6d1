use fileworker::actions::{DuplicateDeleter, RandomCopier};
use fileworker::pool::WorkerPool;
use fileworker::scanner::{Hasher, TreeScanner};
use fileworker::session::ScanSession;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const LIMITS: [usize; 4] = [1, 2, 4, 8];

/// Counts bodies running right now and remembers the highest count seen.
#[derive(Default)]
struct Gauge {
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

fn build_tree(root: &Path, dirs: usize, files_per_dir: usize) {
    for d in 0..dirs {
        let sub = root.join(format!("dir{d}")).join("inner");
        fs::create_dir_all(&sub).unwrap();
        for f in 0..files_per_dir {
            fs::write(sub.join(format!("f{f}.dat")), format!("content {}", f % 4)).unwrap();
        }
    }
}

#[test]
fn test_running_units_never_exceed_limit() {
    for limit in LIMITS {
        let pool = WorkerPool::new("gauge", limit).unwrap();
        let gauge = Arc::new(Gauge::default());

        for _ in 0..24 {
            let gauge = Arc::clone(&gauge);
            pool.submit(move |ctx| {
                gauge.enter();
                for _ in 0..2 {
                    let gauge = Arc::clone(&gauge);
                    ctx.submit(move |_| {
                        gauge.enter();
                        thread::sleep(Duration::from_millis(2));
                        gauge.exit();
                    });
                }
                thread::sleep(Duration::from_millis(2));
                gauge.exit();
            });
        }

        let stats = pool.join_all();
        assert_eq!(stats.completed, 72);
        assert_eq!(stats.submitted, 72);
        assert!(gauge.peak.load(Ordering::SeqCst) <= limit);
        assert!(stats.peak_running <= limit);
        assert_eq!(gauge.running.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn test_panicking_units_release_their_tokens() {
    for limit in LIMITS {
        let pool = WorkerPool::new("panics", limit).unwrap();
        let survivors = Arc::new(AtomicUsize::new(0));

        for i in 0..(limit * 3) {
            let survivors = Arc::clone(&survivors);
            pool.submit(move |_| {
                if i % 2 == 0 {
                    panic!("unit {i} failed");
                }
                survivors.fetch_add(1, Ordering::SeqCst);
            });
        }
        let stats = pool.join_all();

        assert_eq!(stats.completed, limit * 3);
        assert_eq!(stats.panicked, (limit * 3).div_ceil(2));
        assert_eq!(survivors.load(Ordering::SeqCst), (limit * 3) / 2);

        // Every token came back, so a second wave runs to completion.
        let after = Arc::new(AtomicUsize::new(0));
        for _ in 0..limit {
            let after = Arc::clone(&after);
            pool.submit(move |_| {
                after.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.join_all();
        assert_eq!(after.load(Ordering::SeqCst), limit);
    }
}

#[test]
fn test_scan_respects_limit() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), 12, 5);

    for limit in LIMITS {
        let session = Arc::new(ScanSession::new(dir.path()));
        let report = TreeScanner::new(Hasher::default(), limit)
            .scan(&session)
            .unwrap();

        assert_eq!(report.files, 60);
        assert_eq!(report.pool.limit, limit);
        assert!(report.pool.peak_running <= limit);
        assert_eq!(report.pool.panicked, 0);
        // One unit per directory: root, 12 dirN and 12 inner.
        assert_eq!(report.pool.completed, 25);
    }
}

#[test]
fn test_delete_and_copy_respect_limit() {
    for limit in LIMITS {
        let dir = tempdir().unwrap();
        build_tree(dir.path(), 4, 8);

        let session = Arc::new(ScanSession::new(dir.path()));
        TreeScanner::new(Hasher::default(), limit)
            .scan(&session)
            .unwrap();
        let duplicates = session.classify();
        assert_eq!(duplicates.len(), 32 - 4);

        let deleted = DuplicateDeleter::new(limit)
            .delete(&session, &duplicates)
            .unwrap();
        assert_eq!(deleted.deleted, 28);
        assert!(deleted.pool.peak_running <= limit);

        let remaining = Arc::new(ScanSession::new(dir.path()));
        TreeScanner::new(Hasher::default(), limit)
            .scan(&remaining)
            .unwrap();
        let copied = RandomCopier::new(limit, 64, 30)
            .with_seed(limit as u64)
            .random_copy(&remaining, &remaining.files(), &remaining.directories())
            .unwrap();
        assert!(copied.pool.peak_running <= limit);
        assert_eq!(copied.pool.completed, copied.planned);
    }
}
