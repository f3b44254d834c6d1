//! Recursive tree scanner built on the bounded worker pool.
//!
//! # Overview
//!
//! [`TreeScanner`] walks a root directory by submitting one pool unit per
//! directory. Each unit lists its directory once: subdirectories are recorded
//! and submitted as new units, regular files are hashed and appended to the
//! session. The walk ends when the pool's join barrier drains, i.e. when no
//! directory is left unlisted and no hash is outstanding.
//!
//! Each directory level is an independent unit, so tree depth never turns
//! into call-stack depth.
//!
//! # Failure model
//!
//! Only a root that cannot be listed fails the scan. Unreadable
//! subdirectories contribute no files; files whose content cannot be read
//! are recorded with an empty hash, which the classifier treats as unique.
//! Every absorbed failure is logged with its path.
//!
//! # Ordering
//!
//! The resulting file and directory lists are in completion order, which is
//! not deterministic. Determinism comes from the classifier's sort.

use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

use super::{Hasher, ScanError};
use crate::pool::{PoolStats, TaskContext, WorkerPool};
use crate::progress::{ProgressCallback, PHASE_SCAN};
use crate::session::{FileRecord, ScanSession};

/// What a scan found and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Regular files recorded (hashed or not)
    pub files: usize,
    /// Subdirectories discovered below the root
    pub directories: usize,
    /// Files recorded with an empty hash because reading them failed
    pub hash_failures: usize,
    /// Directories (or entries) that could not be listed
    pub listing_failures: usize,
    /// Statistics of the scan pool
    pub pool: PoolStats,
}

impl ScanReport {
    /// Whether any file or directory had to be skipped.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.hash_failures > 0 || self.listing_failures > 0 || self.pool.panicked > 0
    }
}

/// Recursive directory scanner.
///
/// # Example
///
/// ```no_run
/// use fileworker::scanner::{HashAlgorithm, Hasher, TreeScanner};
/// use fileworker::session::ScanSession;
/// use std::sync::Arc;
///
/// let session = Arc::new(ScanSession::new("/srv/data"));
/// let report = TreeScanner::new(Hasher::new(HashAlgorithm::Blake3), 4)
///     .scan(&session)
///     .unwrap();
///
/// assert_eq!(report.files, session.file_count());
/// ```
pub struct TreeScanner {
    hasher: Hasher,
    workers: usize,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for TreeScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeScanner")
            .field("hasher", &self.hasher)
            .field("workers", &self.workers)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// State shared by every directory unit of one scan.
struct ScanJob {
    session: Arc<ScanSession>,
    hasher: Hasher,
    progress: Option<Arc<dyn ProgressCallback>>,
    files: AtomicUsize,
    directories: AtomicUsize,
    hash_failures: AtomicUsize,
    listing_failures: AtomicUsize,
}

impl TreeScanner {
    /// Create a scanner running at most `workers` directory units at once.
    #[must_use]
    pub fn new(hasher: Hasher, workers: usize) -> Self {
        Self {
            hasher,
            workers,
            progress: None,
        }
    }

    /// Report each hashed file to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Walk the session's root and fill its file and directory lists.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `NotADirectory`, `PermissionDenied` or `Io` when the
    ///   root itself cannot be listed
    /// - `Pool` when the worker threads cannot be started
    pub fn scan(&self, session: &Arc<ScanSession>) -> Result<ScanReport, ScanError> {
        let root = session.root().to_path_buf();
        check_root(&root)?;

        log::info!(
            "Scanning {} with {} workers ({})",
            root.display(),
            self.workers,
            self.hasher.algorithm()
        );

        let job = Arc::new(ScanJob {
            session: Arc::clone(session),
            hasher: self.hasher,
            progress: self.progress.clone(),
            files: AtomicUsize::new(0),
            directories: AtomicUsize::new(0),
            hash_failures: AtomicUsize::new(0),
            listing_failures: AtomicUsize::new(0),
        });

        if let Some(ref progress) = self.progress {
            progress.on_phase_start(PHASE_SCAN, 0);
        }

        let pool = WorkerPool::new("scan", self.workers)?;
        let root_job = Arc::clone(&job);
        pool.submit(move |ctx| scan_directory(ctx, root, &root_job));
        let pool_stats = pool.join_all();

        if let Some(ref progress) = self.progress {
            progress.on_phase_end(PHASE_SCAN);
        }

        let report = ScanReport {
            files: job.files.load(Ordering::SeqCst),
            directories: job.directories.load(Ordering::SeqCst),
            hash_failures: job.hash_failures.load(Ordering::SeqCst),
            listing_failures: job.listing_failures.load(Ordering::SeqCst),
            pool: pool_stats,
        };

        log::info!(
            "Scan complete: {} files, {} directories ({} unhashable, {} unlistable)",
            report.files,
            report.directories,
            report.hash_failures,
            report.listing_failures
        );

        Ok(report)
    }
}

/// Fail fast when the root cannot be listed at all.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|e| ScanError::from_io(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| ScanError::from_io(root, e))?;
    Ok(())
}

/// Body of one directory unit.
fn scan_directory(ctx: &TaskContext, dir: PathBuf, job: &Arc<ScanJob>) {
    log::debug!("Open directory: {}", dir.display());

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Error opening directory {}: {}", dir.display(), e);
            job.listing_failures.fetch_add(1, Ordering::SeqCst);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("Error reading directory {}: {}", dir.display(), e);
                job.listing_failures.fetch_add(1, Ordering::SeqCst);
                continue;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                log::error!("Error reading file type of {}: {}", path.display(), e);
                job.listing_failures.fetch_add(1, Ordering::SeqCst);
                continue;
            }
        };

        if file_type.is_dir() {
            log::debug!("Go to child directory: {}", path.display());
            job.session.push_directory(path.clone());
            job.directories.fetch_add(1, Ordering::SeqCst);

            let child_job = Arc::clone(job);
            ctx.submit(move |ctx| scan_directory(ctx, path, &child_job));
        } else if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
        } else if file_type.is_file() {
            record_file(&entry, path, job);
        } else {
            log::trace!("Skipping special file: {}", path.display());
        }
    }
}

/// Build, hash and append the record for one regular file.
fn record_file(entry: &DirEntry, path: PathBuf, job: &ScanJob) {
    log::trace!("Found file: {}", path.display());

    let (size, modified) = match entry.metadata() {
        Ok(m) => (m.len(), m.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
        Err(e) => {
            log::warn!("Failed to read metadata of {}: {}", path.display(), e);
            (0, SystemTime::UNIX_EPOCH)
        }
    };

    let mut record = FileRecord::new(job.session.next_record_id(), path, size, modified);

    match job.hasher.hash_file(&record.path) {
        Ok(hash) => record.hash = hash,
        Err(e) => {
            log::error!("Can't get hash of file {}: {}", record.path.display(), e);
            job.hash_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    let display_path = record.path.to_string_lossy().into_owned();
    job.session.push_file(record);
    let done = job.files.fetch_add(1, Ordering::SeqCst) + 1;

    if let Some(ref progress) = job.progress {
        progress.on_progress(done, &display_path);
    }
}
