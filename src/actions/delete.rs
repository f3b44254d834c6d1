//! Concurrent removal of classified duplicates.
//!
//! # Overview
//!
//! [`DuplicateDeleter`] removes every record of a duplicate list under its own
//! worker pool. Each removal is one unit of work:
//! - success appends the record to the session's deleted list
//! - failure is logged with its path and collected in the report
//!
//! A failed removal never stops the batch. The report says how many removals
//! were attempted and how many succeeded.
//!
//! # Safety
//!
//! Only records carrying a back-reference to an original are removed, so a
//! hash group always keeps its original on disk.
//!
//! # Example
//!
//! ```no_run
//! use fileworker::actions::delete::DuplicateDeleter;
//! use fileworker::session::ScanSession;
//! use std::sync::Arc;
//!
//! let session = Arc::new(ScanSession::new("/srv/data"));
//! // ... scan and classify ...
//! let duplicates = session.duplicates();
//!
//! let report = DuplicateDeleter::new(4).delete(&session, &duplicates).unwrap();
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::confirm::{prompt_confirmation, ConfirmError};
use crate::pool::{PoolError, PoolStats, WorkerPool};
use crate::progress::{ProgressCallback, PHASE_DELETE};
use crate::session::{FileRecord, ScanSession};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The record has no original, so removing it could lose the last copy.
    #[error("not a duplicate, refusing to delete: {0}")]
    NotADuplicate(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The confirmation prompt could not be answered.
    #[error(transparent)]
    Confirm(#[from] ConfirmError),

    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotADuplicate(p)
            | Self::Io { path: p, .. } => Some(p),
            Self::Confirm(_) | Self::Pool(_) => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// One removal that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteReport {
    /// Removals submitted to the pool
    pub attempted: usize,
    /// Removals that succeeded
    pub deleted: usize,
    /// Removals that failed, with their errors
    pub failures: Vec<DeleteFailure>,
    /// Total bytes freed, by scanned size
    pub bytes_freed: u64,
    /// The user answered "N" at the prompt
    pub declined: bool,
    /// Statistics of the delete pool
    pub pool: PoolStats,
}

impl DeleteReport {
    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.pool.panicked == 0
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.declined {
            return "Deletion declined".to_string();
        }

        let freed = bytesize::ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.deleted, freed)
        } else {
            format!(
                "Deleted {} of {} file(s), {} failed, freed {}",
                self.deleted,
                self.attempted,
                self.attempted - self.deleted,
                freed
            )
        }
    }
}

/// Remove one duplicate from disk.
///
/// # Errors
///
/// - `NotADuplicate` if the record has no original
/// - `NotFound` / `PermissionDenied` / `Io` if the removal fails
pub fn remove_duplicate(record: &FileRecord) -> Result<(), DeleteError> {
    if !record.is_duplicate() {
        return Err(DeleteError::NotADuplicate(record.path.clone()));
    }

    fs::remove_file(&record.path).map_err(|e| DeleteError::from_io(&record.path, e))?;
    log::debug!("Deleted duplicate: {}", record.path.display());
    Ok(())
}

/// Concurrent duplicate remover.
pub struct DuplicateDeleter {
    workers: usize,
    progress: Option<Arc<dyn ProgressCallback>>,
}

struct DeleteJob {
    session: Arc<ScanSession>,
    progress: Option<Arc<dyn ProgressCallback>>,
    finished: AtomicUsize,
    deleted: AtomicUsize,
    bytes_freed: AtomicU64,
    failures: Mutex<Vec<DeleteFailure>>,
}

impl DuplicateDeleter {
    /// Create a deleter running at most `workers` removals at once.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Ask for confirmation unless `unattended`, then delete.
    ///
    /// An "N" answer returns a report with `declined` set and touches nothing.
    ///
    /// # Errors
    ///
    /// - `Confirm` if the prompt hits end of input or an I/O failure
    /// - `Pool` if the worker threads cannot be started
    pub fn delete_confirmed<R: BufRead, W: Write>(
        &self,
        session: &Arc<ScanSession>,
        duplicates: &[FileRecord],
        unattended: bool,
        input: R,
        output: W,
    ) -> Result<DeleteReport, DeleteError> {
        if unattended {
            log::info!("Unattended mode: deleting without confirmation");
        } else if !prompt_confirmation(input, output)? {
            log::info!("Deletion declined by user");
            return Ok(DeleteReport {
                declined: true,
                ..DeleteReport::default()
            });
        }

        self.delete(session, duplicates)
    }

    /// Remove every record in `duplicates` without asking.
    ///
    /// # Errors
    ///
    /// Returns `Pool` if the worker threads cannot be started. Individual
    /// removal failures are reported, not returned.
    pub fn delete(
        &self,
        session: &Arc<ScanSession>,
        duplicates: &[FileRecord],
    ) -> Result<DeleteReport, DeleteError> {
        let job = Arc::new(DeleteJob {
            session: Arc::clone(session),
            progress: self.progress.clone(),
            finished: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
            bytes_freed: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
        });

        if let Some(ref progress) = self.progress {
            progress.on_phase_start(PHASE_DELETE, duplicates.len());
        }

        let pool = WorkerPool::new("delete", self.workers)?;
        for record in duplicates {
            let record = record.clone();
            let job = Arc::clone(&job);
            pool.submit(move |_| delete_one(record, &job));
        }
        let pool_stats = pool.join_all();

        if let Some(ref progress) = self.progress {
            progress.on_phase_end(PHASE_DELETE);
        }

        let failures = std::mem::take(&mut *job.failures.lock());
        let report = DeleteReport {
            attempted: duplicates.len(),
            deleted: job.deleted.load(Ordering::SeqCst),
            failures,
            bytes_freed: job.bytes_freed.load(Ordering::SeqCst),
            declined: false,
            pool: pool_stats,
        };

        log::info!("{}", report.summary());
        Ok(report)
    }
}

fn delete_one(record: FileRecord, job: &DeleteJob) {
    let display_path = record.path.to_string_lossy().into_owned();

    match remove_duplicate(&record) {
        Ok(()) => {
            job.bytes_freed.fetch_add(record.size, Ordering::SeqCst);
            job.deleted.fetch_add(1, Ordering::SeqCst);
            job.session.push_deleted(record);
        }
        Err(e) => {
            log::error!("Failed to delete {}: {}", display_path, e);
            job.failures.lock().push(DeleteFailure {
                path: record.path,
                error: e.to_string(),
            });
        }
    }

    let done = job.finished.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(ref progress) = job.progress {
        progress.on_progress(done, &display_path);
    }
}
