//! Randomised copies of scanned files, for exercising the scanner.
//!
//! # Overview
//!
//! [`RandomCopier`] draws a task count `R` from `[0, bound)` and submits `R`
//! independent copy units to a worker pool. Each unit picks a random source
//! file and a random destination directory and writes
//! `<dir>/copy_<source name>` through a fixed-size buffer.
//!
//! A destination that already exists is skipped, never overwritten, so a run
//! may create fewer than `R` copies. Every unit owns its random generator.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::pool::{PoolError, PoolStats, WorkerPool};
use crate::progress::{ProgressCallback, PHASE_COPY};
use crate::session::{FileRecord, ScanSession};

/// Prefix added to the source name to build a copy's file name.
pub const COPY_PREFIX: &str = "copy_";

/// Largest transfer buffer a copy unit allocates; larger requests are clamped.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Error type for copy operations.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The source file could not be opened.
    #[error("cannot open source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Something already exists at the destination.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The destination file could not be created.
    #[error("cannot create destination {path}: {source}")]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the source or writing the destination failed mid-stream.
    #[error("copy {from} -> {to} failed: {source}")]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Copy `src` to a new file at `dst` through a buffer of `buffer_size` bytes.
///
/// The buffer is clamped to `1..=MAX_BUFFER_SIZE`.
///
/// The destination is created with `create_new`, so an existing file is never
/// truncated. A partially written destination is removed on failure.
///
/// # Errors
///
/// - `SourceOpen` if `src` cannot be opened
/// - `DestinationExists` if `dst` already exists
/// - `DestinationCreate` if `dst` cannot be created
/// - `Transfer` if reading or writing fails part way
pub fn byte_copy(src: &Path, dst: &Path, buffer_size: usize) -> Result<u64, CopyError> {
    let mut reader = File::open(src).map_err(|source| CopyError::SourceOpen {
        path: src.to_path_buf(),
        source,
    })?;

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                CopyError::DestinationExists(dst.to_path_buf())
            } else {
                CopyError::DestinationCreate {
                    path: dst.to_path_buf(),
                    source,
                }
            }
        })?;

    match stream(&mut reader, &mut writer, buffer_size) {
        Ok(copied) => Ok(copied),
        Err(source) => {
            drop(writer);
            if let Err(e) = fs::remove_file(dst) {
                log::warn!("Failed to remove partial copy {}: {}", dst.display(), e);
            }
            Err(CopyError::Transfer {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                source,
            })
        }
    }
}

fn stream<R: Read, W: Write>(reader: &mut R, writer: &mut W, buffer_size: usize) -> io::Result<u64> {
    let mut buffer = vec![0u8; buffer_size.clamp(1, MAX_BUFFER_SIZE)];
    let mut copied = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..n])?;
        copied += n as u64;
    }

    writer.flush()?;
    Ok(copied)
}

/// Destination path of a copy of `source` placed in `dir`.
///
/// The name keeps the source's raw file name bytes, so names that are not
/// valid UTF-8 survive unchanged.
#[must_use]
pub fn copy_destination(dir: &Path, source: &FileRecord) -> PathBuf {
    let mut name = OsString::from(COPY_PREFIX);
    match source.path.file_name() {
        Some(file_name) => name.push(file_name),
        None => name.push(&source.name),
    }
    dir.join(name)
}

/// One copy that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// Results of a random copy run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyReport {
    /// Copy units drawn (`R`)
    pub planned: usize,
    /// Copies written and recorded
    pub copied: usize,
    /// Units whose destination already existed
    pub skipped_existing: usize,
    /// Units that failed, with their errors
    pub failures: Vec<CopyFailure>,
    /// Bytes written across all copies
    pub bytes_copied: u64,
    /// Statistics of the copy pool
    pub pool: PoolStats,
}

impl CopyReport {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.pool.panicked == 0
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Created {} of {} planned copies ({} skipped, {} failed), wrote {}",
            self.copied,
            self.planned,
            self.skipped_existing,
            self.failures.len(),
            bytesize::ByteSize::b(self.bytes_copied)
        )
    }
}

/// Concurrent random copier.
///
/// # Example
///
/// ```no_run
/// use fileworker::actions::copy::RandomCopier;
/// use fileworker::session::ScanSession;
/// use std::sync::Arc;
///
/// let session = Arc::new(ScanSession::new("/tmp/playground"));
/// // ... scan ...
/// let report = RandomCopier::new(4, 512, 10)
///     .random_copy(&session, &session.files(), &session.directories())
///     .unwrap();
/// println!("{}", report.summary());
/// ```
pub struct RandomCopier {
    workers: usize,
    buffer_size: usize,
    iteration_bound: usize,
    seed: Option<u64>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

struct CopyJob {
    session: Arc<ScanSession>,
    files: Arc<[FileRecord]>,
    directories: Arc<[PathBuf]>,
    buffer_size: usize,
    progress: Option<Arc<dyn ProgressCallback>>,
    finished: AtomicUsize,
    copied: AtomicUsize,
    skipped: AtomicUsize,
    bytes_copied: AtomicU64,
    failures: Mutex<Vec<CopyFailure>>,
}

impl RandomCopier {
    /// Create a copier.
    ///
    /// # Arguments
    ///
    /// * `workers` - Maximum copy units running at once
    /// * `buffer_size` - Transfer buffer size in bytes
    /// * `iteration_bound` - Exclusive upper bound of the drawn unit count
    #[must_use]
    pub fn new(workers: usize, buffer_size: usize, iteration_bound: usize) -> Self {
        Self {
            workers,
            buffer_size,
            iteration_bound,
            seed: None,
            progress: None,
        }
    }

    /// Derive every random draw from `seed` instead of system entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Draw `R` and run `R` copy units over `files` and `directories`.
    ///
    /// With no files or no directories nothing is drawn or submitted and the
    /// report plans zero copies.
    ///
    /// # Errors
    ///
    /// Returns `Pool` if the worker threads cannot be started. Individual
    /// copy failures are reported, not returned.
    pub fn random_copy(
        &self,
        session: &Arc<ScanSession>,
        files: &[FileRecord],
        directories: &[PathBuf],
    ) -> Result<CopyReport, CopyError> {
        if files.is_empty() || directories.is_empty() {
            log::info!(
                "Nothing to copy: {} files, {} directories",
                files.len(),
                directories.len()
            );
            return Ok(CopyReport::default());
        }

        let mut rng = self.rng(0);
        let planned = draw_count(&mut rng, self.iteration_bound);

        log::info!(
            "Creating up to {} random copies ({} files, {} directories)",
            planned,
            files.len(),
            directories.len()
        );

        let job = Arc::new(CopyJob {
            session: Arc::clone(session),
            files: files.into(),
            directories: directories.into(),
            buffer_size: self.buffer_size,
            progress: self.progress.clone(),
            finished: AtomicUsize::new(0),
            copied: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            bytes_copied: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
        });

        if let Some(ref progress) = self.progress {
            progress.on_phase_start(PHASE_COPY, planned);
        }

        let pool = WorkerPool::new("copy", self.workers)?;
        for i in 0..planned {
            let job = Arc::clone(&job);
            let rng = self.rng(i as u64 + 1);
            pool.submit(move |_| copy_one(rng, &job));
        }
        let pool_stats = pool.join_all();

        if let Some(ref progress) = self.progress {
            progress.on_phase_end(PHASE_COPY);
        }

        let report = CopyReport {
            planned,
            copied: job.copied.load(Ordering::SeqCst),
            skipped_existing: job.skipped.load(Ordering::SeqCst),
            failures: std::mem::take(&mut *job.failures.lock()),
            bytes_copied: job.bytes_copied.load(Ordering::SeqCst),
            pool: pool_stats,
        };

        log::info!("{}", report.summary());
        Ok(report)
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Uniform draw from `[0, bound)`; zero when `bound` is zero.
fn draw_count<R: Rng>(rng: &mut R, bound: usize) -> usize {
    if bound == 0 {
        0
    } else {
        rng.gen_range(0..bound)
    }
}

fn copy_one(mut rng: StdRng, job: &CopyJob) {
    let source = &job.files[rng.gen_range(0..job.files.len())];
    let dir = &job.directories[rng.gen_range(0..job.directories.len())];
    let destination = copy_destination(dir, source);

    match byte_copy(&source.path, &destination, job.buffer_size) {
        Ok(bytes) => {
            log::debug!(
                "Copied {} -> {} ({} bytes)",
                source.path.display(),
                destination.display(),
                bytes
            );
            let modified = fs::metadata(&destination)
                .and_then(|m| m.modified())
                .unwrap_or_else(|_| SystemTime::now());

            let mut record =
                FileRecord::new(job.session.next_record_id(), destination.clone(), bytes, modified)
                    .with_hash(source.hash.clone());
            record.original = Some(source.id);

            job.session.push_random_copy(record);
            job.copied.fetch_add(1, Ordering::SeqCst);
            job.bytes_copied.fetch_add(bytes, Ordering::SeqCst);
        }
        Err(CopyError::DestinationExists(path)) => {
            log::debug!("Copy destination exists, skipping: {}", path.display());
            job.skipped.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => {
            log::error!("Failed to copy {}: {}", source.path.display(), e);
            job.failures.lock().push(CopyFailure {
                source: source.path.clone(),
                destination: destination.clone(),
                error: e.to_string(),
            });
        }
    }

    let done = job.finished.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(ref progress) = job.progress {
        progress.on_progress(done, &destination.to_string_lossy());
    }
}
