//! The two top-level operations: a duplicate run and a random-copy run.
//!
//! Each operation builds a fresh [`ScanSession`], scans the configured root
//! and drives one actuator. Progress lines go to the writer the caller
//! passes in; the returned run value carries the reports and the session
//! for rendering.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{CopyReport, DeleteReport, DuplicateDeleter, RandomCopier};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::output::text;
use crate::progress::ProgressCallback;
use crate::scanner::{Hasher, ScanReport, TreeScanner};
use crate::session::{FileRecord, ScanSession};

/// Outcome of [`run_duplicate_scan`].
#[derive(Debug)]
pub struct DuplicateRun {
    /// Session holding every record of this run
    pub session: Arc<ScanSession>,
    pub scan: ScanReport,
    /// Duplicates in path order
    pub duplicates: Vec<FileRecord>,
    /// Present when deletion was requested and there was something to delete
    pub deletion: Option<DeleteReport>,
}

impl DuplicateRun {
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.session.root().to_path_buf()
    }

    /// Whether any scan or delete operation was skipped or failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.scan.has_failures()
            || self
                .deletion
                .as_ref()
                .is_some_and(|d| !d.all_succeeded())
    }
}

/// Outcome of [`run_random_copy`].
#[derive(Debug)]
pub struct CopyRun {
    pub session: Arc<ScanSession>,
    pub scan: ScanReport,
    pub copy: CopyReport,
}

impl CopyRun {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.scan.has_failures() || !self.copy.all_succeeded()
    }
}

fn scan_root(
    settings: &Settings,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<(Arc<ScanSession>, ScanReport)> {
    let root = settings
        .resolve_source_path()
        .context("Failed to resolve source path")?;
    let session = Arc::new(ScanSession::new(&root));

    let mut scanner = TreeScanner::new(Hasher::new(settings.hash_algorithm), settings.workers);
    if let Some(progress) = progress {
        scanner = scanner.with_progress(Arc::clone(progress));
    }

    let report = scanner
        .scan(&session)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    Ok((session, report))
}

/// Scan, classify, report duplicates and optionally delete them.
///
/// `input` answers the confirmation prompt; `output` receives the duplicate
/// lines, the totals and the prompt.
///
/// # Errors
///
/// Fails if the root cannot be scanned, the prompt cannot be answered, or a
/// worker pool cannot start. Individual file failures are only reported.
pub fn run_duplicate_scan<R: BufRead, W: Write>(
    settings: &Settings,
    progress: Option<Arc<dyn ProgressCallback>>,
    input: R,
    output: &mut W,
) -> Result<DuplicateRun> {
    let (session, scan) = scan_root(settings, progress.as_ref())?;
    let duplicates = session.classify();

    text::write_duplicates(output, &session, &duplicates)?;
    text::write_scan_totals(output, session.file_count(), duplicates.len())?;

    let mut deletion = None;
    if settings.delete_duplicates {
        if duplicates.is_empty() {
            text::write_nothing_to_delete(output)?;
        } else {
            let mut deleter = DuplicateDeleter::new(settings.workers);
            if let Some(ref progress) = progress {
                deleter = deleter.with_progress(Arc::clone(progress));
            }

            let report = deleter
                .delete_confirmed(
                    &session,
                    &duplicates,
                    settings.unattended,
                    input,
                    &mut *output,
                )
                .context("Failed to delete duplicates")?;
            text::write_deletion(output, &report)?;
            deletion = Some(report);
        }
    }

    Ok(DuplicateRun {
        session,
        scan,
        duplicates,
        deletion,
    })
}

/// Scan the root again and scatter random copies of its files.
///
/// # Errors
///
/// Fails if the root cannot be scanned or a worker pool cannot start.
pub fn run_random_copy<W: Write>(
    settings: &Settings,
    progress: Option<Arc<dyn ProgressCallback>>,
    output: &mut W,
) -> Result<CopyRun> {
    let (session, scan) = scan_root(settings, progress.as_ref())?;
    session.sort_files();
    session.sort_directories();

    let files = session.files();
    let directories = session.directories();

    let mut copier = RandomCopier::new(
        settings.workers,
        settings.copy_buffer_size,
        settings.random_copy_iterations,
    );
    if let Some(ref progress) = progress {
        copier = copier.with_progress(Arc::clone(progress));
    }

    let copy = copier
        .random_copy(&session, &files, &directories)
        .context("Failed to create random copies")?;
    text::write_copy_totals(output, &copy, files.len())?;

    Ok(CopyRun {
        session,
        scan,
        copy,
    })
}

/// Exit code for a finished run.
///
/// Partial failures take precedence over the duplicate count.
#[must_use]
pub fn exit_code_for(run: &DuplicateRun, copy: Option<&CopyRun>) -> ExitCode {
    if run.has_failures() || copy.is_some_and(CopyRun::has_failures) {
        ExitCode::PartialSuccess
    } else if run.duplicates.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
