//! Plain text report lines.
//!
//! These are the lines a run prints while it progresses: one line per
//! duplicate, the scan totals, the deletion outcome and the copy totals.

use std::io::{self, Write};

use crate::actions::{CopyReport, DeleteReport};
use crate::session::{FileRecord, ScanSession};

/// Write `Duplicate file: <dup>\tOriginal file: <orig>` for each duplicate.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_duplicates<W: Write>(
    out: &mut W,
    session: &ScanSession,
    duplicates: &[FileRecord],
) -> io::Result<()> {
    let originals = session.resolve_originals(duplicates);
    for (duplicate, original) in duplicates.iter().zip(originals) {
        let original = original
            .map(|o| o.path.display().to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "Duplicate file: {}\tOriginal file: {}",
            duplicate.path.display(),
            original
        )?;
    }
    Ok(())
}

/// Write the scanned and duplicate counts.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_scan_totals<W: Write>(out: &mut W, files: usize, duplicates: usize) -> io::Result<()> {
    writeln!(out, "Total files: {files}")?;
    writeln!(out, "Duplicate files (without original file): {duplicates}")
}

/// Write the line shown when deletion was requested with nothing to delete.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_nothing_to_delete<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "No files for delete!")
}

/// Write the deletion outcome.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_deletion<W: Write>(out: &mut W, report: &DeleteReport) -> io::Result<()> {
    if report.declined {
        return writeln!(out, "Deletion cancelled");
    }

    writeln!(out, "Files deleted: {} of {}", report.deleted, report.attempted)?;
    if report.deleted > 0 {
        writeln!(out, "Space freed: {}", bytesize::ByteSize::b(report.bytes_freed))?;
    }
    for failure in &report.failures {
        writeln!(out, "Not deleted: {} ({})", failure.path.display(), failure.error)?;
    }
    Ok(())
}

/// Write the random copy totals.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_copy_totals<W: Write>(
    out: &mut W,
    report: &CopyReport,
    files_before: usize,
) -> io::Result<()> {
    writeln!(out, "Count created random copy files: {}", report.copied)?;
    writeln!(
        out,
        "Total files after random copy: {}",
        files_before + report.copied
    )
}
