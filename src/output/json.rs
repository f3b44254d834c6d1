//! JSON output formatter for run summaries.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/srv/data",
//!   "total_files": 3,
//!   "duplicate_groups": 1,
//!   "reclaimable_bytes": 1,
//!   "duplicates": [
//!     { "path": "/srv/data/sub/b.txt", "original": "/srv/data/a.txt", "size": 1 }
//!   ],
//!   "scan": { "hash_failures": 0, "listing_failures": 0, "pool": { ... } },
//!   "deletion": { "attempted": 1, "deleted": 1, "bytes_freed": 1, ... },
//!   "random_copy": null,
//!   "exit_code": 0,
//!   "exit_code_name": "FW000"
//! }
//! ```

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::actions::{CopyFailure, DeleteFailure};
use crate::app::{CopyRun, DuplicateRun};
use crate::duplicates::{group_duplicates, DuplicateGroup};
use crate::error::ExitCode;
use crate::pool::PoolStats;

/// One duplicate and the original it matches.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicate {
    pub path: PathBuf,
    /// `None` only if the original record could not be resolved
    pub original: Option<PathBuf>,
    pub size: u64,
    pub hash: String,
}

/// Scan counters.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScan {
    pub directories: usize,
    pub hash_failures: usize,
    pub listing_failures: usize,
    pub pool: PoolStats,
}

/// Deletion outcome.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletion {
    pub attempted: usize,
    pub deleted: usize,
    pub declined: bool,
    pub bytes_freed: u64,
    /// `bytes_freed` in IEC units, e.g. "1.5 KiB"
    pub bytes_freed_human: String,
    pub failures: Vec<DeleteFailure>,
    pub pool: PoolStats,
}

/// Random copy outcome.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRandomCopy {
    pub planned: usize,
    pub copied: usize,
    pub skipped_existing: usize,
    pub total_files_after: usize,
    pub bytes_copied: u64,
    pub failures: Vec<CopyFailure>,
    pub pool: PoolStats,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub total_files: usize,
    /// Hash groups with at least one duplicate
    pub duplicate_groups: usize,
    /// Bytes held by duplicates, originals excluded
    pub reclaimable_bytes: u64,
    pub duplicates: Vec<JsonDuplicate>,
    pub scan: JsonScan,
    pub deletion: Option<JsonDeletion>,
    pub random_copy: Option<JsonRandomCopy>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "FW000")
    pub exit_code_name: String,
}

impl RunSummary {
    /// Collect the summary of a duplicate run and an optional copy run.
    #[must_use]
    pub fn new(run: &DuplicateRun, copy: Option<&CopyRun>, exit_code: ExitCode) -> Self {
        let originals = run.session.resolve_originals(&run.duplicates);
        let duplicates = run
            .duplicates
            .iter()
            .zip(originals)
            .map(|(d, original)| JsonDuplicate {
                path: d.path.clone(),
                original: original.map(|o| o.path),
                size: d.size,
                hash: d.hash.clone(),
            })
            .collect();

        let groups = group_duplicates(&run.session.files());

        let deletion = run.deletion.as_ref().map(|d| JsonDeletion {
            attempted: d.attempted,
            deleted: d.deleted,
            declined: d.declined,
            bytes_freed: d.bytes_freed,
            bytes_freed_human: bytesize::ByteSize::b(d.bytes_freed).to_string(),
            failures: d.failures.clone(),
            pool: d.pool,
        });

        let random_copy = copy.map(|c| JsonRandomCopy {
            planned: c.copy.planned,
            copied: c.copy.copied,
            skipped_existing: c.copy.skipped_existing,
            total_files_after: c.scan.files + c.copy.copied,
            bytes_copied: c.copy.bytes_copied,
            failures: c.copy.failures.clone(),
            pool: c.copy.pool,
        });

        Self {
            root: run.root(),
            total_files: run.scan.files,
            duplicate_groups: groups.len(),
            reclaimable_bytes: groups.iter().map(DuplicateGroup::wasted_bytes).sum(),
            duplicates,
            scan: JsonScan {
                directories: run.scan.directories,
                hash_failures: run.scan.hash_failures,
                listing_failures: run.scan.listing_failures,
                pool: run.scan.pool,
            },
            deletion,
            random_copy,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
