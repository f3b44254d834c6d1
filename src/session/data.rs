//! Data structures for scanned files.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Stable identifier of a [`FileRecord`] within one session.
///
/// Ids are handed out by [`ScanSession::next_record_id`](super::ScanSession::next_record_id)
/// and never change, so they stay valid when the owning list is sorted or grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata and content hash of one regular file.
///
/// `original` is a lookup-only back-reference: it names the record this one
/// duplicates (or was copied from) by id and owns nothing. A record is a
/// duplicate exactly when `original` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Stable id assigned at discovery
    pub id: RecordId,
    /// File name without its directory
    pub name: String,
    /// Absolute path to the file
    pub path: PathBuf,
    /// Lowercase hex digest; empty when hashing failed or has not run
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Record this one is a duplicate or copy of
    pub original: Option<RecordId>,
}

impl FileRecord {
    /// Create a record with no hash and no back-reference.
    ///
    /// The name is taken from the last path component.
    #[must_use]
    pub fn new(id: RecordId, path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id,
            name,
            path,
            hash: String::new(),
            size,
            modified,
            original: None,
        }
    }

    /// Set the content hash, builder style.
    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Whether a content hash was computed for this file.
    #[must_use]
    pub fn has_hash(&self) -> bool {
        !self.hash.is_empty()
    }

    /// Whether this record has been classified as a duplicate (or copy).
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.original.is_some()
    }

    /// Path as a `&Path`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
