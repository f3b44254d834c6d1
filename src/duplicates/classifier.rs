//! Hash-based duplicate classification.
//!
//! # Overview
//!
//! [`classify`] orders the scanned records and decides, for each one, whether
//! another record with the same content hash takes precedence over it.
//!
//! ## Original selection
//!
//! Records are sorted by the byte-wise comparison of their full path string
//! (`OsStr` ordering, not per-component path ordering). Within a group of
//! records sharing a hash, the record with the smallest path is the original
//! and every other member is a duplicate pointing at it. This is a purely
//! lexicographic rule on full paths: `/a.txt` precedes `/sub/b.txt`, which
//! tends to favour shallower files, but `/a/deep/x` still precedes `/b`.
//!
//! ## Complexity
//!
//! Each record is compared against the records sorted before it until the
//! first hash match, so the worst case is O(n²) comparisons. Hashing the
//! content dominates for realistic file counts.
//!
//! ## Failed hashes
//!
//! Records with an empty hash never match anything: they are never
//! duplicates and never anyone's original.

use std::cmp::Ordering;

use crate::session::FileRecord;

/// Order two records by their full path string.
#[must_use]
pub fn path_order(a: &FileRecord, b: &FileRecord) -> Ordering {
    a.path.as_os_str().cmp(b.path.as_os_str())
}

/// Sort `files` by path and mark duplicates in place.
///
/// Every record's back-reference is recomputed, so calling this again on the
/// same records (in any order) yields the same pairing. Returns the
/// duplicates in path order.
///
/// # Example
///
/// ```
/// use fileworker::duplicates::classify;
/// use fileworker::session::{FileRecord, RecordId};
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let rec = |id, path: &str, hash: &str| {
///     FileRecord::new(RecordId::new(id), PathBuf::from(path), 1, SystemTime::UNIX_EPOCH)
///         .with_hash(hash)
/// };
/// let mut files = vec![rec(0, "/sub/b.txt", "x"), rec(1, "/a.txt", "x"), rec(2, "/sub/c.txt", "y")];
///
/// let duplicates = classify(&mut files);
/// assert_eq!(duplicates.len(), 1);
/// assert_eq!(duplicates[0].path, PathBuf::from("/sub/b.txt"));
/// assert_eq!(duplicates[0].original, Some(RecordId::new(1)));
/// ```
pub fn classify(files: &mut [FileRecord]) -> Vec<FileRecord> {
    files.sort_by(path_order);

    for file in files.iter_mut() {
        file.original = None;
    }

    let mut duplicates = Vec::new();

    for i in 0..files.len() {
        if !files[i].has_hash() {
            log::trace!("No hash, never a duplicate: {}", files[i].path.display());
            continue;
        }

        let original = files[..i]
            .iter()
            .find(|earlier| earlier.hash == files[i].hash)
            .map(|earlier| earlier.id);

        if let Some(id) = original {
            files[i].original = Some(id);
            log::debug!(
                "Duplicate {} (original {})",
                files[i].path.display(),
                id
            );
            duplicates.push(files[i].clone());
        }
    }

    log::debug!(
        "Classified {} files: {} duplicates",
        files.len(),
        duplicates.len()
    );

    duplicates
}
