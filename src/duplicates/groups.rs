//! Duplicate groups rebuilt from classified records.
//!
//! # Overview
//!
//! After [`classify`](super::classify) each duplicate carries a back-reference
//! to its original. [`group_duplicates`] folds those references into one
//! [`DuplicateGroup`] per original, which is the shape reports want.
//!
//! # Example
//!
//! ```
//! use fileworker::duplicates::{classify, group_duplicates};
//! use fileworker::session::{FileRecord, RecordId};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let rec = |id, path: &str, hash: &str| {
//!     FileRecord::new(RecordId::new(id), PathBuf::from(path), 4, SystemTime::UNIX_EPOCH)
//!         .with_hash(hash)
//! };
//! let mut files = vec![rec(0, "/a", "x"), rec(1, "/b", "x"), rec(2, "/c", "x")];
//! classify(&mut files);
//!
//! let groups = group_duplicates(&files);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].duplicates.len(), 2);
//! assert_eq!(groups[0].wasted_bytes(), 8);
//! ```

use std::collections::HashMap;

use crate::session::{FileRecord, RecordId};

/// An original and every record pointing at it.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Shared content hash
    pub hash: String,
    /// The record kept as canonical
    pub original: FileRecord,
    /// Records referencing `original`, in path order
    pub duplicates: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Number of files in the group, original included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.duplicates.len() + 1
    }

    /// A group always holds its original.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bytes taken by the duplicates alone.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.duplicates.iter().map(|d| d.size).sum()
    }
}

/// Build groups from classified records.
///
/// Records are expected in path order (as left by `classify`); groups come
/// out ordered by their original's position. Duplicates whose original is
/// not among `files` are skipped with a warning.
#[must_use]
pub fn group_duplicates(files: &[FileRecord]) -> Vec<DuplicateGroup> {
    let by_id: HashMap<RecordId, &FileRecord> = files.iter().map(|f| (f.id, f)).collect();
    let mut index: HashMap<RecordId, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for file in files {
        let Some(original_id) = file.original else {
            continue;
        };
        let Some(original) = by_id.get(&original_id) else {
            log::warn!(
                "Original {} of {} is not in the record set",
                original_id,
                file.path.display()
            );
            continue;
        };

        let slot = *index.entry(original_id).or_insert_with(|| {
            groups.push(DuplicateGroup {
                hash: original.hash.clone(),
                original: (*original).clone(),
                duplicates: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].duplicates.push(file.clone());
    }

    groups
}
