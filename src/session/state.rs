//! Lock-protected working state shared by pool workers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::data::{FileRecord, RecordId};
use crate::duplicates;

/// The five sequences a run accumulates.
#[derive(Debug, Default)]
struct SessionLists {
    all_files: Vec<FileRecord>,
    duplicates: Vec<FileRecord>,
    deleted: Vec<FileRecord>,
    random_copies: Vec<FileRecord>,
    directories: Vec<PathBuf>,
}

/// Owner of every record produced during one operation.
///
/// All lists sit behind one coarse lock. Workers only ever append; readers get
/// cloned snapshots, so the raw sequences never leave this type.
///
/// # Example
///
/// ```
/// use fileworker::session::{FileRecord, ScanSession};
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let session = ScanSession::new("/data");
/// let id = session.next_record_id();
/// session.push_file(FileRecord::new(id, PathBuf::from("/data/a.txt"), 1, SystemTime::now()));
///
/// assert_eq!(session.file_count(), 1);
/// assert_eq!(session.directories(), vec![PathBuf::from("/data")]);
/// ```
#[derive(Debug)]
pub struct ScanSession {
    root: PathBuf,
    lists: Mutex<SessionLists>,
    next_id: AtomicU64,
}

impl ScanSession {
    /// Create an empty session for `root`.
    ///
    /// The root itself is the first entry of the directory list.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let lists = SessionLists {
            directories: vec![root.clone()],
            ..SessionLists::default()
        };

        Self {
            root,
            lists: Mutex::new(lists),
            next_id: AtomicU64::new(0),
        }
    }

    /// Root directory this session scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh record id.
    pub fn next_record_id(&self) -> RecordId {
        RecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn push_file(&self, record: FileRecord) {
        self.lists.lock().all_files.push(record);
    }

    pub fn push_directory(&self, path: PathBuf) {
        self.lists.lock().directories.push(path);
    }

    pub fn push_deleted(&self, record: FileRecord) {
        self.lists.lock().deleted.push(record);
    }

    pub fn push_random_copy(&self, record: FileRecord) {
        self.lists.lock().random_copies.push(record);
    }

    /// Sort the scanned files by path and mark duplicates.
    ///
    /// Newly found duplicates are appended to the duplicate list, which is
    /// reset first so a repeated call does not double count. Returns a
    /// snapshot of the duplicates.
    pub fn classify(&self) -> Vec<FileRecord> {
        let mut lists = self.lists.lock();
        let found = duplicates::classify(&mut lists.all_files);
        lists.duplicates = found;
        lists.duplicates.clone()
    }

    /// Sort the file list by path string without classifying.
    pub fn sort_files(&self) {
        self.lists.lock().all_files.sort_by(duplicates::path_order);
    }

    /// Sort the directory list by path string.
    pub fn sort_directories(&self) {
        self.lists
            .lock()
            .directories
            .sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    }

    /// Snapshot of all scanned files, in their current order.
    #[must_use]
    pub fn files(&self) -> Vec<FileRecord> {
        self.lists.lock().all_files.clone()
    }

    #[must_use]
    pub fn duplicates(&self) -> Vec<FileRecord> {
        self.lists.lock().duplicates.clone()
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<FileRecord> {
        self.lists.lock().deleted.clone()
    }

    #[must_use]
    pub fn random_copies(&self) -> Vec<FileRecord> {
        self.lists.lock().random_copies.clone()
    }

    #[must_use]
    pub fn directories(&self) -> Vec<PathBuf> {
        self.lists.lock().directories.clone()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.lists.lock().all_files.len()
    }

    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.lists.lock().duplicates.len()
    }

    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.lists.lock().deleted.len()
    }

    #[must_use]
    pub fn random_copy_count(&self) -> usize {
        self.lists.lock().random_copies.len()
    }

    /// Look up a scanned or copied record by id.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<FileRecord> {
        let lists = self.lists.lock();
        lists
            .all_files
            .iter()
            .chain(lists.random_copies.iter())
            .find(|r| r.id == id)
            .cloned()
    }

    /// Resolve the back-reference of `record`, if any.
    ///
    /// Each call walks the lists; use [`resolve_originals`](Self::resolve_originals)
    /// for more than a handful of records.
    #[must_use]
    pub fn original_of(&self, record: &FileRecord) -> Option<FileRecord> {
        record.original.and_then(|id| self.record(id))
    }

    /// Resolve the back-references of many records in one pass.
    ///
    /// The result is parallel to `records`: `None` where a record has no
    /// original or its original is unknown to this session.
    #[must_use]
    pub fn resolve_originals(&self, records: &[FileRecord]) -> Vec<Option<FileRecord>> {
        let lists = self.lists.lock();
        let by_id: HashMap<RecordId, &FileRecord> = lists
            .all_files
            .iter()
            .chain(lists.random_copies.iter())
            .map(|r| (r.id, r))
            .collect();

        records
            .iter()
            .map(|r| {
                r.original
                    .and_then(|id| by_id.get(&id).map(|&original| original.clone()))
            })
            .collect()
    }
}
