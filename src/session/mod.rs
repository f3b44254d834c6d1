//! Working state of a single scan run.
//!
//! A [`ScanSession`] is created fresh for each top-level operation (a
//! duplicate run or a random-copy run) and dropped when that operation ends.
//! Nothing in it is persisted.
//!
//! # Architecture
//!
//! * [`data`]: [`FileRecord`] and its stable [`RecordId`].
//! * [`state`]: [`ScanSession`], the lock-protected owner of every record
//!   list produced while pool workers run.

pub mod data;
pub mod state;

pub use data::{FileRecord, RecordId};
pub use state::ScanSession;
