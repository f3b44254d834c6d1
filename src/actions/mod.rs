//! File actions module.
//!
//! This module provides the two actuators that run after a scan:
//! - Concurrent deletion of classified duplicates, behind a Y/N confirmation
//! - Concurrent random copies of scanned files into scanned directories
//!
//! Both run under their own [`WorkerPool`](crate::pool::WorkerPool) and
//! append their results to the [`ScanSession`](crate::session::ScanSession)
//! they were given.
//!
//! # Deletion
//!
//! ```no_run
//! use fileworker::actions::delete::DuplicateDeleter;
//! use fileworker::session::ScanSession;
//! use std::io;
//! use std::sync::Arc;
//!
//! let session = Arc::new(ScanSession::new("/srv/data"));
//! let duplicates = session.classify();
//! let report = DuplicateDeleter::new(8)
//!     .delete_confirmed(&session, &duplicates, false, io::stdin().lock(), io::stdout())
//!     .unwrap();
//! println!("{}", report.summary());
//! ```
//!
//! # Random copy
//!
//! Each copy lands at `<dir>/copy_<name>` and is skipped if that path is
//! already taken. See [`copy::RandomCopier`].

pub mod confirm;
pub mod copy;
pub mod delete;

// Re-export commonly used types
pub use confirm::{prompt_confirmation, ConfirmError};
pub use copy::{byte_copy, CopyError, CopyFailure, CopyReport, RandomCopier};
pub use delete::{remove_duplicate, DeleteError, DeleteFailure, DeleteReport, DuplicateDeleter};
