//! Output formatters for run results.
//!
//! - [`text`]: the line-oriented transcript printed while a run progresses
//! - [`json`]: a [`RunSummary`] document for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use fileworker::app::run_duplicate_scan;
//! use fileworker::config::Settings;
//! use fileworker::error::ExitCode;
//! use fileworker::output::RunSummary;
//! use std::io;
//!
//! let run = run_duplicate_scan(&Settings::default(), None, io::stdin().lock(), &mut io::stderr())
//!     .unwrap();
//! let summary = RunSummary::new(&run, None, ExitCode::Success);
//! summary.write_to(&mut io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutputError, RunSummary};
