//! fileworker - Concurrent duplicate file finder
//!
//! Scans a directory tree with a bounded worker pool, hashes every regular
//! file, marks files whose content duplicates another one, and can delete
//! those duplicates or scatter random copies of existing files to stress the
//! scanner.

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod session;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::app::{exit_code_for, run_duplicate_scan, run_random_copy};
use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::output::RunSummary;
use crate::progress::{Progress, ProgressCallback};

/// Run the application for parsed command-line arguments.
///
/// The text transcript goes to stdout; with `--output json` it goes to
/// stderr and stdout carries only the JSON summary.
///
/// # Errors
///
/// Returns an error when the run cannot proceed: bad configuration, an
/// unlistable root, an unanswerable prompt, or a failed write.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(ExitCode::Success);
    }

    log::info!(
        "fileworker starting: root {}, {} workers, log level {}",
        settings.source_path.display(),
        settings.workers,
        log::max_level()
    );

    let progress: Option<Arc<dyn ProgressCallback>> = if cli.quiet || cli.no_progress {
        None
    } else {
        Some(Arc::new(Progress::new(false)))
    };

    let json = cli.output == OutputFormat::Json;
    let mut transcript: Box<dyn Write> = if json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let run = run_duplicate_scan(&settings, progress.clone(), io::stdin().lock(), &mut transcript)?;

    let copy = if settings.random_copy {
        Some(run_random_copy(&settings, progress, &mut transcript)?)
    } else {
        None
    };
    transcript.flush()?;

    let exit_code = exit_code_for(&run, copy.as_ref());

    if json {
        RunSummary::new(&run, copy.as_ref(), exit_code)
            .write_to(&mut io::stdout().lock())
            .context("Failed to write JSON summary")?;
    }

    Ok(exit_code)
}
