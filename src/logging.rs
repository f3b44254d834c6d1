//! Log setup for the `log` facade on top of `env_logger`.
//!
//! `RUST_LOG` wins when it is set. Otherwise `--quiet` keeps errors only and
//! each `-v` raises the level one step above info. Verbose lines also carry
//! a timestamp, the emitting thread and the module, so output from pool
//! units reads `[scan-2] [fileworker::scanner::walker]`.

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Level selected by the command-line flags when `RUST_LOG` is unset.
#[must_use]
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Thread and module columns of a verbose line; empty otherwise.
fn line_context(verbose: u8, thread: Option<&str>, module: Option<&str>) -> String {
    if verbose == 0 {
        return String::new();
    }
    format!(
        "[{}] [{}] ",
        thread.unwrap_or("main"),
        module.unwrap_or("unknown")
    )
}

/// Install the process-wide logger.
///
/// Only the first call installs anything; a second `run_app` in the same
/// process keeps the logger it already has.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(level_for(verbose, quiet));
        }
    }

    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let context = line_context(
            verbose,
            std::thread::current().name(),
            record.module_path(),
        );
        if verbose > 0 {
            write!(buf, "{} ", buf.timestamp_millis())?;
        }
        writeln!(
            buf,
            "{style}{:<5}{style:#} {context}{}",
            record.level(),
            record.args()
        )
    });

    if builder.try_init().is_ok() {
        log::debug!("Logging at level {}", log::max_level());
    }
}
