//! Command-line interface definitions for fileworker.
//!
//! This module defines all CLI arguments using the clap derive API. Flags map
//! onto [`CliOverrides`], the top layer of the settings figment, so anything
//! left unset falls through to the config file, the environment and the
//! defaults.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under ~/Downloads
//! fileworker ~/Downloads
//!
//! # Delete them without a prompt, 4 workers at a time
//! fileworker --path ~/Downloads --rm --yes --go 4
//!
//! # Stress the scanner with random copies, JSON summary
//! fileworker /tmp/playground --cp --iterations 50 --output json
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::actions::copy::MAX_BUFFER_SIZE;
use crate::config::CliOverrides;
use crate::scanner::HashAlgorithm;

/// Concurrent duplicate file finder and scanner stress tool.
///
/// fileworker hashes every regular file under a directory, reports files
/// whose content duplicates another one, and can delete the duplicates or
/// scatter random copies of existing files through the tree.
#[derive(Debug, Parser)]
#[command(name = "fileworker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory to scan (default: current directory)
    #[arg(value_name = "PATH", conflicts_with = "path_flag")]
    pub path: Option<PathBuf>,

    /// Directory to scan, as a flag
    #[arg(long = "path", id = "path_flag", value_name = "PATH")]
    pub path_flag: Option<PathBuf>,

    /// Delete duplicate files after confirmation
    #[arg(short = 'r', long = "rm", visible_alias = "delete")]
    pub delete: bool,

    /// Create random copies of scanned files after the duplicate run
    #[arg(short = 'c', long = "cp", visible_alias = "random-copy")]
    pub random_copy: bool,

    /// Maximum number of concurrent workers
    #[arg(short = 'g', long = "go", visible_alias = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Exclusive upper bound of the random copy count
    #[arg(long, value_name = "N")]
    pub iterations: Option<usize>,

    /// Copy buffer size, at most 64 MiB (e.g., 512, 4KiB, 1MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Content hash algorithm
    #[arg(long = "hash", value_enum, value_name = "ALGORITHM")]
    pub hash: Option<HashAlgorithm>,

    /// Delete without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Read settings from this TOML file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Output format for the run summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Flags that override lower settings layers.
    ///
    /// Boolean switches only override when given, so a config file can turn
    /// them on too.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            source_path: self.path.clone().or_else(|| self.path_flag.clone()),
            workers: self.workers,
            random_copy_iterations: self.iterations,
            copy_buffer_size: self.buffer_size,
            delete_duplicates: self.delete.then_some(true),
            random_copy: self.random_copy.then_some(true),
            unattended: self.yes.then_some(true),
            hash_algorithm: self.hash,
        }
    }
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text lines
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a copy buffer size such as `512`, `64K` or `4KiB`.
///
/// Whole numbers only, with an optional case-insensitive `B`, `K`/`KB`,
/// `KiB`, `M`/`MB` or `MiB` suffix. The result must lie in
/// `1..=MAX_BUFFER_SIZE`.
///
/// ```
/// use fileworker::cli::parse_buffer_size;
///
/// assert_eq!(parse_buffer_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_buffer_size("1mb").unwrap(), 1_000_000);
/// assert!(parse_buffer_size("1GB").is_err());
/// ```
///
/// # Errors
///
/// Returns a message for clap when the number or suffix is not understood,
/// or the size is zero or above the ceiling.
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("'{s}' does not start with a whole number of bytes"));
    }

    let unit_bytes: usize = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MIB" => 1 << 20,
        other => return Err(format!("unsupported buffer unit '{other}'")),
    };

    let bytes = digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(unit_bytes))
        .filter(|&b| b <= MAX_BUFFER_SIZE)
        .ok_or_else(|| format!("buffer size '{s}' exceeds {MAX_BUFFER_SIZE} bytes"))?;

    if bytes == 0 {
        return Err("buffer size must be at least one byte".to_string());
    }
    Ok(bytes)
}
