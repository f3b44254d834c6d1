//! Layered run configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file (`--config`, else `./fileworker.toml`, else the platform
//!    config directory's `config.toml`)
//! 3. `FILEWORKER_*` environment variables, e.g. `FILEWORKER_WORKERS=4`
//! 4. Command-line flags ([`CliOverrides`])
//!
//! # Example
//!
//! ```no_run
//! use fileworker::config::{CliOverrides, Settings};
//!
//! let overrides = CliOverrides {
//!     workers: Some(4),
//!     ..CliOverrides::default()
//! };
//! let settings = Settings::load(None, &overrides).unwrap();
//! assert_eq!(settings.workers, 4);
//! ```

use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::copy::MAX_BUFFER_SIZE;
use crate::scanner::HashAlgorithm;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "FILEWORKER_";

/// Config file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "fileworker.toml";

/// Errors that can occur while building the settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or did not match the settings schema.
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// The source path could not be made absolute.
    #[error("cannot resolve path {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The effective settings could not be rendered as TOML.
    #[error("cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the tree to scan
    pub source_path: PathBuf,
    /// Concurrency limit of every pool
    pub workers: usize,
    /// Exclusive upper bound of the random copy count
    pub random_copy_iterations: usize,
    /// Transfer buffer size for random copies, in bytes
    pub copy_buffer_size: usize,
    /// Remove duplicates after the scan
    pub delete_duplicates: bool,
    /// Run the random copy operation after the duplicate run
    pub random_copy: bool,
    /// Answer "yes" to the deletion prompt without asking
    pub unattended: bool,
    /// Content hash used to compare files
    pub hash_algorithm: HashAlgorithm,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("."),
            workers: 10,
            random_copy_iterations: 10,
            copy_buffer_size: 512,
            delete_duplicates: false,
            random_copy: false,
            unattended: false,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_copy_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_buffer_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_duplicates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_copy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unattended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
}

impl Settings {
    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(config_file: Option<&Path>, overrides: &CliOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = locate_config_file(config_file) {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
    }

    /// Load and validate the effective settings.
    ///
    /// # Errors
    ///
    /// - `Figment` if a layer is malformed
    /// - `InvalidValue` if validation fails
    pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(config_file, overrides)
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no run can work with.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a zero worker count, or a copy buffer that is empty
    /// or larger than [`MAX_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                message: "must be at least 1".to_string(),
            });
        }
        if self.copy_buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "copy_buffer_size",
                message: "must be at least 1 byte".to_string(),
            });
        }
        if self.copy_buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "copy_buffer_size",
                message: format!(
                    "must be at most {} ({} bytes)",
                    bytesize::ByteSize::b(MAX_BUFFER_SIZE as u64),
                    MAX_BUFFER_SIZE
                ),
            });
        }
        Ok(())
    }

    /// Source path made absolute against the current directory.
    ///
    /// # Errors
    ///
    /// `Path` if the path is empty or the current directory is unavailable.
    pub fn resolve_source_path(&self) -> Result<PathBuf, ConfigError> {
        std::path::absolute(&self.source_path).map_err(|source| ConfigError::Path {
            path: self.source_path.clone(),
            source,
        })
    }

    /// The settings as a TOML document.
    ///
    /// # Errors
    ///
    /// `Render` if serialisation fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Pick the config file to read, if any.
///
/// An explicit path is always used (a missing file then contributes
/// nothing). Otherwise `./fileworker.toml`, then the platform config file.
#[must_use]
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            log::warn!("Config file {} does not exist, ignoring", path.display());
        }
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|p| p.is_file())
}

/// Platform-specific config file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fileworker").map(|dirs| dirs.config_dir().join("config.toml"))
}
