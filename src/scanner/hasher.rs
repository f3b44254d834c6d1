//! Streaming content hasher.
//!
//! # Overview
//! [`Hasher`] opens a file, streams its bytes through the configured
//! algorithm and returns the digest as lowercase hex. SHA-256 is the default;
//! BLAKE3 is available as a faster 256-bit alternative. The file handle is
//! scoped to the call and closed on every exit path.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// Size of the read buffer used while streaming file content.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Content hash algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (default)
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Running digest state for one stream.
enum DigestState {
    Sha256(Sha256),
    Blake3(blake3::Hasher),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(blake3::Hasher::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// File content hasher.
///
/// Stateless apart from the algorithm choice, so one instance can be shared
/// by every worker (each call builds its own digest state).
///
/// # Example
///
/// ```no_run
/// use fileworker::scanner::{HashAlgorithm, Hasher};
/// use std::path::Path;
///
/// let hasher = Hasher::new(HashAlgorithm::Sha256);
/// let hex = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
/// assert_eq!(hex.len(), 64);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file does not exist
    /// - `PermissionDenied` if it cannot be opened for reading
    /// - `Io` for any other open or mid-stream read failure
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Opened for hashing: {}", path.display());

        let digest = self
            .hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))?;

        log::trace!("Hashed {}: {}", path.display(), digest);
        Ok(digest)
    }

    /// Hash everything `reader` yields until end of input.
    ///
    /// # Errors
    ///
    /// Returns the first read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<String> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(state.finalize_hex())
    }
}
