//! Enrichment error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by history providers and the bibliography loader
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// A subprocess could not be started or read
    #[error("Failed to run {command}: {source}")]
    Spawn {
        /// Program name
        command: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// git exited unsuccessfully
    #[error("git log failed for {path}: {stderr}")]
    GitFailed {
        /// File being looked up
        path: PathBuf,
        /// Trimmed stderr output
        stderr: String,
    },

    /// The file has no commits
    #[error("{0} is not tracked by git")]
    Untracked(PathBuf),

    /// A date in provider output could not be parsed
    #[error("Unparseable date {0:?}")]
    InvalidDate(String),

    /// Filesystem error
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Bibliography file is not a CSL-JSON array
    #[error("Invalid bibliography {path}: {source}")]
    Bibliography {
        /// Bibliography file
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for enrichment operations
pub type EnrichmentResult<T> = Result<T, EnrichmentError>;
