//! Error types for the report crate.

use figcheck_core::CoreError;
use figcheck_io::IoError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Report error.
#[derive(Debug, Error)]
pub enum ReportError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Atomic write failure.
    #[error(transparent)]
    Write(#[from] IoError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fragment file could not be parsed.
    #[error("invalid fragment {}: {reason}", path.display())]
    InvalidFragment {
        /// Fragment path.
        path: PathBuf,
        /// Parse error text.
        reason: String,
    },

    /// Bad glob pattern built from the results directory.
    #[error("invalid fragment pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Two workers reported different results for the same test.
    #[error("conflicting results for {key} from workers {first} and {second}")]
    ConflictingResult {
        /// Test identity.
        key: String,
        /// Worker that reported first.
        first: String,
        /// Worker that reported the differing result.
        second: String,
    },

    /// Two workers generated different fingerprints for the same test.
    #[error("conflicting hashes for {key} from workers {first} and {second}")]
    ConflictingHash {
        /// Test identity.
        key: String,
        /// Worker that reported first.
        first: String,
        /// Worker that reported the differing hash.
        second: String,
    },
}
