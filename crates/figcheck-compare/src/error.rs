//! Error types for the comparison crate.
//!
//! Most failures during a comparison do not surface as errors at all: a
//! missing baseline is a result, and anything unexpected is folded into a
//! failed [`ComparisonResult`](figcheck_core::ComparisonResult) by the engine.
//! These variants cover setup and the internals that feed that fold.

use figcheck_core::CoreError;
use figcheck_hash::HashError;
use figcheck_io::IoError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Comparison error.
#[derive(Debug, Error)]
pub enum CompareError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact decode, encode or persist error.
    #[error(transparent)]
    Artifact(#[from] IoError),

    /// Kernel error.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// One mirror or file URL could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that failed.
        url: String,
        /// Transport error text.
        reason: String,
    },

    /// The configured hash library file does not exist.
    #[error("Hash library not found: {}", path.display())]
    HashLibraryNotFound {
        /// Configured path.
        path: PathBuf,
    },

    /// The hash library exists but is not a flat JSON object of strings.
    #[error("invalid hash library {}: {reason}", path.display())]
    InvalidHashLibrary {
        /// Library path.
        path: PathBuf,
        /// Parse error text.
        reason: String,
    },

    /// Image comparison requested for a format that has no pixels.
    #[error("image comparison is not supported for {0} artifacts; use a hash library")]
    NotRaster(String),
}
