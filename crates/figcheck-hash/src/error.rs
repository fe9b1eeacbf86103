//! Error types for fingerprint kernels.

use figcheck_io::IoError;
use thiserror::Error;

/// Result type for kernel operations.
pub type HashResult<T> = Result<T, HashError>;

/// Errors from kernel construction and fingerprinting.
#[derive(Debug, Error)]
pub enum HashError {
    /// Kernel name not in the registry.
    #[error("unknown hash kernel '{name}' (available: {available})")]
    UnknownKernel {
        /// Requested name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },

    /// Invalid kernel parameter.
    #[error("invalid kernel parameter: {0}")]
    InvalidParameter(String),

    /// The artifact could not be decoded for a content-aware kernel.
    #[error("cannot decode artifact: {0}")]
    Decode(#[from] IoError),

    /// Fingerprint string is not valid hex.
    #[error("malformed fingerprint: {0}")]
    MalformedHash(String),
}
