//! Error types for figcheck-core operations.
//!
//! The [`CoreError`] enum covers failures while loading or validating the
//! run configuration and while parsing test identities. Configuration errors
//! are meant to surface before any test runs.
//!
//! # Usage
//!
//! ```rust
//! use figcheck_core::{CoreError, CoreResult};
//!
//! fn check_size(hash_size: u32) -> CoreResult<()> {
//!     if hash_size == 0 {
//!         return Err(CoreError::config("hash_size must be positive"));
//!     }
//!     Ok(())
//! }
//! assert!(check_size(0).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised by configuration loading and data model validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file not found.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// Invalid or conflicting configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unsupported summary format requested.
    #[error("unsupported summary format '{name}' (supported: json, html, basic-html)")]
    UnsupportedSummary {
        /// Requested format name.
        name: String,
    },

    /// Unknown artifact format or extension.
    #[error("unsupported artifact format: {0}")]
    UnsupportedFormat(String),

    /// Test identity failed validation.
    #[error("invalid test identity: {0}")]
    InvalidIdentity(String),
}

impl CoreError {
    /// Creates a [`CoreError::Config`] error.
    #[inline]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}
