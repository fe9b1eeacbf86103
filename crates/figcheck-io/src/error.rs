//! Error types for artifact I/O.
//!
//! Provides unified error handling for decoding, encoding, rendering and
//! persisting artifacts.

use figcheck_core::ArtifactFormat;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Artifact I/O error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Unsupported bit depth or color layout.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Rendered bytes are not in the requested format.
    #[error("rendered artifact is {found}, expected {declared}")]
    FormatMismatch {
        /// Format the renderer was asked for.
        declared: ArtifactFormat,
        /// What the bytes look like.
        found: String,
    },

    /// The renderer failed to produce an artifact.
    #[error("render failed: {0}")]
    Render(String),

    /// Moving a finished temp file into place failed.
    #[error("failed to persist {path}: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

impl From<png::DecodingError> for IoError {
    fn from(err: png::DecodingError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<png::EncodingError> for IoError {
    fn from(err: png::EncodingError) -> Self {
        Self::EncodeError(err.to_string())
    }
}

/// Result type for artifact I/O operations.
pub type IoResult<T> = Result<T, IoError>;
