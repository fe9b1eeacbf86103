//! # figcheck-io
//!
//! Artifact I/O for figure regression testing.
//!
//! - [`png`] - PNG decode/encode and text-chunk rewriting
//! - [`detect`] - Format sniffing from magic bytes
//! - [`normalize`] - Deterministic rendering with pinned metadata
//! - [`write_atomic`] - Temp-file-then-rename persistence
//!
//! The renderer itself is external and reached through the [`Figure`] trait.
//!
//! # Example
//!
//! ```rust
//! use figcheck_io::{RasterImage, png, detect};
//! use figcheck_core::ArtifactFormat;
//!
//! let bytes = png::encode(&RasterImage::filled_rgb(2, 2, [1, 2, 3])).unwrap();
//! assert_eq!(detect::from_bytes(&bytes), Some(ArtifactFormat::Png));
//! ```

#![warn(missing_docs)]

mod atomic;
pub mod detect;
mod error;
mod figure;
mod image;
pub mod normalize;
pub mod png;

pub use atomic::{copy_atomic, write_atomic};
pub use detect::PNG_SIGNATURE;
pub use error::{IoError, IoResult};
pub use figure::{Figure, SaveOptions};
pub use image::RasterImage;
pub use normalize::{Determinism, DeterministicPolicy, EnvGuard, render_normalized};
