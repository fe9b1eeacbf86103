//! The renderer seam.
//!
//! figcheck never draws anything itself. A [`Figure`] is whatever can turn
//! itself into encoded artifact bytes given [`SaveOptions`]. Closures of the
//! right shape are figures too.
//!
//! # Example
//!
//! ```rust
//! use figcheck_io::{Figure, IoResult, RasterImage, SaveOptions, png};
//!
//! let figure = |_: &SaveOptions| -> IoResult<Vec<u8>> {
//!     png::encode(&RasterImage::filled_rgb(8, 8, [255, 255, 255]))
//! };
//! let bytes = figure.render(&SaveOptions::default()).unwrap();
//! assert!(bytes.starts_with(&figcheck_io::PNG_SIGNATURE));
//! ```

use crate::IoResult;
use figcheck_core::{ArtifactFormat, ResolvedOptions};
use std::collections::BTreeMap;

/// Options handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOptions {
    /// Output format.
    pub format: ArtifactFormat,
    /// Metadata entries; `None` asks the renderer to omit the key.
    pub metadata: BTreeMap<String, Option<String>>,
    /// Style name.
    pub style: Option<String>,
    /// Drop tick labels and titles before rendering.
    pub remove_text: bool,
    /// Salt for generated identifiers in vector output.
    pub hashsalt: Option<String>,
}

impl SaveOptions {
    /// Save options for a resolved comparison.
    pub fn from_resolved(options: &ResolvedOptions) -> Self {
        Self {
            format: options.format,
            metadata: options.save_metadata.clone(),
            style: options.style.clone(),
            remove_text: options.remove_text,
            hashsalt: None,
        }
    }

    /// Same options in another format.
    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = format;
        self
    }

    /// Metadata value for `key`: outer `None` if unset, inner `None` if omitted.
    pub fn metadata_value(&self, key: &str) -> Option<Option<&str>> {
        self.metadata.get(key).map(|v| v.as_deref())
    }
}

/// Something that renders to encoded artifact bytes.
pub trait Figure {
    /// Renders in `options.format`.
    fn render(&self, options: &SaveOptions) -> IoResult<Vec<u8>>;
}

impl<F> Figure for F
where
    F: Fn(&SaveOptions) -> IoResult<Vec<u8>>,
{
    fn render(&self, options: &SaveOptions) -> IoResult<Vec<u8>> {
        self(options)
    }
}
