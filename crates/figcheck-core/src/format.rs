//! Artifact formats.
//!
//! A rendered figure is serialized in one of a fixed set of formats: one
//! raster format that supports pixel comparison, and a few vector formats
//! that only take part in fingerprint comparison.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// PNG raster image.
    #[default]
    Png,
    /// PDF document.
    Pdf,
    /// Encapsulated PostScript.
    Eps,
    /// SVG drawing.
    Svg,
}

impl ArtifactFormat {
    /// All supported formats.
    pub const ALL: [ArtifactFormat; 4] = [Self::Png, Self::Pdf, Self::Eps, Self::Svg];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Eps => "eps",
            Self::Svg => "svg",
        }
    }

    /// Whether pixel comparison applies to this format.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let lower = s.trim().trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| CoreError::UnsupportedFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("pdf".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Pdf);
        assert_eq!(".EPS".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Eps);
        assert!("tiff".parse::<ArtifactFormat>().is_err());
    }

    #[test]
    fn test_only_png_is_raster() {
        let raster: Vec<_> = ArtifactFormat::ALL.iter().filter(|f| f.is_raster()).collect();
        assert_eq!(raster, vec![&ArtifactFormat::Png]);
    }
}
