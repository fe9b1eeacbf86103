//! Pixel comparison.
//!
//! Images are compared as 8-bit RGB (alpha dropped, gray expanded). Shapes
//! are checked before any pixel math so a size change is reported as such
//! instead of as a meaningless score.

use crate::CompareResult;
use figcheck_io::{RasterImage, png};
use std::fmt;
use std::path::Path;

/// Amplification applied to differences in the diff image.
const DIFF_GAIN: f64 = 10.0;

/// Image shape as `(height, width, channels)` after RGB conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape(pub u32, pub u32, pub u8);

impl Shape {
    /// RGB shape of an image.
    pub fn of(image: &RasterImage) -> Self {
        Self(image.height, image.width, 3)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Result of comparing two images.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelOutcome {
    /// Shapes differ; no score was computed.
    ShapeMismatch {
        /// Baseline shape.
        expected: Shape,
        /// Result shape.
        actual: Shape,
    },
    /// RMS within tolerance.
    Within {
        /// Measured RMS.
        rms: f64,
    },
    /// RMS above tolerance; a diff image was written.
    Exceeds {
        /// Measured RMS.
        rms: f64,
    },
}

/// Root-mean-square difference over all RGB samples.
///
/// Both images must have the same width and height.
pub fn rms(expected: &RasterImage, actual: &RasterImage) -> f64 {
    let a = expected.to_rgb8();
    let b = actual.to_rgb8();
    if a.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = a
        .iter()
        .zip(&b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    (sum_sq / a.len() as f64).sqrt()
}

/// Absolute RGB difference amplified for visibility.
pub fn diff_image(expected: &RasterImage, actual: &RasterImage) -> RasterImage {
    let a = expected.to_rgb8();
    let b = actual.to_rgb8();
    let data = a
        .iter()
        .zip(&b)
        .map(|(&x, &y)| ((x as f64 - y as f64).abs() * DIFF_GAIN).min(255.0) as u8)
        .collect();
    RasterImage {
        width: expected.width,
        height: expected.height,
        channels: 3,
        data,
    }
}

/// Compares two PNG files, writing `diff_path` when the RMS exceeds `tolerance`.
pub fn compare_files(
    expected_path: &Path,
    actual_path: &Path,
    tolerance: f64,
    diff_path: &Path,
) -> CompareResult<PixelOutcome> {
    let expected = png::read(expected_path)?;
    let actual = png::read(actual_path)?;

    let (es, ac) = (Shape::of(&expected), Shape::of(&actual));
    if es != ac {
        return Ok(PixelOutcome::ShapeMismatch {
            expected: es,
            actual: ac,
        });
    }

    let score = rms(&expected, &actual);
    if score <= tolerance {
        return Ok(PixelOutcome::Within { rms: score });
    }
    png::write(diff_path, &diff_image(&expected, &actual))?;
    Ok(PixelOutcome::Exceeds { rms: score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rms_of_uniform_offset() {
        let a = RasterImage::filled_rgb(4, 4, [100, 100, 100]);
        let b = RasterImage::filled_rgb(4, 4, [103, 96, 100]);
        // sqrt((9 + 16 + 0) / 3)
        assert_abs_diff_eq!(rms(&a, &b), (25.0f64 / 3.0).sqrt(), epsilon = 1e-4);
        assert_abs_diff_eq!(rms(&a, &a), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let rgb = RasterImage::filled_rgb(2, 2, [10, 20, 30]);
        let rgba = RasterImage::new(2, 2, 4, [10, 20, 30, 0].repeat(4)).unwrap();
        assert_eq!(Shape::of(&rgb), Shape::of(&rgba));
        assert_abs_diff_eq!(rms(&rgb, &rgba), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_diff_image_amplifies() {
        let a = RasterImage::filled_rgb(1, 1, [0, 0, 0]);
        let b = RasterImage::filled_rgb(1, 1, [5, 30, 0]);
        assert_eq!(diff_image(&a, &b).data, vec![50, 255, 0]);
    }

    #[test]
    fn test_compare_files_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("baseline.png");
        let same = dir.path().join("same.png");
        let off = dir.path().join("off.png");
        let wide = dir.path().join("wide.png");
        let diff = dir.path().join("result-failed-diff.png");
        png::write(&base, &RasterImage::filled_rgb(8, 6, [50, 50, 50])).unwrap();
        png::write(&same, &RasterImage::filled_rgb(8, 6, [51, 50, 50])).unwrap();
        png::write(&off, &RasterImage::filled_rgb(8, 6, [90, 50, 50])).unwrap();
        png::write(&wide, &RasterImage::filled_rgb(9, 6, [50, 50, 50])).unwrap();

        assert!(matches!(
            compare_files(&base, &same, 2.0, &diff).unwrap(),
            PixelOutcome::Within { .. }
        ));
        assert!(!diff.exists());

        match compare_files(&base, &off, 2.0, &diff).unwrap() {
            PixelOutcome::Exceeds { rms } => {
                assert_abs_diff_eq!(rms, 40.0 / 3f64.sqrt(), epsilon = 1e-4)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(diff.exists());

        match compare_files(&base, &wide, 2.0, &diff).unwrap() {
            PixelOutcome::ShapeMismatch { expected, actual } => {
                assert_eq!(expected.to_string(), "(6, 8, 3)");
                assert_eq!(actual.to_string(), "(6, 9, 3)");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
