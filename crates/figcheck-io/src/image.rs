//! Decoded raster images.

use crate::{IoError, IoResult};

/// An 8-bit interleaved raster image.
///
/// Channels are gray (1), gray+alpha (2), RGB (3) or RGBA (4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub channels: u8,
    /// Row-major interleaved samples.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Creates an image, checking the buffer length.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> IoResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(IoError::UnsupportedBitDepth(format!("{channels} channels")));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(IoError::InvalidFile(format!(
                "buffer holds {} bytes, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Creates a solid-color RGB image.
    pub fn filled_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    /// Shape as `(height, width, channels)`.
    pub fn shape(&self) -> (u32, u32, u8) {
        (self.height, self.width, self.channels)
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGB samples, dropping alpha and expanding gray.
    pub fn to_rgb8(&self) -> Vec<u8> {
        match self.channels {
            3 => self.data.clone(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
            1 => self.data.iter().flat_map(|&g| [g, g, g]).collect(),
            _ => self
                .data
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0]])
                .collect(),
        }
    }

    /// ITU-R 601-2 luma, one float per pixel in `0.0..=255.0`.
    pub fn to_luma(&self) -> Vec<f32> {
        let c = self.channels as usize;
        self.data
            .chunks_exact(c)
            .map(|p| match c {
                1 | 2 => p[0] as f32,
                _ => (p[0] as f32 * 299.0 + p[1] as f32 * 587.0 + p[2] as f32 * 114.0) / 1000.0,
            })
            .collect()
    }
}
