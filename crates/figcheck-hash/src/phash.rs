//! Similarity kernel: DCT perceptual hash.
//!
//! The artifact is decoded, reduced to luma, resampled to a square of side
//! `hash_size * high_freq_factor` and transformed with a 2-D DCT-II. The
//! `hash_size` x `hash_size` low-frequency block is thresholded against its
//! median and the bits are packed row-major, most significant bit first.
//! Similar images produce fingerprints a small Hamming distance apart.
//!
//! # Example
//!
//! ```rust
//! use figcheck_hash::{Kernel, KernelOverrides, PHashKernel};
//!
//! let kernel = PHashKernel::new(16, 4, 2).unwrap();
//! let zeros = "0".repeat(64);
//! let three_bits = format!("7{}", "0".repeat(63));
//! let outcome = kernel.equivalent(&three_bits, &zeros, &KernelOverrides::default());
//! assert_eq!(outcome.distance, Some(3));
//! assert!(!outcome.equivalent);
//! ```

use crate::dct::dct2_2d;
use crate::kernel::{Equivalence, Kernel, KernelOverrides};
use crate::resize::resize_plane;
use crate::{HashError, HashResult};
use figcheck_core::{KernelSummary, MAX_HASH_SIZE, MAX_PHASH_SIDE};
use figcheck_io::png;
use tracing::trace;

/// Registry name.
pub const PHASH: &str = "phash";

/// Perceptual hash kernel.
#[derive(Debug, Clone, Copy)]
pub struct PHashKernel {
    hash_size: usize,
    high_freq_factor: usize,
    hamming_tolerance: u32,
}

impl PHashKernel {
    /// Creates a kernel producing `hash_size²`-bit fingerprints.
    pub fn new(hash_size: u32, high_freq_factor: u32, hamming_tolerance: u32) -> HashResult<Self> {
        if hash_size < 2 {
            return Err(HashError::InvalidParameter(format!(
                "hash_size must be at least 2, got {hash_size}"
            )));
        }
        if high_freq_factor == 0 {
            return Err(HashError::InvalidParameter(
                "high_freq_factor must be positive".into(),
            ));
        }
        let side = u64::from(hash_size) * u64::from(high_freq_factor);
        if hash_size > MAX_HASH_SIZE || side > u64::from(MAX_PHASH_SIDE) {
            return Err(HashError::InvalidParameter(format!(
                "hash_size {hash_size} with high_freq_factor {high_freq_factor} exceeds \
                 {MAX_HASH_SIZE} bits per side or a {MAX_PHASH_SIDE}px resize"
            )));
        }
        Ok(Self {
            hash_size: hash_size as usize,
            high_freq_factor: high_freq_factor as usize,
            hamming_tolerance,
        })
    }

    /// Bits per fingerprint.
    pub fn bits(&self) -> usize {
        self.hash_size * self.hash_size
    }

    /// Perceptual hash bits of a luma plane.
    fn hash_plane(&self, luma: &[f64], width: usize, height: usize) -> HashResult<Vec<bool>> {
        let side = self.hash_size * self.high_freq_factor;
        let mut small = resize_plane(luma, width, height, side, side)?;
        // Quantize like an 8-bit grayscale image would be.
        small
            .iter_mut()
            .for_each(|v| *v = v.round().clamp(0.0, 255.0));

        let dct = dct2_2d(&small, side);
        let n = self.hash_size;
        let low: Vec<f64> = (0..n)
            .flat_map(|r| dct[r * side..r * side + n].iter().copied())
            .collect();
        let med = median(&low);
        Ok(low.iter().map(|&v| v > med).collect())
    }
}

impl Kernel for PHashKernel {
    fn name(&self) -> &'static str {
        PHASH
    }

    fn fingerprint(&self, bytes: &[u8]) -> HashResult<String> {
        let image = png::decode(bytes)?;
        let luma: Vec<f64> = image.to_luma().into_iter().map(f64::from).collect();
        let bits = self.hash_plane(&luma, image.width as usize, image.height as usize)?;
        let hex = bits_to_hex(&bits);
        trace!(hash = %hex, width = image.width, height = image.height, "perceptual hash");
        Ok(hex)
    }

    fn equivalent(&self, actual: &str, expected: &str, overrides: &KernelOverrides) -> Equivalence {
        let tolerance = overrides.hamming_tolerance.unwrap_or(self.hamming_tolerance);
        let distance = hamming_distance(actual, expected);
        Equivalence {
            equivalent: distance.is_some_and(|d| d <= tolerance),
            distance,
            tolerance: Some(tolerance),
        }
    }

    fn enrich_message(&self, message: &str, outcome: &Equivalence) -> String {
        if outcome.equivalent {
            return message.to_string();
        }
        let tolerance = outcome.tolerance.unwrap_or(self.hamming_tolerance);
        let detail = match outcome.distance {
            Some(d) => {
                format!("Hash hamming distance of {d} bits > hamming tolerance of {tolerance} bits.")
            }
            None => "Hash lengths differ, so no hamming distance could be computed.".to_string(),
        };
        if message.is_empty() {
            detail
        } else {
            format!("{message} {detail}")
        }
    }

    fn enrich_summary(&self, outcome: &Equivalence, summary: &mut KernelSummary) {
        summary.kernel = PHASH.to_string();
        summary.hamming_distance = outcome.distance;
        summary.hamming_tolerance = outcome.tolerance;
    }
}

/// Hamming distance of two hex fingerprints.
///
/// `None` when the lengths differ or either string is not hex.
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    if a.len() != b.len() {
        return None;
    }
    a.chars().zip(b.chars()).try_fold(0u32, |acc, (x, y)| {
        let x = x.to_digit(16)?;
        let y = y.to_digit(16)?;
        Some(acc + (x ^ y).count_ones())
    })
}

/// Packs bits MSB-first into hex, left-padded to `ceil(bits / 4)` digits.
pub fn bits_to_hex(bits: &[bool]) -> String {
    let pad = (4 - bits.len() % 4) % 4;
    let padded: Vec<bool> = std::iter::repeat_n(false, pad).chain(bits.iter().copied()).collect();
    padded
        .chunks(4)
        .map(|nibble| {
            let v = nibble.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
            char::from_digit(v, 16).unwrap_or('0')
        })
        .collect()
}

/// Unpacks a hex fingerprint into bits.
pub fn hex_to_bits(hex: &str) -> HashResult<Vec<bool>> {
    let mut bits = Vec::with_capacity(hex.len() * 4);
    for c in hex.chars() {
        let v = c
            .to_digit(16)
            .ok_or_else(|| HashError::MalformedHash(format!("'{c}' in {hex}")))?;
        bits.extend((0..4).rev().map(|i| (v >> i) & 1 == 1));
    }
    Ok(bits)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figcheck_io::RasterImage;

    fn kernel() -> PHashKernel {
        PHashKernel::new(16, 4, 2).unwrap()
    }

    fn diagonal(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = if x > y { 230 } else { 25 };
                data.extend([v, v, v]);
            }
        }
        png::encode(&RasterImage::new(width, height, 3, data).unwrap()).unwrap()
    }

    #[test]
    fn test_fingerprint_shape() {
        let hash = kernel().fingerprint(&diagonal(100, 80)).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        let small = PHashKernel::new(8, 4, 2).unwrap();
        assert_eq!(small.fingerprint(&diagonal(100, 80)).unwrap().len(), 16);
    }

    #[test]
    fn test_oversized_parameters_rejected() {
        assert!(PHashKernel::new(MAX_HASH_SIZE, 1, 0).is_ok());
        assert!(PHashKernel::new(MAX_HASH_SIZE + 1, 1, 0).is_err());
        assert!(PHashKernel::new(64, 32, 0).is_err());
        assert!(PHashKernel::new(u32::MAX, u32::MAX, 0).is_err());
    }

    #[test]
    fn test_reflexive() {
        let bytes = diagonal(64, 64);
        let a = kernel().fingerprint(&bytes).unwrap();
        let b = kernel().fingerprint(&bytes).unwrap();
        let outcome = kernel().equivalent(&a, &b, &KernelOverrides::default());
        assert!(outcome.equivalent);
        assert_eq!(outcome.distance, Some(0));
    }

    #[test]
    fn test_different_images_are_far_apart() {
        let a = kernel().fingerprint(&diagonal(64, 64)).unwrap();
        let flipped = {
            let mut data = Vec::new();
            for _ in 0..64 {
                for x in 0..64 {
                    let v = if x < 32 { 230 } else { 25 };
                    data.extend([v, v, v]);
                }
            }
            png::encode(&RasterImage::new(64, 64, 3, data).unwrap()).unwrap()
        };
        let b = kernel().fingerprint(&flipped).unwrap();
        let distance = hamming_distance(&a, &b).unwrap();
        assert!(distance > 2, "distance {distance}");
    }

    #[test]
    fn test_symmetric_distance() {
        let a = "f0f0";
        let b = "0ff1";
        assert_eq!(hamming_distance(a, b), hamming_distance(b, a));
        assert_eq!(hamming_distance(a, b), Some(9));
    }

    #[test]
    fn test_length_mismatch_has_no_distance() {
        let outcome = kernel().equivalent("abcd", "abc", &KernelOverrides::default());
        assert!(!outcome.equivalent);
        assert_eq!(outcome.distance, None);
        assert_eq!(hamming_distance("zz", "00"), None);
    }

    #[test]
    fn test_override_tolerance() {
        let zeros = "0".repeat(64);
        let three = format!("7{}", "0".repeat(63));
        let loose = KernelOverrides {
            hamming_tolerance: Some(3),
        };
        assert!(kernel().equivalent(&three, &zeros, &loose).equivalent);
        assert!(!kernel().equivalent(&three, &zeros, &KernelOverrides::default()).equivalent);
    }

    #[test]
    fn test_message_and_summary() {
        let k = kernel();
        let outcome = Equivalence {
            equivalent: false,
            distance: Some(7),
            tolerance: Some(2),
        };
        assert_eq!(
            k.enrich_message("", &outcome),
            "Hash hamming distance of 7 bits > hamming tolerance of 2 bits."
        );
        assert_eq!(
            k.enrich_message("Hash differs.", &outcome),
            "Hash differs. Hash hamming distance of 7 bits > hamming tolerance of 2 bits."
        );
        let summary = k.summary(&outcome);
        assert_eq!(summary.kernel, "phash");
        assert_eq!(summary.hamming_distance, Some(7));
        assert_eq!(summary.hamming_tolerance, Some(2));
    }

    #[test]
    fn test_hex_bits_roundtrip_and_padding() {
        let bits = hex_to_bits("a5").unwrap();
        assert_eq!(bits, vec![true, false, true, false, false, true, false, true]);
        assert_eq!(bits_to_hex(&bits), "a5");
        // 9 bits pad to three digits
        assert_eq!(bits_to_hex(&[true; 9]), "1ff");
        assert!(hex_to_bits("xy").is_err());
    }

    #[test]
    fn test_rejects_vector_input() {
        assert!(matches!(
            kernel().fingerprint(b"%PDF-1.4"),
            Err(HashError::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_params() {
        assert!(PHashKernel::new(1, 4, 2).is_err());
        assert!(PHashKernel::new(16, 0, 2).is_err());
    }
}
