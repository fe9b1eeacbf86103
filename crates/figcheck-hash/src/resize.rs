//! Lanczos-3 resampling of single-channel planes.
//!
//! Two separable passes (horizontal then vertical). When downscaling, the
//! filter support is widened by the scale factor so every source pixel
//! contributes, which is what makes the perceptual hash robust to aliasing.

use crate::{HashError, HashResult};

const LANCZOS_SUPPORT: f64 = 3.0;

/// Lanczos weight function.
#[inline]
fn lanczos_weight(x: f64, a: f64) -> f64 {
    let ax = x.abs();
    if ax < 1e-12 {
        1.0
    } else if ax < a {
        let pi_x = std::f64::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Resizes a `src_w` x `src_h` plane to `dst_w` x `dst_h`.
pub fn resize_plane(
    src: &[f64],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> HashResult<Vec<f64>> {
    if src.len() != src_w * src_h {
        return Err(HashError::InvalidParameter(format!(
            "expected {} samples, got {}",
            src_w * src_h,
            src.len()
        )));
    }
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Err(HashError::InvalidParameter("image size must be > 0".into()));
    }

    let temp = resample_rows(src, src_w, src_h, dst_w);
    let transposed = transpose(&temp, dst_w, src_h);
    let cols = resample_rows(&transposed, src_h, dst_w, dst_h);
    Ok(transpose(&cols, dst_h, dst_w))
}

/// Resamples every row of a `w` x `h` plane to `dst_w` samples.
fn resample_rows(src: &[f64], w: usize, h: usize, dst_w: usize) -> Vec<f64> {
    let scale = w as f64 / dst_w as f64;
    let stretch = scale.max(1.0);
    let support = LANCZOS_SUPPORT * stretch;

    // Weights depend only on the column, so compute them once.
    let taps: Vec<(usize, Vec<f64>)> = (0..dst_w)
        .map(|x| {
            let center = (x as f64 + 0.5) * scale - 0.5;
            let left = ((center - support).floor().max(0.0)) as usize;
            let right = ((center + support).ceil().max(0.0) as usize).min(w - 1);
            let mut weights: Vec<f64> = (left..=right)
                .map(|sx| lanczos_weight((sx as f64 - center) / stretch, LANCZOS_SUPPORT))
                .collect();
            let sum: f64 = weights.iter().sum();
            if sum.abs() > 1e-12 {
                weights.iter_mut().for_each(|w| *w /= sum);
            }
            (left, weights)
        })
        .collect();

    let mut dst = vec![0.0; dst_w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for (x, (left, weights)) in taps.iter().enumerate() {
            dst[y * dst_w + x] = weights
                .iter()
                .enumerate()
                .map(|(i, w)| row[left + i] * w)
                .sum();
        }
    }
    dst
}

fn transpose(src: &[f64], w: usize, h: usize) -> Vec<f64> {
    let mut dst = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            dst[x * h + y] = src[y * w + x];
        }
    }
    dst
}
