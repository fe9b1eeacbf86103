//! Type-II discrete cosine transform through the FFT.
//!
//! Uses the unnormalized convention
//! `y[k] = 2 * sum_n x[n] * cos(pi * k * (2n + 1) / (2N))`.
//! The input is reordered (even samples ascending, odd samples descending)
//! so a single complex FFT of length N yields the transform after a twiddle.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Planned DCT-II of a fixed length.
pub struct Dct2 {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
    twiddles: Vec<Complex<f64>>,
}

impl Dct2 {
    /// Plans a transform of length `len`.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let twiddles = (0..len)
            .map(|k| Complex::from_polar(2.0, -PI * k as f64 / (2.0 * len as f64)))
            .collect();
        Self { len, fft, twiddles }
    }

    /// Transforms `input` into `output`; both must have the planned length.
    pub fn process(&self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), self.len);
        debug_assert_eq!(output.len(), self.len);
        let n = self.len;

        let mut buf = vec![Complex::new(0.0, 0.0); n];
        for i in 0..n.div_ceil(2) {
            buf[i] = Complex::new(input[2 * i], 0.0);
        }
        for i in 0..n / 2 {
            buf[n - 1 - i] = Complex::new(input[2 * i + 1], 0.0);
        }

        self.fft.process(&mut buf);

        for (k, out) in output.iter_mut().enumerate() {
            *out = (buf[k] * self.twiddles[k]).re;
        }
    }
}

/// 2-D DCT-II of a square `n` x `n` plane: rows first, then columns.
pub fn dct2_2d(data: &[f64], n: usize) -> Vec<f64> {
    let dct = Dct2::new(n);
    let mut rows = vec![0.0; n * n];
    for r in 0..n {
        dct.process(&data[r * n..(r + 1) * n], &mut rows[r * n..(r + 1) * n]);
    }

    let mut out = vec![0.0; n * n];
    let mut column = vec![0.0; n];
    let mut transformed = vec![0.0; n];
    for c in 0..n {
        for r in 0..n {
            column[r] = rows[r * n + c];
        }
        dct.process(&column, &mut transformed);
        for r in 0..n {
            out[r * n + c] = transformed[r];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn naive(input: &[f64]) -> Vec<f64> {
        let n = input.len();
        (0..n)
            .map(|k| {
                2.0 * input
                    .iter()
                    .enumerate()
                    .map(|(i, x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    #[test]
    fn test_matches_naive_even_and_odd() {
        for n in [1, 2, 5, 8, 13] {
            let input: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 4.0).collect();
            let mut fast = vec![0.0; n];
            Dct2::new(n).process(&input, &mut fast);
            for (a, b) in fast.iter().zip(naive(&input)) {
                assert_abs_diff_eq!(*a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_constant_plane_has_only_dc() {
        let out = dct2_2d(&vec![1.0; 16], 4);
        assert_abs_diff_eq!(out[0], 4.0 * 4.0 * 4.0, epsilon = 1e-9);
        for v in &out[1..] {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-9);
        }
    }
}
