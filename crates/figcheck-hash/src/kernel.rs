//! The kernel abstraction.
//!
//! A kernel turns artifact bytes into a hex fingerprint and decides whether
//! two fingerprints are equivalent. Exact kernels compare strings; similarity
//! kernels measure a distance and compare it to a tolerance. The outcome of
//! [`Kernel::equivalent`] is a value, so one kernel instance can be shared by
//! every comparison of a run.

use crate::HashResult;
use figcheck_core::{KernelSummary, RunConfig};

/// Construction parameters shared by all kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelParams {
    /// Perceptual hash size N (the hash has N² bits).
    pub hash_size: u32,
    /// Perceptual hash high-frequency factor.
    pub high_freq_factor: u32,
    /// Default Hamming tolerance in bits.
    pub hamming_tolerance: u32,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            hash_size: 16,
            high_freq_factor: 4,
            hamming_tolerance: 2,
        }
    }
}

impl KernelParams {
    /// Kernel parameters of a run.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            hash_size: config.hash_size,
            high_freq_factor: config.high_freq_factor,
            hamming_tolerance: config.hamming_tolerance,
        }
    }
}

/// Per-test parameter overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelOverrides {
    /// Hamming tolerance in bits.
    pub hamming_tolerance: Option<u32>,
}

/// Outcome of an equivalence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equivalence {
    /// Whether the fingerprints are considered the same.
    pub equivalent: bool,
    /// Measured distance, for similarity kernels with comparable inputs.
    pub distance: Option<u32>,
    /// Tolerance applied, for similarity kernels.
    pub tolerance: Option<u32>,
}

impl Equivalence {
    /// Result of an exact comparison.
    pub fn exact(equivalent: bool) -> Self {
        Self {
            equivalent,
            distance: None,
            tolerance: None,
        }
    }
}

/// A fingerprint algorithm.
pub trait Kernel: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Fingerprint of encoded artifact bytes as lowercase hex.
    fn fingerprint(&self, bytes: &[u8]) -> HashResult<String>;

    /// Whether `actual` is equivalent to the baseline `expected`.
    fn equivalent(&self, actual: &str, expected: &str, overrides: &KernelOverrides) -> Equivalence;

    /// Adds kernel detail to a failure message.
    fn enrich_message(&self, message: &str, _outcome: &Equivalence) -> String {
        message.to_string()
    }

    /// Adds kernel detail to a result summary.
    fn enrich_summary(&self, _outcome: &Equivalence, summary: &mut KernelSummary) {
        summary.kernel = self.name().to_string();
    }

    /// A fresh summary carrying this kernel's detail.
    fn summary(&self, outcome: &Equivalence) -> KernelSummary {
        let mut summary = KernelSummary::named(self.name());
        self.enrich_summary(outcome, &mut summary);
        summary
    }
}
