//! Per-test comparison outcome records.
//!
//! A [`ComparisonResult`] is produced once per test by the comparison engine
//! and handed by value to the report aggregator, which never mutates it.
//! Artifact paths are stored relative to the run's results directory with
//! forward slashes so a JSON summary stays valid when the directory moves.

use crate::{Status, SubStatus};
use serde::{Deserialize, Serialize};

/// Kernel-specific details attached to a result by the fingerprint kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSummary {
    /// Registry name of the kernel.
    pub kernel: String,
    /// Measured Hamming distance, for similarity kernels.
    pub hamming_distance: Option<u32>,
    /// Hamming tolerance applied, for similarity kernels.
    pub hamming_tolerance: Option<u32>,
}

impl KernelSummary {
    /// Summary carrying only the kernel name.
    pub fn named(kernel: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            hamming_distance: None,
            hamming_tolerance: None,
        }
    }
}

/// Outcome record for a single test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Overall status.
    pub status: Status,
    /// Image comparison outcome, `None` if no image comparison ran.
    pub image_status: Option<SubStatus>,
    /// Hash comparison outcome, `None` if no hash comparison ran.
    pub hash_status: Option<SubStatus>,
    /// Human-readable, possibly multi-line diagnostic.
    pub status_msg: String,
    /// RMS dissimilarity measured by the pixel diff.
    pub rms: Option<f64>,
    /// RMS tolerance applied.
    pub tolerance: Option<f64>,
    /// Generated artifact, relative to the results directory.
    pub result_image: Option<String>,
    /// Copy of the baseline artifact, relative to the results directory.
    pub baseline_image: Option<String>,
    /// Difference image, relative to the results directory.
    pub diff_image: Option<String>,
    /// Fingerprint recorded in the hash library.
    pub baseline_hash: Option<String>,
    /// Fingerprint of the generated artifact.
    pub result_hash: Option<String>,
    /// Kernel details, when a hash comparison ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<KernelSummary>,
}

impl ComparisonResult {
    /// Builds a result whose overall status is derived from the sub-statuses.
    ///
    /// See [`ComparisonResult::overall_status`].
    pub fn from_outcomes(
        image_status: Option<SubStatus>,
        hash_status: Option<SubStatus>,
        status_msg: impl Into<String>,
    ) -> Self {
        Self {
            status: Self::overall_status(image_status, hash_status),
            image_status,
            hash_status,
            status_msg: status_msg.into(),
            rms: None,
            tolerance: None,
            result_image: None,
            baseline_image: None,
            diff_image: None,
            baseline_hash: None,
            result_hash: None,
            kernel: None,
        }
    }

    /// Failed result with no sub-status, for errors outside both comparisons.
    pub fn failure(status_msg: impl Into<String>) -> Self {
        Self::from_outcomes(None, None, status_msg)
    }

    /// Failed result for an unexpected error during comparison.
    pub fn internal_error(detail: impl std::fmt::Display) -> Self {
        Self::failure(format!(
            "An internal error occurred during the figure comparison:\n{detail}"
        ))
    }

    /// Overall status as a function of the active sub-statuses.
    ///
    /// The hash outcome is authoritative whenever a hash comparison ran;
    /// otherwise the image outcome decides. No active sub-status means the
    /// comparison could not be carried out, which is a failure.
    pub fn overall_status(image: Option<SubStatus>, hash: Option<SubStatus>) -> Status {
        match (hash, image) {
            (Some(hash), _) => hash.implied_status(),
            (None, Some(image)) => image.implied_status(),
            (None, None) => Status::Failed,
        }
    }

    /// Sets the RMS score and the tolerance it was measured against.
    pub fn with_rms(mut self, rms: Option<f64>, tolerance: f64) -> Self {
        self.rms = rms;
        self.tolerance = Some(tolerance);
        self
    }

    /// Sets the artifact paths.
    pub fn with_images(
        mut self,
        result: Option<String>,
        baseline: Option<String>,
        diff: Option<String>,
    ) -> Self {
        self.result_image = result;
        self.baseline_image = baseline;
        self.diff_image = diff;
        self
    }

    /// Sets the fingerprints.
    pub fn with_hashes(mut self, baseline: Option<String>, result: Option<String>) -> Self {
        self.baseline_hash = baseline;
        self.result_hash = result;
        self
    }

    /// Attaches kernel details.
    pub fn with_kernel(mut self, kernel: Option<KernelSummary>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Drops every artifact path (after the per-test directory was removed).
    pub fn without_images(mut self) -> Self {
        self.result_image = None;
        self.baseline_image = None;
        self.diff_image = None;
        self
    }

    /// Whether the hash outcome disagrees with the overall status.
    pub fn hash_disagrees(&self) -> bool {
        disagrees(self.status, self.hash_status)
    }

    /// Whether the image outcome disagrees with the overall status.
    pub fn image_disagrees(&self) -> bool {
        disagrees(self.status, self.image_status)
    }
}

fn disagrees(status: Status, sub: Option<SubStatus>) -> bool {
    match (status, sub) {
        (Status::Failed, Some(SubStatus::Match)) => true,
        (Status::Passed, Some(SubStatus::Diff | SubStatus::Missing)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_authoritative() {
        let r = ComparisonResult::from_outcomes(Some(SubStatus::Match), Some(SubStatus::Diff), "");
        assert_eq!(r.status, Status::Failed);
        assert!(r.image_disagrees());
        assert!(!r.hash_disagrees());
    }

    #[test]
    fn test_image_only_status() {
        let r = ComparisonResult::from_outcomes(Some(SubStatus::Missing), None, "");
        assert_eq!(r.status, Status::Failed);
        let r = ComparisonResult::from_outcomes(Some(SubStatus::Match), None, "");
        assert_eq!(r.status, Status::Passed);
    }

    #[test]
    fn test_generated_is_skipped() {
        let r = ComparisonResult::from_outcomes(Some(SubStatus::Generated), None, "");
        assert_eq!(r.status, Status::Skipped);
    }

    #[test]
    fn test_internal_error_fails() {
        let r = ComparisonResult::internal_error("boom");
        assert_eq!(r.status, Status::Failed);
        assert!(r.status_msg.starts_with("An internal error occurred"));
        assert!(r.status_msg.contains("boom"));
    }

    #[test]
    fn test_json_roundtrip() {
        let r = ComparisonResult::from_outcomes(Some(SubStatus::Diff), None, "line one\nline two")
            .with_rms(Some(12.3456789), 2.0)
            .with_images(Some("a/result.png".into()), Some("a/baseline.png".into()), None);
        let json = serde_json::to_string(&r).unwrap();
        let back: ComparisonResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        approx::assert_abs_diff_eq!(back.rms.unwrap(), 12.3456789, epsilon = 1e-4);
    }
}
