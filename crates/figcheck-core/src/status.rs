//! Comparison statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall outcome of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Artifact matched its baseline.
    Passed,
    /// Artifact differed, had no baseline, or the comparison errored.
    Failed,
    /// Nothing was compared (baseline generation).
    Skipped,
}

impl Status {
    /// Lowercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one comparison method (image or hash).
///
/// A method that did not run is represented as `None` in
/// [`ComparisonResult`](crate::ComparisonResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubStatus {
    /// Baseline present and equivalent.
    Match,
    /// Baseline present but different.
    Diff,
    /// No baseline recorded.
    Missing,
    /// Baseline was written instead of compared.
    Generated,
}

impl SubStatus {
    /// Lowercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Diff => "diff",
            Self::Missing => "missing",
            Self::Generated => "generated",
        }
    }

    /// Severity rank: missing > diff > match > generated.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Missing => 3,
            Self::Diff => 2,
            Self::Match => 1,
            Self::Generated => 0,
        }
    }

    /// Overall status implied by this sub-status alone.
    pub fn implied_status(&self) -> Status {
        match self {
            Self::Match => Status::Passed,
            Self::Diff | Self::Missing => Status::Failed,
            Self::Generated => Status::Skipped,
        }
    }
}

impl fmt::Display for SubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(SubStatus::Missing.severity() > SubStatus::Diff.severity());
        assert!(SubStatus::Diff.severity() > SubStatus::Match.severity());
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&Status::Failed).unwrap(), "\"failed\"");
        assert_eq!(serde_json::to_string(&SubStatus::Missing).unwrap(), "\"missing\"");
        let s: SubStatus = serde_json::from_str("\"generated\"").unwrap();
        assert_eq!(s, SubStatus::Generated);
    }
}
