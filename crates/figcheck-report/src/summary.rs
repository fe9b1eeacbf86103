//! Run summaries.
//!
//! A [`RunSummary`] is the merged, key-ordered collection of every test's
//! [`ComparisonResult`]. Its JSON form is a flat object keyed by test
//! identity; serialization goes through a `BTreeMap`, so writing the same
//! summary twice produces the same bytes.

use crate::{ReportError, ReportResult};
use figcheck_core::{ComparisonResult, Status, SubStatus};
use figcheck_io::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};
use std::path::Path;

/// Run-level counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Number of results.
    pub total: usize,
    /// Overall passed.
    pub passed: usize,
    /// Overall failed.
    pub failed: usize,
    /// Overall skipped.
    pub skipped: usize,
    /// Hash sub-status diff or missing.
    pub hash_failed: usize,
    /// Image sub-status diff or missing.
    pub image_failed: usize,
    /// Hash sub-status contradicts the overall status.
    pub hash_disagreements: usize,
    /// Image sub-status contradicts the overall status.
    pub image_disagreements: usize,
}

impl Statistics {
    /// Counts one result.
    pub fn record(&mut self, result: &ComparisonResult) {
        self.total += 1;
        match result.status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Skipped => self.skipped += 1,
        }
        if is_failure(result.hash_status) {
            self.hash_failed += 1;
        }
        if is_failure(result.image_status) {
            self.image_failed += 1;
        }
        if result.hash_disagrees() {
            self.hash_disagreements += 1;
        }
        if result.image_disagrees() {
            self.image_disagreements += 1;
        }
    }
}

fn is_failure(sub: Option<SubStatus>) -> bool {
    matches!(sub, Some(SubStatus::Diff | SubStatus::Missing))
}

impl AddAssign for Statistics {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.passed += rhs.passed;
        self.failed += rhs.failed;
        self.skipped += rhs.skipped;
        self.hash_failed += rhs.hash_failed;
        self.image_failed += rhs.image_failed;
        self.hash_disagreements += rhs.hash_disagreements;
        self.image_disagreements += rhs.image_disagreements;
    }
}

impl Add for Statistics {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

/// All results of a run, ordered by test identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSummary {
    results: BTreeMap<String, ComparisonResult>,
}

impl RunSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing result map.
    pub fn from_results(results: BTreeMap<String, ComparisonResult>) -> Self {
        Self { results }
    }

    /// Adds a result. Re-adding an identical result is a no-op.
    pub fn insert(&mut self, key: impl Into<String>, result: ComparisonResult) -> ReportResult<()> {
        let key = key.into();
        match self.results.get(&key) {
            Some(existing) if *existing != result => Err(ReportError::ConflictingResult {
                key,
                first: "summary".into(),
                second: "summary".into(),
            }),
            Some(_) => Ok(()),
            None => {
                self.results.insert(key, result);
                Ok(())
            }
        }
    }

    /// Result for a test identity.
    pub fn get(&self, key: &str) -> Option<&ComparisonResult> {
        self.results.get(key)
    }

    /// All results in key order.
    pub fn results(&self) -> &BTreeMap<String, ComparisonResult> {
        &self.results
    }

    /// Iterates over `(identity, result)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComparisonResult)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the summary has no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Run-level counts over the final collection.
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::default();
        for result in self.results.values() {
            stats.record(result);
        }
        stats
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> ReportResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parses a summary written by [`RunSummary::to_json`].
    pub fn from_json(json: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a summary file.
    pub fn read(path: impl AsRef<Path>) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Writes the summary atomically.
    pub fn write(&self, path: impl AsRef<Path>) -> ReportResult<()> {
        write_atomic(path.as_ref(), self.to_json()?.as_bytes())?;
        Ok(())
    }
}
