//! Worker fragments and the post-run merge.
//!
//! Workers never share a file. Each one writes `results-<worker>.json` and,
//! when it recorded fingerprints, `hashes-<worker>.json` into the results
//! root. After every worker has finished, a single merge pass reads all
//! fragments and builds the [`RunSummary`] and the merged hash library.
//!
//! The merge is a disjoint union. A key reported by two workers is accepted
//! only when both reports are identical.

use crate::{ReportError, ReportResult, RunSummary};
use figcheck_compare::ComparisonEngine;
use figcheck_core::{ComparisonResult, TestIdentity};
use figcheck_io::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RESULTS_PREFIX: &str = "results-";
const HASHES_PREFIX: &str = "hashes-";

/// On-disk shape of `results-<worker>.json`.
#[derive(Serialize, Deserialize)]
struct ResultsFile {
    worker: String,
    results: BTreeMap<String, ComparisonResult>,
}

/// Everything one worker produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerFragment {
    /// Worker name, unique within the run.
    pub worker: String,
    /// Results keyed by test identity.
    pub results: BTreeMap<String, ComparisonResult>,
    /// Fingerprints recorded by this worker.
    pub generated_hashes: BTreeMap<String, String>,
}

impl WorkerFragment {
    /// Creates an empty fragment.
    pub fn new(worker: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            ..Default::default()
        }
    }

    /// Records a test's result.
    pub fn insert(&mut self, identity: &TestIdentity, result: ComparisonResult) -> ReportResult<()> {
        match self.results.get(identity.as_str()) {
            Some(existing) if *existing != result => Err(ReportError::ConflictingResult {
                key: identity.to_string(),
                first: self.worker.clone(),
                second: self.worker.clone(),
            }),
            _ => {
                self.results.insert(identity.to_string(), result);
                Ok(())
            }
        }
    }

    /// Snapshot of an engine's results and recorded fingerprints, named after
    /// the configured worker (`main` when unset).
    pub fn from_engine(engine: &ComparisonEngine) -> Self {
        Self {
            worker: engine.config().worker_name().to_string(),
            results: engine.results(),
            generated_hashes: engine.recorded_hashes(),
        }
    }

    /// Writes an engine's fragment into its results root.
    pub fn write_engine(engine: &ComparisonEngine) -> ReportResult<Vec<PathBuf>> {
        let fragment = Self::from_engine(engine);
        let root = &engine.config().results_path;
        std::fs::create_dir_all(root)?;
        info!(worker = %fragment.worker, root = %root.display(), "writing worker fragment");
        fragment.write(root)
    }

    /// Replaces the recorded fingerprints.
    pub fn with_hashes(mut self, hashes: BTreeMap<String, String>) -> Self {
        self.generated_hashes = hashes;
        self
    }

    /// Path of a worker's results fragment.
    pub fn results_path(root: &Path, worker: &str) -> PathBuf {
        root.join(format!("{RESULTS_PREFIX}{worker}.json"))
    }

    /// Path of a worker's hash fragment.
    pub fn hashes_path(root: &Path, worker: &str) -> PathBuf {
        root.join(format!("{HASHES_PREFIX}{worker}.json"))
    }

    /// Writes the fragment files into `root`, returning the paths written.
    pub fn write(&self, root: &Path) -> ReportResult<Vec<PathBuf>> {
        let mut written = Vec::new();

        let file = ResultsFile {
            worker: self.worker.clone(),
            results: self.results.clone(),
        };
        let path = Self::results_path(root, &self.worker);
        write_atomic(&path, to_json(&file)?.as_bytes())?;
        written.push(path);

        if !self.generated_hashes.is_empty() {
            let path = Self::hashes_path(root, &self.worker);
            write_atomic(&path, to_json(&self.generated_hashes)?.as_bytes())?;
            written.push(path);
        }
        debug!(worker = %self.worker, results = self.results.len(), "wrote worker fragment");
        Ok(written)
    }

    /// Reads one worker's fragment files from `root`.
    pub fn read(root: &Path, worker: &str) -> ReportResult<Self> {
        let mut fragment = Self::new(worker);

        let path = Self::results_path(root, worker);
        if path.is_file() {
            let file: ResultsFile = read_json(&path)?;
            fragment.worker = file.worker;
            fragment.results = file.results;
        }
        let path = Self::hashes_path(root, worker);
        if path.is_file() {
            fragment.generated_hashes = read_json(&path)?;
        }
        Ok(fragment)
    }
}

/// Reads every worker fragment in `root`, ordered by worker name.
pub fn read_fragments(root: &Path) -> ReportResult<Vec<WorkerFragment>> {
    let mut workers = Vec::new();
    // The root may itself contain glob metacharacters.
    let escaped = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));
    for prefix in [RESULTS_PREFIX, HASHES_PREFIX] {
        let pattern = escaped.join(format!("{prefix}*.json"));
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let path = entry.map_err(|e| ReportError::Io(e.into_error()))?;
            let worker = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(prefix))
                .map(str::to_string);
            if let Some(worker) = worker {
                workers.push(worker);
            }
        }
    }
    workers.sort();
    workers.dedup();

    let fragments = workers
        .iter()
        .map(|w| WorkerFragment::read(root, w))
        .collect::<ReportResult<Vec<_>>>()?;
    info!(count = fragments.len(), root = %root.display(), "read worker fragments");
    Ok(fragments)
}

/// Merges worker results into one summary.
pub fn merge_fragments(fragments: &[WorkerFragment]) -> ReportResult<RunSummary> {
    let mut merged = BTreeMap::new();
    merge_maps(fragments, |f| &f.results, &mut merged, |key, first, second| {
        ReportError::ConflictingResult { key, first, second }
    })?;
    Ok(RunSummary::from_results(merged))
}

/// Merges worker fingerprints into one hash library.
pub fn merge_hashes(fragments: &[WorkerFragment]) -> ReportResult<BTreeMap<String, String>> {
    let mut merged = BTreeMap::new();
    merge_maps(fragments, |f| &f.generated_hashes, &mut merged, |key, first, second| {
        ReportError::ConflictingHash { key, first, second }
    })?;
    Ok(merged)
}

fn merge_maps<V, S, C>(
    fragments: &[WorkerFragment],
    select: S,
    merged: &mut BTreeMap<String, V>,
    conflict: C,
) -> ReportResult<()>
where
    V: Clone + PartialEq,
    S: Fn(&WorkerFragment) -> &BTreeMap<String, V>,
    C: Fn(String, String, String) -> ReportError,
{
    let mut owners: HashMap<String, &str> = HashMap::new();
    for fragment in fragments {
        for (key, value) in select(fragment) {
            match merged.get(key) {
                Some(existing) if existing != value => {
                    let first = owners.get(key).copied().unwrap_or_default().to_string();
                    return Err(conflict(key.clone(), first, fragment.worker.clone()));
                }
                Some(_) => {}
                None => {
                    merged.insert(key.clone(), value.clone());
                    owners.insert(key.clone(), &fragment.worker);
                }
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> ReportResult<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> ReportResult<T> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| ReportError::InvalidFragment {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figcheck_core::SubStatus;

    fn id(key: &str) -> TestIdentity {
        TestIdentity::parse(key).unwrap()
    }

    fn passed() -> ComparisonResult {
        ComparisonResult::from_outcomes(Some(SubStatus::Match), None, "")
    }

    fn failed() -> ComparisonResult {
        ComparisonResult::from_outcomes(Some(SubStatus::Diff), None, "differs")
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut fragment = WorkerFragment::new("gw0");
        fragment.insert(&id("m.test_a"), passed()).unwrap();
        let fragment = fragment.with_hashes(BTreeMap::from([("m.test_a".into(), "ff".into())]));

        let written = fragment.write(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("results-gw0.json").is_file());
        assert!(dir.path().join("hashes-gw0.json").is_file());

        let read = read_fragments(dir.path()).unwrap();
        assert_eq!(read, vec![fragment]);
    }

    #[test]
    fn test_read_from_root_with_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["run[1]", "run*?"] {
            let root = dir.path().join(name);
            std::fs::create_dir_all(&root).unwrap();
            let mut fragment = WorkerFragment::new("gw0");
            fragment.insert(&id("m.test_a"), passed()).unwrap();
            fragment.write(&root).unwrap();

            let read = read_fragments(&root).unwrap();
            assert_eq!(read, vec![fragment], "{name}");
        }
    }

    #[test]
    fn test_disjoint_merge() {
        let mut a = WorkerFragment::new("gw0");
        a.insert(&id("m.test_a"), passed()).unwrap();
        let mut b = WorkerFragment::new("gw1");
        b.insert(&id("m.test_b"), failed()).unwrap();

        let summary = merge_fragments(&[a, b]).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.statistics().passed, 1);
        assert_eq!(summary.statistics().failed, 1);
    }

    #[test]
    fn test_identical_duplicate_is_accepted() {
        let mut a = WorkerFragment::new("gw0");
        a.insert(&id("m.test_a"), passed()).unwrap();
        let mut b = WorkerFragment::new("gw1");
        b.insert(&id("m.test_a"), passed()).unwrap();
        assert_eq!(merge_fragments(&[a, b]).unwrap().len(), 1);
    }

    #[test]
    fn test_conflicting_results() {
        let mut a = WorkerFragment::new("gw0");
        a.insert(&id("m.test_a"), passed()).unwrap();
        let mut b = WorkerFragment::new("gw1");
        b.insert(&id("m.test_a"), failed()).unwrap();

        match merge_fragments(&[a, b]) {
            Err(ReportError::ConflictingResult { key, first, second }) => {
                assert_eq!(key, "m.test_a");
                assert_eq!(first, "gw0");
                assert_eq!(second, "gw1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_conflicting_hashes() {
        let a = WorkerFragment::new("gw0").with_hashes(BTreeMap::from([("k".into(), "00".into())]));
        let b = WorkerFragment::new("gw1").with_hashes(BTreeMap::from([("k".into(), "01".into())]));
        assert!(matches!(
            merge_hashes(&[a, b]),
            Err(ReportError::ConflictingHash { .. })
        ));
    }

    #[test]
    fn test_hash_only_fragment_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hashes-solo.json"), r#"{"m.t": "ab"}"#).unwrap();
        let fragments = read_fragments(dir.path()).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(merge_hashes(&fragments).unwrap().get("m.t").map(String::as_str), Some("ab"));
    }
}
