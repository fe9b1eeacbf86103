//! End-to-end comparison runs, one per evaluation path.

use crate::fixtures::{FixedKernel, PlotFigure, Project, ScriptedFetcher};
use figcheck_compare::ComparisonEngine;
use figcheck_core::{RunConfig, Status, SubStatus, TestIdentity, TestOptions};
use figcheck_io::{SaveOptions, png};
use std::sync::Arc;

const BLUE: [u8; 3] = [31, 119, 180];
const HASH: &str = "0123456789abcdef";

fn identity() -> TestIdentity {
    TestIdentity::parse("tests.test_plot.test_x").unwrap()
}

fn engine(config: RunConfig, kernel: FixedKernel, fetcher: Arc<ScriptedFetcher>) -> ComparisonEngine {
    ComparisonEngine::new(config, Box::new(kernel), fetcher).unwrap()
}

#[test]
fn new_test_without_baseline_is_missing() {
    let project = Project::new();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let engine = engine(project.config(), FixedKernel(HASH), fetcher);

    let result = engine.compare(
        &identity(),
        &project.test_file(),
        &TestOptions::default(),
        &PlotFigure::new(BLUE),
    );

    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.image_status, Some(SubStatus::Missing));
    assert!(result.status_msg.contains("This is expected for new tests."));
    assert_eq!(result.result_image.as_deref(), Some("tests.test_plot.test_x/result.png"));
    assert!(project.results().join("tests.test_plot.test_x/result.png").is_file());
    assert!(result.baseline_image.is_none());
}

#[test]
fn matching_library_hash_passes() {
    let project = Project::new();
    let library = project.library("hashes.json", &[("tests.test_plot.test_x", HASH)]);
    let config = RunConfig {
        hash_library: Some(library),
        ..project.config()
    };
    let engine = engine(config, FixedKernel(HASH), Arc::new(ScriptedFetcher::new()));

    let result = engine.compare(
        &identity(),
        &project.test_file(),
        &TestOptions::default().with_deterministic(true),
        &PlotFigure::new(BLUE),
    );

    assert_eq!(result.status, Status::Passed, "{}", result.status_msg);
    assert_eq!(result.hash_status, Some(SubStatus::Match));
    assert_eq!(result.image_status, None);
    assert_eq!(result.baseline_hash.as_deref(), Some(HASH));
    assert_eq!(result.result_hash.as_deref(), Some(HASH));
    assert!(!project.results().join("tests.test_plot.test_x").exists());
}

#[test]
fn differing_library_hash_names_both() {
    let project = Project::new();
    let library = project.library("hashes.json", &[("tests.test_plot.test_x", "0000000000000000")]);
    let config = RunConfig {
        hash_library: Some(library),
        ..project.config()
    };
    let engine = engine(config, FixedKernel(HASH), Arc::new(ScriptedFetcher::new()));

    let result = engine.compare(
        &identity(),
        &project.test_file(),
        &TestOptions::default().with_deterministic(true),
        &PlotFigure::new(BLUE),
    );

    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.hash_status, Some(SubStatus::Diff));
    assert!(result.status_msg.contains(HASH));
    assert!(result.status_msg.contains("0000000000000000"));
    assert!(project.results().join("tests.test_plot.test_x/result.png").is_file());
}

#[test]
fn hybrid_hash_match_never_touches_the_network() {
    let project = Project::new();
    let library = project.library("hashes.json", &[("tests.test_plot.test_x", HASH)]);
    let config = RunConfig {
        hash_library: Some(library),
        baseline_path: Some("https://mirror.invalid/baseline/".into()),
        ..project.config()
    };
    let fetcher = Arc::new(ScriptedFetcher::new());
    let engine = engine(config, FixedKernel(HASH), fetcher.clone());

    let result = engine.compare(
        &identity(),
        &project.test_file(),
        &TestOptions::default().with_deterministic(true),
        &PlotFigure::new(BLUE),
    );

    assert_eq!(result.status, Status::Passed, "{}", result.status_msg);
    assert_eq!(result.hash_status, Some(SubStatus::Match));
    assert_eq!(result.image_status, None);
    assert!(fetcher.calls().is_empty());
}

#[test]
fn second_mirror_serves_after_first_fails() {
    let project = Project::new();
    let figure = PlotFigure::new(BLUE);
    let baseline = png::encode(&figure.raster(&SaveOptions::default())).unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new().serve("https://b.invalid/baseline/test_x.png", baseline),
    );
    let config = RunConfig {
        baseline_path: Some("https://a.invalid/baseline, https://b.invalid/baseline/".into()),
        ..project.config()
    };
    let engine = engine(config, FixedKernel(HASH), fetcher.clone());

    let result = engine.compare(&identity(), &project.test_file(), &TestOptions::default(), &figure);

    assert_eq!(result.status, Status::Passed, "{}", result.status_msg);
    assert_eq!(result.image_status, Some(SubStatus::Match));
    assert_eq!(
        fetcher.calls(),
        vec![
            "https://a.invalid/baseline/test_x.png".to_string(),
            "https://b.invalid/baseline/test_x.png".to_string(),
        ]
    );
}

#[test]
fn hybrid_hash_diff_falls_back_to_remote_image() {
    let project = Project::new();
    let library = project.library("hashes.json", &[("tests.test_plot.test_x", "ffffffffffffffff")]);
    let figure = PlotFigure::new(BLUE);
    let baseline = png::encode(&figure.raster(&SaveOptions::default())).unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new().serve("https://mirror.invalid/test_x.png", baseline),
    );
    let config = RunConfig {
        hash_library: Some(library),
        baseline_path: Some("https://mirror.invalid".into()),
        ..project.config()
    };
    let engine = engine(config, FixedKernel(HASH), fetcher.clone());

    let result = engine.compare(
        &identity(),
        &project.test_file(),
        &TestOptions::default().with_deterministic(true),
        &figure,
    );

    // The hash decides; the image verdict is informational.
    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.hash_status, Some(SubStatus::Diff));
    assert_eq!(result.image_status, Some(SubStatus::Match));
    assert!(result.image_disagrees());
    assert!(!result.hash_disagrees());
    assert!(result.status_msg.contains("Image comparison test"));
    assert_eq!(fetcher.calls().len(), 1);
}

#[test]
fn dark_style_changes_pixels() {
    let project = Project::new();
    let figure = PlotFigure::new(BLUE);
    project.baseline_from("test_x.png", &figure);
    let engine = engine(project.config(), FixedKernel(HASH), Arc::new(ScriptedFetcher::new()));

    let options = TestOptions {
        style: Some("dark".into()),
        ..TestOptions::default()
    };
    let result = engine.compare(&identity(), &project.test_file(), &options, &figure);

    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.image_status, Some(SubStatus::Diff));
    assert!(result.rms.unwrap() > 2.0);
    assert_eq!(
        result.diff_image.as_deref(),
        Some("tests.test_plot.test_x/result-failed-diff.png")
    );
}
