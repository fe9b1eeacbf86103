//! Run-level properties: kernel laws, determinism, merge and report stability.

use crate::fixtures::{PlotFigure, Project, ScriptedFetcher};
use approx::assert_abs_diff_eq;
use figcheck_compare::ComparisonEngine;
use figcheck_core::{ArtifactFormat, ComparisonResult, RunConfig, Status, SubStatus, TestIdentity, TestOptions};
use figcheck_hash::phash::hamming_distance;
use figcheck_hash::{Kernel, KernelOverrides, PHashKernel, Sha256Kernel};
use figcheck_io::{Determinism, SaveOptions, png, render_normalized};
use figcheck_report::{RunSummary, Statistics, WorkerFragment, html, merge_fragments, merge_hashes, read_fragments};
use std::sync::Arc;

fn plot_png(line: [u8; 3], slope: f32) -> Vec<u8> {
    let figure = PlotFigure::new(line).with_slope(slope);
    png::encode(&figure.raster(&SaveOptions::default())).unwrap()
}

fn kernels() -> Vec<Box<dyn Kernel>> {
    vec![
        Box::new(Sha256Kernel),
        Box::new(PHashKernel::new(16, 4, 2).unwrap()),
        Box::new(PHashKernel::new(8, 4, 0).unwrap()),
    ]
}

#[test]
fn every_kernel_is_reflexive() {
    let bytes = plot_png([200, 30, 30], 0.5);
    for kernel in kernels() {
        let fp = kernel.fingerprint(&bytes).unwrap();
        assert_eq!(fp, kernel.fingerprint(&bytes).unwrap(), "{} not stable", kernel.name());
        let same = kernel.equivalent(&fp, &fp, &KernelOverrides::default());
        assert!(same.equivalent, "{} not reflexive", kernel.name());
        if let Some(distance) = same.distance {
            assert_eq!(distance, 0);
        }
    }
}

#[test]
fn hamming_distance_is_symmetric() {
    let kernel = PHashKernel::new(16, 4, 2).unwrap();
    let a = kernel.fingerprint(&plot_png([0, 0, 0], 0.2)).unwrap();
    let b = kernel.fingerprint(&plot_png([0, 0, 0], 0.9)).unwrap();
    assert_eq!(hamming_distance(&a, &b), hamming_distance(&b, &a));

    let overrides = KernelOverrides::default();
    let ab = kernel.equivalent(&a, &b, &overrides);
    let ba = kernel.equivalent(&b, &a, &overrides);
    assert_eq!(ab.distance, ba.distance);
    assert_eq!(ab.equivalent, ba.equivalent);
}

#[test]
fn exact_kernel_sees_every_byte() {
    let kernel = Sha256Kernel;
    let bytes = plot_png([10, 20, 30], 0.75);
    let reference = kernel.fingerprint(&bytes).unwrap();
    for i in [0, bytes.len() / 2, bytes.len() - 1] {
        let mut changed = bytes.clone();
        changed[i] ^= 0x01;
        let fp = kernel.fingerprint(&changed).unwrap();
        assert_ne!(fp, reference, "flip at byte {i} went unnoticed");
        assert!(!kernel.equivalent(&fp, &reference, &KernelOverrides::default()).equivalent);
    }
}

#[test]
fn normalized_renders_are_byte_stable() {
    let figure = PlotFigure::new([31, 119, 180]);
    let pinned = Determinism {
        enabled: true,
        ambiguous: false,
    };
    for format in [ArtifactFormat::Png, ArtifactFormat::Svg, ArtifactFormat::Pdf, ArtifactFormat::Eps] {
        let options = SaveOptions::default().with_format(format);
        let first = render_normalized(&figure, &options, pinned).unwrap();
        let second = render_normalized(&figure, &options, pinned).unwrap();
        assert_eq!(first, second, "{format} not deterministic");

        let loose_a = render_normalized(&figure, &options, Determinism::default()).unwrap();
        let loose_b = render_normalized(&figure, &options, Determinism::default()).unwrap();
        assert_ne!(loose_a, loose_b, "{format} fixture should vary without pinning");
    }
}

#[test]
fn engine_results_survive_json() {
    let project = Project::new();
    let figure = PlotFigure::new([0, 128, 0]);
    project.baseline_from("test_line.png", &PlotFigure::new([0, 128, 0]).with_slope(0.3));
    let engine = ComparisonEngine::new(
        project.config(),
        Box::new(Sha256Kernel),
        Arc::new(ScriptedFetcher::new()),
    )
    .unwrap();

    let result = engine.compare(
        &TestIdentity::parse("tests.test_plot.test_line").unwrap(),
        &project.test_file(),
        &TestOptions::default(),
        &figure,
    );
    assert_eq!(result.image_status, Some(SubStatus::Diff));

    let json = serde_json::to_string(&result).unwrap();
    let back: ComparisonResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

/// Runs one worker's share of a suite with the exact kernel and no library
/// entries, so every test is a missing hash with a recorded fingerprint.
fn run_worker(project: &Project, worker: &str, tests: &[&str]) -> WorkerFragment {
    let config = RunConfig {
        hash_library: Some(project.library(&format!("{worker}.json"), &[])),
        worker: Some(worker.into()),
        ..project.config()
    };
    let engine = ComparisonEngine::new(config, Box::new(Sha256Kernel), Arc::new(ScriptedFetcher::new()))
        .unwrap();

    for (i, name) in tests.iter().enumerate() {
        let identity = TestIdentity::parse(format!("tests.test_plot.{name}")).unwrap();
        let figure = PlotFigure::new([i as u8 * 40, 0, 0]);
        engine.compare(
            &identity,
            &project.test_file(),
            &TestOptions::default().with_deterministic(true),
            &figure,
        );
    }
    let fragment = WorkerFragment::from_engine(&engine);
    assert_eq!(fragment.worker, worker);
    assert_eq!(fragment.results.len(), tests.len());
    fragment
}

#[test]
fn merged_run_is_the_union_of_workers() {
    let project = Project::new();
    let gw0 = run_worker(&project, "gw0", &["test_a", "test_b"]);
    let gw1 = run_worker(&project, "gw1", &["test_c"]);

    let fragments_dir = project.root().join("fragments");
    gw0.write(&fragments_dir).unwrap();
    gw1.write(&fragments_dir).unwrap();
    let fragments = read_fragments(&fragments_dir).unwrap();
    assert_eq!(fragments.len(), 2);

    let merged = merge_fragments(&fragments).unwrap();
    assert_eq!(merged.len(), 3);
    let expected = [&gw0, &gw1]
        .iter()
        .map(|f| RunSummary::from_results(f.results.clone()).statistics())
        .fold(Statistics::default(), |acc, s| acc + s);
    assert_eq!(merged.statistics(), expected);
    assert_eq!(expected.failed, 3);
    assert_eq!(expected.hash_failed, 3);

    let hashes = merge_hashes(&fragments).unwrap();
    assert_eq!(hashes.len(), 3);
    for (key, result) in merged.iter() {
        assert_eq!(result.hash_status, Some(SubStatus::Missing));
        assert_eq!(hashes.get(key), result.result_hash.as_ref());
    }
}

#[test]
fn html_report_is_stable() {
    let project = Project::new();
    let fragment = run_worker(&project, "main", &["test_a", "test_b", "test_c"]);
    let summary = merge_fragments(std::slice::from_ref(&fragment)).unwrap();

    let first = html::render_html(&summary);
    let second = html::render_html(&RunSummary::from_json(&summary.to_json().unwrap()).unwrap());
    assert_eq!(first, second);
    // Nothing has a baseline hash yet, so hash filters are hidden.
    assert!(first.contains(r#"<body class="no-hash-test">"#));
}

#[test]
fn concurrent_comparisons_do_not_interfere() {
    let project = Project::new();
    let figure = PlotFigure::new([50, 50, 200]);
    for i in 0..8 {
        project.baseline_from(&format!("test_{i}.png"), &figure);
    }
    let engine = ComparisonEngine::new(
        RunConfig {
            results_always: true,
            ..project.config()
        },
        Box::new(Sha256Kernel),
        Arc::new(ScriptedFetcher::new()),
    )
    .unwrap();

    let results: Vec<ComparisonResult> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (engine, project, figure) = (&engine, &project, &figure);
                scope.spawn(move || {
                    let identity = TestIdentity::parse(format!("tests.test_plot.test_{i}")).unwrap();
                    engine.compare(&identity, &project.test_file(), &TestOptions::default(), figure)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.status, Status::Passed, "{}", result.status_msg);
        assert_abs_diff_eq!(result.rms.unwrap(), 0.0, epsilon = 1e-4);
        let dir = project.results().join(format!("tests.test_plot.test_{i}"));
        assert!(dir.join("result.png").is_file());
        assert!(dir.join("baseline.png").is_file());
    }
}
