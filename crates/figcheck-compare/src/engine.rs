//! The comparison engine.
//!
//! One [`ComparisonEngine`] serves a whole run (or one worker of it). For
//! every test it renders the figure through the normalizer, picks a
//! [`Mode`] from the configuration and produces exactly one
//! [`ComparisonResult`]:
//!
//! - **Generating**: write the artifact and/or record its fingerprint; skipped.
//! - **HashOnly**: look the fingerprint up in the hash library.
//! - **ImageOnly**: resolve the baseline image and compare pixels.
//! - **Hybrid**: hash first; the image comparison only runs when the hash did
//!   not match or results are always materialized. The hash verdict decides.
//!
//! [`ComparisonEngine::compare`] never fails. Errors and panics inside a
//! comparison become failed results labelled as internal errors.

use crate::baseline::{BaselineResolver, artifact_filename};
use crate::diff::{PixelOutcome, compare_files};
use crate::fetch::{BaselineFetcher, HttpFetcher};
use crate::hash_library::{HashLibrary, HashLibraryCache, write_hash_library};
use crate::{CompareError, CompareResult};
use figcheck_core::{
    ComparisonResult, KernelSummary, ResolvedOptions, RunConfig, SubStatus, TestIdentity,
    TestOptions,
};
use figcheck_hash::{Kernel, KernelOverrides, KernelParams, kernel_from_name};
use figcheck_io::{
    DeterministicPolicy, Figure, SaveOptions, detect, render_normalized, write_atomic,
};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Diff image file name inside a test's result directory.
pub const DIFF_IMAGE: &str = "result-failed-diff.png";

const IMAGE_SECTION: &str = "Image comparison test\n---------------------";

/// How a test is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write baselines instead of comparing.
    Generating,
    /// Compare fingerprints only.
    HashOnly,
    /// Compare fingerprints, fall back to pixels for diagnostics.
    Hybrid,
    /// Compare pixels only.
    ImageOnly,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generating => "generating",
            Self::HashOnly => "hash-only",
            Self::Hybrid => "hybrid",
            Self::ImageOnly => "image-only",
        })
    }
}

/// Outcome of the fingerprint half of a comparison.
struct HashVerdict {
    status: SubStatus,
    message: String,
    baseline: Option<String>,
    result: String,
    summary: KernelSummary,
}

/// Outcome of the pixel half of a comparison.
struct ImageVerdict {
    status: SubStatus,
    message: String,
    rms: Option<f64>,
    baseline_image: Option<String>,
    diff_image: Option<String>,
}

/// Paths of one test's result directory.
struct TestDir {
    root: PathBuf,
    rel: String,
}

/// A rendered artifact written into its test directory.
struct Written {
    dir: TestDir,
    path: PathBuf,
    rel: String,
}

impl TestDir {
    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn rel(&self, file: &str) -> String {
        format!("{}/{file}", self.rel)
    }
}

/// Per-run comparison engine.
pub struct ComparisonEngine {
    config: RunConfig,
    kernel: Box<dyn Kernel>,
    fetcher: Arc<dyn BaselineFetcher>,
    libraries: HashLibraryCache,
    recorded: Mutex<HashLibrary>,
    results: Mutex<BTreeMap<String, ComparisonResult>>,
}

impl ComparisonEngine {
    /// Creates an engine. The config is validated here, before any test runs.
    pub fn new(
        config: RunConfig,
        kernel: Box<dyn Kernel>,
        fetcher: Arc<dyn BaselineFetcher>,
    ) -> CompareResult<Self> {
        config.validate()?;
        if kernel.name() != config.kernel {
            warn!(
                configured = %config.kernel,
                used = kernel.name(),
                "kernel differs from the configured kernel name"
            );
        }
        Ok(Self {
            config,
            kernel,
            fetcher,
            libraries: HashLibraryCache::new(),
            recorded: Mutex::new(HashLibrary::new()),
            results: Mutex::new(BTreeMap::new()),
        })
    }

    /// Creates an engine with the configured kernel and the HTTP fetcher.
    pub fn from_config(config: RunConfig) -> CompareResult<Self> {
        config.validate()?;
        let kernel = kernel_from_name(&config.kernel, &KernelParams::from_config(&config))?;
        Self::new(config, kernel, Arc::new(HttpFetcher::new()))
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The fingerprint kernel.
    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }

    /// Evaluation mode for a test with these options.
    pub fn mode(&self, options: &ResolvedOptions) -> Mode {
        if self.config.is_generating() {
            Mode::Generating
        } else if options.hash_library.is_some() {
            if self.config.baseline_path.is_some() || options.baseline_dir.is_some() {
                Mode::Hybrid
            } else {
                Mode::HashOnly
            }
        } else {
            Mode::ImageOnly
        }
    }

    /// Compares one test's figure. Never fails; see the module docs.
    pub fn compare(
        &self,
        identity: &TestIdentity,
        test_file: &Path,
        options: &TestOptions,
        figure: &dyn Figure,
    ) -> ComparisonResult {
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            self.try_compare(identity, test_file, options, figure)
        }));
        let result = match attempt {
            Ok(Ok(result)) => result,
            Ok(Err(err @ CompareError::HashLibraryNotFound { .. })) => {
                error!(test = %identity, "{err}");
                ComparisonResult::failure(err.to_string())
            }
            Ok(Err(err)) => {
                error!(test = %identity, "comparison failed: {err}");
                ComparisonResult::internal_error(err)
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(test = %identity, "comparison panicked: {msg}");
                ComparisonResult::internal_error(msg)
            }
        };
        info!(test = %identity, status = %result.status, "compared figure");
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), result.clone());
        result
    }

    /// Results of every comparison so far, keyed by test identity.
    pub fn results(&self) -> BTreeMap<String, ComparisonResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fingerprints recorded so far (generated, or observed while comparing).
    pub fn recorded_hashes(&self) -> HashLibrary {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes recorded fingerprints to the configured generation library.
    ///
    /// Returns the path written, or `None` when no library is being generated.
    pub fn write_generated_library(&self) -> CompareResult<Option<PathBuf>> {
        let Some(path) = &self.config.generate_hash_library else {
            return Ok(None);
        };
        write_hash_library(path, &self.recorded_hashes())?;
        info!(path = %path.display(), "wrote hash library");
        Ok(Some(path.clone()))
    }

    fn try_compare(
        &self,
        identity: &TestIdentity,
        test_file: &Path,
        options: &TestOptions,
        figure: &dyn Figure,
    ) -> CompareResult<ComparisonResult> {
        let mut resolved = self.config.resolve(options)?;
        // Per-test libraries are relative to the test file.
        if let Some(library) = &options.hash_library {
            let test_dir = test_file.parent().unwrap_or_else(|| Path::new("."));
            resolved.hash_library = Some(test_dir.join(library));
        }
        let mode = self.mode(&resolved);
        debug!(test = %identity, %mode, "selected comparison mode");

        let hash_in_play = matches!(mode, Mode::HashOnly | Mode::Hybrid)
            || self.config.generate_hash_library.is_some();
        let determinism = DeterministicPolicy {
            per_test: resolved.deterministic,
            run: self.config.deterministic_setting(),
            hash_in_play,
        }
        .resolve();
        if determinism.ambiguous {
            warn!(
                test = %identity,
                "deterministic option not set; enabling it since the output is hashed. \
                 Set deterministic explicitly to silence this warning"
            );
        }

        let bytes = render_normalized(figure, &SaveOptions::from_resolved(&resolved), determinism)?;
        detect::check_format(&bytes, resolved.format)?;
        let filename = artifact_filename(identity, &resolved);

        let (result, dir) = match mode {
            Mode::Generating => return self.generate(identity, &filename, &bytes),
            Mode::HashOnly => {
                let written = self.write_result(identity, &resolved, &bytes)?;
                let hash = self.evaluate_hash(identity, &resolved, &bytes)?;
                let result = hash_result(hash, None).with_images(Some(written.rel), None, None);
                (result, written.dir)
            }
            Mode::ImageOnly => {
                let written = self.write_result(identity, &resolved, &bytes)?;
                let image = self.evaluate_image(test_file, &resolved, &filename, &written)?;
                let result = ComparisonResult::from_outcomes(Some(image.status), None, image.message)
                    .with_rms(image.rms, resolved.tolerance)
                    .with_images(Some(written.rel), image.baseline_image, image.diff_image);
                (result, written.dir)
            }
            Mode::Hybrid => {
                let written = self.write_result(identity, &resolved, &bytes)?;
                let hash = self.evaluate_hash(identity, &resolved, &bytes)?;
                let result = if hash.status == SubStatus::Match && !self.config.results_always {
                    hash_result(hash, None).with_images(Some(written.rel.clone()), None, None)
                } else {
                    match self.evaluate_image(test_file, &resolved, &filename, &written) {
                        Ok(image) => {
                            hybrid_result(hash, image, resolved.tolerance, written.rel.clone())
                        }
                        Err(err) => {
                            warn!(test = %identity, "image comparison unavailable: {err}");
                            hash_result(hash, Some(err.to_string()))
                                .with_images(Some(written.rel.clone()), None, None)
                        }
                    }
                };
                (result, written.dir)
            }
        };
        Ok(self.finish(result, &dir))
    }

    fn generate(
        &self,
        identity: &TestIdentity,
        filename: &str,
        bytes: &[u8],
    ) -> CompareResult<ComparisonResult> {
        let mut image_status = None;
        let mut hash_status = None;
        let mut result_hash = None;

        if let Some(dir) = &self.config.generate_path {
            let path = dir.join(filename);
            write_atomic(&path, bytes)?;
            info!(test = %identity, path = %path.display(), "generated baseline image");
            image_status = Some(SubStatus::Generated);
        }
        if self.config.generate_hash_library.is_some() {
            let hash = self.kernel.fingerprint(bytes)?;
            self.record(identity, &hash);
            hash_status = Some(SubStatus::Generated);
            result_hash = Some(hash);
        }

        Ok(
            ComparisonResult::from_outcomes(
                image_status,
                hash_status,
                "Skipping test, since generating data",
            )
            .with_hashes(None, result_hash),
        )
    }

    fn evaluate_hash(
        &self,
        identity: &TestIdentity,
        options: &ResolvedOptions,
        bytes: &[u8],
    ) -> CompareResult<HashVerdict> {
        let Some(path) = &options.hash_library else {
            return Err(CompareError::Config(figcheck_core::CoreError::config(
                "hash comparison requested without a hash library",
            )));
        };
        let library = self.libraries.get(path)?;
        let result = self.kernel.fingerprint(bytes)?;
        self.record(identity, &result);

        let Some(expected) = library.get(identity.as_str()) else {
            return Ok(HashVerdict {
                status: SubStatus::Missing,
                message: format!(
                    "Hash for test '{identity}' not found in {}. Generated hash is {result}.",
                    path.display()
                ),
                baseline: None,
                result,
                summary: KernelSummary::named(self.kernel.name()),
            });
        };

        let overrides = KernelOverrides {
            hamming_tolerance: Some(options.hamming_tolerance),
        };
        let outcome = self.kernel.equivalent(&result, expected, &overrides);
        let summary = self.kernel.summary(&outcome);
        let (status, message) = if outcome.equivalent {
            (SubStatus::Match, String::new())
        } else {
            let base = format!(
                "Hash {result} doesn't match hash {expected} in library {} for test {identity}.",
                path.display()
            );
            (SubStatus::Diff, self.kernel.enrich_message(&base, &outcome))
        };
        debug!(test = %identity, %status, "hash comparison");
        Ok(HashVerdict {
            status,
            message,
            baseline: Some(expected.clone()),
            result,
            summary,
        })
    }

    fn evaluate_image(
        &self,
        test_file: &Path,
        options: &ResolvedOptions,
        filename: &str,
        written: &Written,
    ) -> CompareResult<ImageVerdict> {
        let (dir, result_path) = (&written.dir, written.path.as_path());
        if !options.format.is_raster() {
            return Err(CompareError::NotRaster(options.format.to_string()));
        }
        let resolver = BaselineResolver::new(&self.config, self.fetcher.as_ref());
        let reference = resolver.reference(test_file, options);
        let baseline_name = format!("baseline.{}", options.format.extension());

        let Some(baseline) = resolver.fetch(&reference, filename, &dir.path(&baseline_name))? else {
            return Ok(ImageVerdict {
                status: SubStatus::Missing,
                message: format!(
                    "Image file not found for comparison test in: \n\t{reference}\n\
                     (This is expected for new tests.)\nGenerated Image: \n\t{}",
                    result_path.display()
                ),
                rms: None,
                baseline_image: None,
                diff_image: None,
            });
        };
        let baseline_rel = Some(dir.rel(&baseline_name));

        let diff_path = dir.path(DIFF_IMAGE);
        let verdict = match compare_files(&baseline, result_path, options.tolerance, &diff_path)? {
            PixelOutcome::ShapeMismatch { expected, actual } => ImageVerdict {
                status: SubStatus::Diff,
                message: format!(
                    "Image dimensions did not match.\n  Expected shape: {expected}\n    {}\n  \
                     Actual shape: {actual}\n    {}",
                    baseline.display(),
                    result_path.display()
                ),
                rms: None,
                baseline_image: baseline_rel,
                diff_image: None,
            },
            PixelOutcome::Within { rms } => ImageVerdict {
                status: SubStatus::Match,
                message: String::new(),
                rms: Some(rms),
                baseline_image: baseline_rel,
                diff_image: None,
            },
            PixelOutcome::Exceeds { rms } => ImageVerdict {
                status: SubStatus::Diff,
                message: format!(
                    "Error: Image files did not match.\n  RMS Value: {rms}\n  Expected:  \n    {}\n  \
                     Actual:    \n    {}\n  Difference:\n    {}\n  Tolerance: \n    {}",
                    baseline.display(),
                    result_path.display(),
                    diff_path.display(),
                    options.tolerance
                ),
                rms: Some(rms),
                baseline_image: baseline_rel,
                diff_image: Some(dir.rel(DIFF_IMAGE)),
            },
        };
        Ok(verdict)
    }

    /// Writes `result.<ext>` into a fresh result directory for the test.
    fn write_result(
        &self,
        identity: &TestIdentity,
        options: &ResolvedOptions,
        bytes: &[u8],
    ) -> CompareResult<Written> {
        let rel = identity.sanitized();
        let root = self.config.results_path.join(&rel);
        if root.exists() {
            std::fs::remove_dir_all(&root)?;
        }
        std::fs::create_dir_all(&root)?;
        let dir = TestDir { root, rel };

        let name = format!("result.{}", options.format.extension());
        let path = dir.path(&name);
        write_atomic(&path, bytes)?;
        let rel = dir.rel(&name);
        Ok(Written { dir, path, rel })
    }

    /// Removes the result directory of passing tests unless results are kept.
    fn finish(&self, result: ComparisonResult, dir: &TestDir) -> ComparisonResult {
        if result.status != figcheck_core::Status::Passed || self.config.results_always {
            return result;
        }
        if let Err(err) = std::fs::remove_dir_all(&dir.root) {
            warn!(path = %dir.root.display(), "failed to remove result directory: {err}");
            return result;
        }
        result.without_images()
    }

    fn record(&self, identity: &TestIdentity, hash: &str) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), hash.to_string());
    }
}

fn hash_result(hash: HashVerdict, note: Option<String>) -> ComparisonResult {
    let message = match note {
        Some(note) => join_sections(&hash.message, &note),
        None => hash.message,
    };
    ComparisonResult::from_outcomes(None, Some(hash.status), message)
        .with_hashes(hash.baseline, Some(hash.result))
        .with_kernel(Some(hash.summary))
}

fn hybrid_result(
    hash: HashVerdict,
    image: ImageVerdict,
    tolerance: f64,
    result_rel: String,
) -> ComparisonResult {
    let image_msg = if image.message.is_empty() {
        "The comparison to the baseline image succeeded.".to_string()
    } else {
        image.message
    };
    ComparisonResult::from_outcomes(
        Some(image.status),
        Some(hash.status),
        join_sections(&hash.message, &image_msg),
    )
    .with_rms(image.rms, tolerance)
    .with_images(Some(result_rel), image.baseline_image, image.diff_image)
    .with_hashes(hash.baseline, Some(hash.result))
    .with_kernel(Some(hash.summary))
}

fn join_sections(hash_msg: &str, image_msg: &str) -> String {
    if hash_msg.is_empty() {
        format!("{IMAGE_SECTION}\n{image_msg}")
    } else {
        format!("{hash_msg}\n\n{IMAGE_SECTION}\n{image_msg}")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
