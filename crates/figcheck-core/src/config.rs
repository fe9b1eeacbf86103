//! Run and per-test configuration.
//!
//! Configuration is layered: a [`RunConfig`] describes the whole run (usually
//! loaded from YAML), a [`TestOptions`] bag carries per-test overrides, and
//! [`RunConfig::resolve`] merges the two once per comparison into a
//! [`ResolvedOptions`] with precedence per-test > run config > defaults.
//!
//! # Example
//!
//! ```rust
//! use figcheck_core::{RunConfig, TestOptions};
//!
//! let config = RunConfig::from_yaml_str("default_tolerance: 5\nkernel: phash\n").unwrap();
//! config.validate().unwrap();
//!
//! let resolved = config.resolve(&TestOptions::default().with_tolerance(1.0)).unwrap();
//! assert_eq!(resolved.tolerance, 1.0);
//! assert_eq!(resolved.hamming_tolerance, 2);
//! ```

use crate::{ArtifactFormat, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Default RMS tolerance for image comparison.
pub const DEFAULT_TOLERANCE: f64 = 2.0;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "FIGCHECK_CONFIG";

/// Largest accepted perceptual hash size.
pub const MAX_HASH_SIZE: u32 = 64;

/// Largest accepted side of the perceptual hash's resized luma plane.
pub const MAX_PHASH_SIDE: u32 = 1024;

/// Summary report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SummaryFormat {
    /// `results.json`
    Json,
    /// `fig_comparison.html`
    Html,
    /// `fig_comparison_basic.html`
    BasicHtml,
}

impl SummaryFormat {
    /// Name as accepted in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::BasicHtml => "basic-html",
        }
    }
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SummaryFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "basic-html" | "basic_html" => Ok(Self::BasicHtml),
            _ => Err(CoreError::UnsupportedSummary { name: s.to_string() }),
        }
    }
}

/// Run-wide configuration.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Baseline directory, or a comma-separated list of mirror base URLs.
    pub baseline_path: Option<String>,
    /// Interpret `baseline_path` relative to each test file's directory.
    pub baseline_relative: bool,
    /// Write generated baselines here instead of comparing.
    pub generate_path: Option<PathBuf>,
    /// Hash library to compare fingerprints against.
    pub hash_library: Option<PathBuf>,
    /// Write a hash library of generated fingerprints here.
    pub generate_hash_library: Option<PathBuf>,
    /// Root directory for per-test result artifacts and reports.
    pub results_path: PathBuf,
    /// Keep result artifacts of passing tests and always run image comparison.
    pub results_always: bool,
    /// Force deterministic output.
    pub deterministic: bool,
    /// Force non-deterministic output.
    pub no_deterministic: bool,
    /// RMS tolerance when a test does not set its own.
    pub default_tolerance: f64,
    /// Fingerprint kernel name.
    pub kernel: String,
    /// Perceptual hash size (the hash has `hash_size²` bits).
    pub hash_size: u32,
    /// Hamming tolerance in bits for similarity kernels.
    pub hamming_tolerance: u32,
    /// Perceptual hash high-frequency factor.
    pub high_freq_factor: u32,
    /// Artifact format when a test does not set its own.
    pub default_format: ArtifactFormat,
    /// Renderer style name when a test does not set its own.
    pub default_style: Option<String>,
    /// Name artifacts after the full test identity instead of the short name.
    pub use_full_test_name: bool,
    /// Summary formats to write at the end of the run.
    pub summary: Vec<String>,
    /// Worker identity used to name result fragments.
    pub worker: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            baseline_path: None,
            baseline_relative: false,
            generate_path: None,
            hash_library: None,
            generate_hash_library: None,
            results_path: PathBuf::from("figcheck-results"),
            results_always: false,
            deterministic: false,
            no_deterministic: false,
            default_tolerance: DEFAULT_TOLERANCE,
            kernel: "sha256".into(),
            hash_size: 16,
            hamming_tolerance: 2,
            high_freq_factor: 4,
            default_format: ArtifactFormat::Png,
            default_style: None,
            use_full_test_name: false,
            summary: Vec::new(),
            worker: None,
        }
    }
}

impl RunConfig {
    /// Loads a config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "loading run config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads the explicit path if given, else `$FIGCHECK_CONFIG`, else defaults.
    pub fn discover(explicit: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Checks the config for invalid or conflicting settings.
    ///
    /// Kernel names are checked by the kernel registry when the kernel is
    /// constructed, which also happens before any test runs.
    pub fn validate(&self) -> CoreResult<()> {
        if self.deterministic && self.no_deterministic {
            return Err(CoreError::config(
                "Only one of `deterministic` and `no_deterministic` can be set.",
            ));
        }
        if self.kernel.trim().is_empty() {
            return Err(CoreError::config("kernel name must not be empty"));
        }
        if self.hash_size == 0 {
            return Err(CoreError::config("hash_size must be positive"));
        }
        if self.high_freq_factor == 0 {
            return Err(CoreError::config("high_freq_factor must be positive"));
        }
        if self.hash_size > MAX_HASH_SIZE {
            return Err(CoreError::config(format!(
                "hash_size must be at most {MAX_HASH_SIZE}, got {}",
                self.hash_size
            )));
        }
        let side = u64::from(self.hash_size) * u64::from(self.high_freq_factor);
        if side > u64::from(MAX_PHASH_SIDE) {
            return Err(CoreError::config(format!(
                "hash_size * high_freq_factor must be at most {MAX_PHASH_SIDE}, got {side}"
            )));
        }
        check_tolerance("default_tolerance", self.default_tolerance)?;
        if let Some(worker) = &self.worker {
            if worker.is_empty() || worker.contains(['/', '\\']) {
                return Err(CoreError::config(format!("invalid worker name {worker:?}")));
            }
        }
        self.summary_formats()?;
        Ok(())
    }

    /// Explicit run-level determinism setting, if any.
    pub fn deterministic_setting(&self) -> Option<bool> {
        match (self.deterministic, self.no_deterministic) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    /// Parsed summary formats, deduplicated in request order.
    pub fn summary_formats(&self) -> CoreResult<Vec<SummaryFormat>> {
        let mut formats = Vec::new();
        for name in self.summary.iter().flat_map(|s| s.split(',')).map(str::trim) {
            if name.is_empty() {
                continue;
            }
            let format: SummaryFormat = name.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }

    /// Whether any fingerprint generation target is configured.
    pub fn is_generating(&self) -> bool {
        self.generate_path.is_some() || self.generate_hash_library.is_some()
    }

    /// Worker name for fragment files (`main` when unset).
    pub fn worker_name(&self) -> &str {
        self.worker.as_deref().unwrap_or("main")
    }

    /// Merges per-test options over this config.
    ///
    /// Fails when the per-test tolerance is negative or not a number.
    pub fn resolve(&self, options: &TestOptions) -> CoreResult<ResolvedOptions> {
        if let Some(tolerance) = options.tolerance {
            check_tolerance("tolerance", tolerance)?;
        }
        Ok(ResolvedOptions {
            tolerance: options.tolerance.unwrap_or(self.default_tolerance),
            filename: options.filename.clone(),
            baseline_dir: options.baseline_dir.clone(),
            hash_library: options
                .hash_library
                .clone()
                .or_else(|| self.hash_library.clone()),
            format: options.format.unwrap_or(self.default_format),
            style: options.style.clone().or_else(|| self.default_style.clone()),
            remove_text: options.remove_text,
            deterministic: options.deterministic,
            hamming_tolerance: options.hamming_tolerance.unwrap_or(self.hamming_tolerance),
            save_metadata: options.save_metadata.clone(),
            use_full_test_name: self.use_full_test_name,
        })
    }
}

fn check_tolerance(field: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::config(format!(
            "{field} must be a non-negative number, got {value}"
        )))
    }
}

/// Per-test overrides. Unset fields fall back to the [`RunConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestOptions {
    /// RMS tolerance.
    pub tolerance: Option<f64>,
    /// Artifact file name, replacing the name derived from the identity.
    pub filename: Option<String>,
    /// Baseline directory (relative to the test file) or mirror URL list.
    pub baseline_dir: Option<String>,
    /// Hash library path.
    pub hash_library: Option<PathBuf>,
    /// Artifact format.
    pub format: Option<ArtifactFormat>,
    /// Renderer style name.
    pub style: Option<String>,
    /// Ask the renderer to drop tick labels and titles.
    pub remove_text: bool,
    /// Explicit determinism setting.
    pub deterministic: Option<bool>,
    /// Hamming tolerance for similarity kernels.
    pub hamming_tolerance: Option<u32>,
    /// Metadata passed to the renderer (`None` omits the key).
    pub save_metadata: BTreeMap<String, Option<String>>,
}

impl TestOptions {
    /// Sets the RMS tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Sets the artifact file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the baseline directory or mirror list.
    pub fn with_baseline_dir(mut self, dir: impl Into<String>) -> Self {
        self.baseline_dir = Some(dir.into());
        self
    }

    /// Sets the hash library path.
    pub fn with_hash_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.hash_library = Some(path.into());
        self
    }

    /// Sets the artifact format.
    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the determinism flag.
    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = Some(deterministic);
        self
    }

    /// Sets the Hamming tolerance.
    pub fn with_hamming_tolerance(mut self, bits: u32) -> Self {
        self.hamming_tolerance = Some(bits);
        self
    }

    /// Adds a metadata entry for the renderer.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.save_metadata.insert(key.into(), value);
        self
    }
}

/// Options of one comparison after layering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// RMS tolerance.
    pub tolerance: f64,
    /// Explicit artifact file name.
    pub filename: Option<String>,
    /// Per-test baseline directory or mirror list.
    pub baseline_dir: Option<String>,
    /// Hash library in effect.
    pub hash_library: Option<PathBuf>,
    /// Artifact format.
    pub format: ArtifactFormat,
    /// Renderer style name.
    pub style: Option<String>,
    /// Ask the renderer to drop tick labels and titles.
    pub remove_text: bool,
    /// Per-test determinism setting (the run-level one is in [`RunConfig`]).
    pub deterministic: Option<bool>,
    /// Hamming tolerance.
    pub hamming_tolerance: u32,
    /// Metadata passed to the renderer.
    pub save_metadata: BTreeMap<String, Option<String>>,
    /// Name artifacts after the full identity.
    pub use_full_test_name: bool,
}
