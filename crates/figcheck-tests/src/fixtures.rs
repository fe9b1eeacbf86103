//! Test fixtures: a synthetic renderer, scripted fetchers and a scratch
//! project layout.

use figcheck_compare::{BaselineFetcher, CompareError, CompareResult};
use figcheck_core::{ArtifactFormat, RunConfig};
use figcheck_hash::{Equivalence, HashResult, Kernel, KernelOverrides};
use figcheck_io::{Figure, IoResult, RasterImage, SaveOptions, png};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

/// A line plot that renders like a real plotting library would: every output
/// carries a fresh build stamp unless the metadata pins it.
pub struct PlotFigure {
    width: u32,
    height: u32,
    line: [u8; 3],
    slope: f32,
    clock: AtomicU64,
}

impl PlotFigure {
    /// White 40x30 canvas with a diagonal line.
    pub fn new(line: [u8; 3]) -> Self {
        Self {
            width: 40,
            height: 30,
            line,
            slope: 0.75,
            clock: AtomicU64::new(1),
        }
    }

    /// Same plot with another canvas size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Same plot with another line slope.
    pub fn with_slope(mut self, slope: f32) -> Self {
        self.slope = slope;
        self
    }

    fn stamp(&self) -> String {
        self.clock.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Rendered pixels, ignoring metadata.
    pub fn raster(&self, options: &SaveOptions) -> RasterImage {
        let background = match options.style.as_deref() {
            Some("dark") => [20, 20, 20],
            _ => [255, 255, 255],
        };
        let mut image = RasterImage::filled_rgb(self.width, self.height, background);
        for x in 0..self.width {
            let y = (x as f32 * self.slope) as u32;
            if y < self.height {
                let i = ((y * self.width + x) * 3) as usize;
                image.data[i..i + 3].copy_from_slice(&self.line);
            }
        }
        // Title strip along the top row.
        if !options.remove_text {
            for x in 2..self.width.min(12) {
                let i = (x * 3) as usize;
                image.data[i..i + 3].copy_from_slice(&[0, 0, 0]);
            }
        }
        image
    }
}

impl Figure for PlotFigure {
    fn render(&self, options: &SaveOptions) -> IoResult<Vec<u8>> {
        match options.format {
            ArtifactFormat::Png => {
                let image = self.raster(options);
                match options.metadata_value("Software") {
                    Some(None) => png::encode(&image),
                    Some(Some(v)) => png::encode_with_text(&image, &[("Software", v)]),
                    // Ignores the request the way some backends do.
                    None => {
                        let software = format!("plotlib 1.0 build {}", self.stamp());
                        png::encode_with_text(&image, &[("Software", &software)])
                    }
                }
            }
            ArtifactFormat::Svg => {
                let salt = options.hashsalt.clone().unwrap_or_else(|| self.stamp());
                let mut doc = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\">\n");
                if options.metadata_value("Date") != Some(None) {
                    doc.push_str(&format!("<metadata>date {}</metadata>\n", self.stamp()));
                }
                doc.push_str(&format!(
                    "<path id=\"line-{salt}\" d=\"M0 0 L{} {}\"/>\n</svg>\n",
                    self.width,
                    self.width as f32 * self.slope
                ));
                Ok(doc.into_bytes())
            }
            ArtifactFormat::Pdf | ArtifactFormat::Eps => {
                let date = std::env::var(figcheck_io::normalize::SOURCE_DATE_EPOCH)
                    .unwrap_or_else(|_| self.stamp());
                let header = if options.format == ArtifactFormat::Pdf {
                    "%PDF-1.4"
                } else {
                    "%!PS-Adobe-3.0 EPSF-3.0"
                };
                let mut doc = format!("{header}\n");
                match options.metadata_value("Creator") {
                    Some(None) => {}
                    Some(Some(v)) => doc.push_str(&format!("%%Creator: {v}\n")),
                    None => doc.push_str(&format!("%%Creator: plotlib {}\n", self.stamp())),
                }
                doc.push_str(&format!("%%CreationDate: {date}\n%%EOF\n"));
                Ok(doc.into_bytes())
            }
        }
    }
}

/// Kernel whose fingerprint is fixed, for driving library lookups exactly.
pub struct FixedKernel(pub &'static str);

impl Kernel for FixedKernel {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn fingerprint(&self, _bytes: &[u8]) -> HashResult<String> {
        Ok(self.0.to_string())
    }

    fn equivalent(&self, actual: &str, expected: &str, _overrides: &KernelOverrides) -> Equivalence {
        Equivalence::exact(actual == expected)
    }
}

/// In-memory mirror network that records every request.
#[derive(Default)]
pub struct ScriptedFetcher {
    served: BTreeMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// Network with nothing reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` at `url`.
    pub fn serve(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.served.insert(url.into(), bytes);
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl BaselineFetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> CompareResult<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        self.served.get(url).cloned().ok_or_else(|| CompareError::Fetch {
            url: url.to_string(),
            reason: "connection refused".into(),
        })
    }
}

/// Scratch project: `tests/test_plot.rs`, `tests/baseline/`, `results/`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Creates the layout in a fresh temp dir.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("tests/baseline")).expect("baseline dir");
        Self { dir }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The (never read) test source file.
    pub fn test_file(&self) -> PathBuf {
        self.root().join("tests/test_plot.rs")
    }

    /// Default baseline directory.
    pub fn baseline_dir(&self) -> PathBuf {
        self.root().join("tests/baseline")
    }

    /// Results root.
    pub fn results(&self) -> PathBuf {
        self.root().join("results")
    }

    /// Run config writing into this project's results root.
    pub fn config(&self) -> RunConfig {
        RunConfig {
            results_path: self.results(),
            ..Default::default()
        }
    }

    /// Writes a baseline rendered from `figure`.
    pub fn baseline_from(&self, name: &str, figure: &PlotFigure) -> PathBuf {
        let path = self.baseline_dir().join(name);
        png::write(&path, &figure.raster(&SaveOptions::default())).expect("write baseline");
        path
    }

    /// Writes a hash library.
    pub fn library(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.root().join(name);
        let map: BTreeMap<&str, &str> = entries.iter().copied().collect();
        let json = serde_json::to_string_pretty(&map).expect("serialize library");
        std::fs::write(&path, json).expect("write library");
        path
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
