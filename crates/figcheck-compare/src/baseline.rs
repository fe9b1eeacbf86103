//! Baseline resolution.
//!
//! For each test the resolver derives the artifact file name and the
//! [`BaselineReference`] it should be compared against, then materializes the
//! baseline into the test's result directory. Local baselines are copied,
//! never moved; remote baselines are tried mirror by mirror.
//!
//! Precedence for the reference, highest first:
//!
//! 1. per-test `baseline_dir` (URL list, or a directory relative to the test file)
//! 2. run `baseline_path` with `baseline_relative` (relative to the test file)
//! 3. run `baseline_path` (absolute directory or URL list)
//! 4. `baseline/` next to the test file

use crate::fetch::{BaselineFetcher, is_remote};
use crate::CompareResult;
use figcheck_core::{ResolvedOptions, RunConfig, TestIdentity};
use figcheck_io::{copy_atomic, write_atomic};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a test's baseline lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineReference {
    /// Directory on the local filesystem.
    Local(PathBuf),
    /// Ordered mirror base URLs.
    Remote(Vec<String>),
}

impl BaselineReference {
    /// Parses a directory or a comma-separated mirror list.
    ///
    /// Repeated mirrors are listed once, at their first position.
    pub fn parse(location: &str, base: &Path) -> Self {
        if is_remote(location) {
            let mut mirrors: Vec<String> = Vec::new();
            for mirror in location.split(',').map(str::trim).filter(|m| !m.is_empty()) {
                if !mirrors.iter().any(|m| m == mirror) {
                    mirrors.push(mirror.to_string());
                }
            }
            Self::Remote(mirrors)
        } else {
            Self::Local(base.join(location))
        }
    }
}

impl fmt::Display for BaselineReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(dir) => write!(f, "{}", dir.display()),
            Self::Remote(mirrors) => f.write_str(&mirrors.join(",")),
        }
    }
}

/// File name of a test's artifact (and of its baseline).
///
/// An explicit filename wins. Otherwise the short name (or the full identity
/// when configured) is used with brackets and slashes replaced by `_`, one
/// trailing `_` dropped, and the format's extension appended.
///
/// ```rust
/// use figcheck_compare::artifact_filename;
/// use figcheck_core::{RunConfig, TestIdentity, TestOptions};
///
/// let id = TestIdentity::parse("tests.test_plot.test_line[dashed/thin]").unwrap();
/// let options = RunConfig::default().resolve(&TestOptions::default()).unwrap();
/// assert_eq!(artifact_filename(&id, &options), "test_line_dashed_thin.png");
/// ```
pub fn artifact_filename(identity: &TestIdentity, options: &ResolvedOptions) -> String {
    if let Some(name) = &options.filename {
        return name.clone();
    }
    let stem = if options.use_full_test_name {
        identity.as_str()
    } else {
        identity.short_name()
    };
    let mut name: String = stem
        .chars()
        .map(|c| match c {
            '[' | ']' | '/' => '_',
            c => c,
        })
        .collect();
    if name.ends_with('_') {
        name.pop();
    }
    format!("{name}.{}", options.format.extension())
}

/// Joins a mirror base URL and a file name.
pub fn mirror_url(base: &str, filename: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{filename}")
    } else {
        format!("{base}/{filename}")
    }
}

/// Resolves and materializes baselines for one run.
pub struct BaselineResolver<'a> {
    config: &'a RunConfig,
    fetcher: &'a dyn BaselineFetcher,
}

impl<'a> BaselineResolver<'a> {
    /// Creates a resolver over a run config and a transport.
    pub fn new(config: &'a RunConfig, fetcher: &'a dyn BaselineFetcher) -> Self {
        Self { config, fetcher }
    }

    /// Baseline reference for a test defined in `test_file`.
    pub fn reference(&self, test_file: &Path, options: &ResolvedOptions) -> BaselineReference {
        let test_dir = test_file.parent().unwrap_or_else(|| Path::new("."));

        if let Some(dir) = &options.baseline_dir {
            return BaselineReference::parse(dir, test_dir);
        }
        match &self.config.baseline_path {
            Some(path) if self.config.baseline_relative && !is_remote(path) => {
                BaselineReference::Local(test_dir.join(path))
            }
            Some(path) => BaselineReference::parse(path, Path::new("")),
            None => BaselineReference::Local(test_dir.join("baseline")),
        }
    }

    /// Copies or downloads the baseline `filename` to `dest`.
    ///
    /// Returns `Ok(None)` when the baseline does not exist locally or no
    /// mirror could serve it. Transport failures on one mirror are logged and
    /// the next mirror is tried; no mirror is tried twice.
    pub fn fetch(
        &self,
        reference: &BaselineReference,
        filename: &str,
        dest: &Path,
    ) -> CompareResult<Option<PathBuf>> {
        match reference {
            BaselineReference::Local(dir) => {
                let source = dir.join(filename);
                if !source.is_file() {
                    debug!(path = %source.display(), "baseline not found");
                    return Ok(None);
                }
                copy_atomic(&source, dest)?;
                Ok(Some(dest.to_path_buf()))
            }
            BaselineReference::Remote(mirrors) => {
                for base in mirrors {
                    let url = mirror_url(base, filename);
                    match self.fetcher.fetch(&url) {
                        Ok(bytes) => {
                            write_atomic(dest, &bytes)?;
                            debug!(url, "downloaded baseline");
                            return Ok(Some(dest.to_path_buf()));
                        }
                        Err(err) => warn!("Downloading {url} failed: {err}"),
                    }
                }
                warn!(filename, "could not download baseline image from any of the available URLs");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompareError;
    use figcheck_core::{ArtifactFormat, TestOptions};
    use std::sync::Mutex;

    struct Recording {
        calls: Mutex<Vec<String>>,
        serve_from: &'static str,
    }

    impl BaselineFetcher for Recording {
        fn fetch(&self, url: &str) -> CompareResult<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.starts_with(self.serve_from) {
                Ok(b"baseline".to_vec())
            } else {
                Err(CompareError::Fetch {
                    url: url.into(),
                    reason: "connection refused".into(),
                })
            }
        }
    }

    fn resolved(options: TestOptions) -> ResolvedOptions {
        RunConfig::default().resolve(&options).unwrap()
    }

    #[test]
    fn test_filename_rules() {
        let id = TestIdentity::parse("pkg.mod.Cls.test_a[1-2]").unwrap();
        assert_eq!(artifact_filename(&id, &resolved(TestOptions::default())), "test_a_1-2.png");

        let mut full = resolved(TestOptions::default().with_format(ArtifactFormat::Svg));
        full.use_full_test_name = true;
        assert_eq!(artifact_filename(&id, &full), "pkg.mod.Cls.test_a_1-2.svg");

        let named = resolved(TestOptions::default().with_filename("custom.png"));
        assert_eq!(artifact_filename(&id, &named), "custom.png");

        let plain = TestIdentity::parse("mod.test_b").unwrap();
        assert_eq!(artifact_filename(&plain, &resolved(TestOptions::default())), "test_b.png");

        let trailing = TestIdentity::parse("mod.test_c_").unwrap();
        assert_eq!(artifact_filename(&trailing, &resolved(TestOptions::default())), "test_c.png");
        let empty_param = TestIdentity::parse("mod.test_d[a/]").unwrap();
        assert_eq!(artifact_filename(&empty_param, &resolved(TestOptions::default())), "test_d_a_.png");
    }

    #[test]
    fn test_repeated_mirrors_listed_once() {
        let reference = BaselineReference::parse(
            "https://a.invalid/b/, https://c.invalid/, https://a.invalid/b/,https://c.invalid/",
            Path::new("/proj"),
        );
        assert_eq!(
            reference,
            BaselineReference::Remote(vec!["https://a.invalid/b/".into(), "https://c.invalid/".into()])
        );

        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::default();
        let fetcher = Recording {
            calls: Mutex::new(Vec::new()),
            serve_from: "nothing",
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        let reference = BaselineReference::parse("https://a.invalid/b/,https://a.invalid/b/", Path::new("/proj"));
        let dest = dir.path().join("baseline.png");
        assert!(resolver.fetch(&reference, "test_x.png", &dest).unwrap().is_none());
        assert_eq!(*fetcher.calls.lock().unwrap(), vec!["https://a.invalid/b/test_x.png".to_string()]);
    }

    #[test]
    fn test_reference_precedence() {
        let test_file = Path::new("/proj/tests/test_plot.rs");
        let fetcher = Recording {
            calls: Mutex::new(Vec::new()),
            serve_from: "",
        };

        let config = RunConfig::default();
        let resolver = BaselineResolver::new(&config, &fetcher);
        assert_eq!(
            resolver.reference(test_file, &resolved(TestOptions::default())),
            BaselineReference::Local(PathBuf::from("/proj/tests/baseline"))
        );

        let config = RunConfig {
            baseline_path: Some("/data/baseline".into()),
            ..Default::default()
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        assert_eq!(
            resolver.reference(test_file, &resolved(TestOptions::default())),
            BaselineReference::Local(PathBuf::from("/data/baseline"))
        );

        let config = RunConfig {
            baseline_path: Some("refs".into()),
            baseline_relative: true,
            ..Default::default()
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        assert_eq!(
            resolver.reference(test_file, &resolved(TestOptions::default())),
            BaselineReference::Local(PathBuf::from("/proj/tests/refs"))
        );

        let per_test = TestOptions::default().with_baseline_dir("https://a/,https://b/");
        assert_eq!(
            resolver.reference(test_file, &config.resolve(&per_test).unwrap()),
            BaselineReference::Remote(vec!["https://a/".into(), "https://b/".into()])
        );

        let per_test = TestOptions::default().with_baseline_dir("other");
        assert_eq!(
            resolver.reference(test_file, &config.resolve(&per_test).unwrap()),
            BaselineReference::Local(PathBuf::from("/proj/tests/other"))
        );
    }

    #[test]
    fn test_local_fetch_copies() {
        let dir = tempfile::tempdir().unwrap();
        let baseline_dir = dir.path().join("baseline");
        std::fs::create_dir_all(&baseline_dir).unwrap();
        std::fs::write(baseline_dir.join("t.png"), b"png").unwrap();

        let config = RunConfig::default();
        let fetcher = Recording {
            calls: Mutex::new(Vec::new()),
            serve_from: "",
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        let reference = BaselineReference::Local(baseline_dir.clone());
        let dest = dir.path().join("results").join("baseline.png");

        let got = resolver.fetch(&reference, "t.png", &dest).unwrap();
        assert_eq!(got.as_deref(), Some(dest.as_path()));
        assert!(baseline_dir.join("t.png").exists());
        assert!(resolver.fetch(&reference, "missing.png", &dest).unwrap().is_none());
    }

    #[test]
    fn test_mirror_failover_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::default();
        let fetcher = Recording {
            calls: Mutex::new(Vec::new()),
            serve_from: "https://good",
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        let reference = BaselineReference::Remote(vec![
            "https://down.example/b/".into(),
            "https://good.example/b".into(),
            "https://never.example/b/".into(),
        ]);
        let dest = dir.path().join("baseline.png");
        assert!(resolver.fetch(&reference, "t.png", &dest).unwrap().is_some());
        assert_eq!(std::fs::read(&dest).unwrap(), b"baseline");
        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec![
                "https://down.example/b/t.png".to_string(),
                "https://good.example/b/t.png".to_string()
            ]
        );
    }

    #[test]
    fn test_all_mirrors_down_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::default();
        let fetcher = Recording {
            calls: Mutex::new(Vec::new()),
            serve_from: "nothing",
        };
        let resolver = BaselineResolver::new(&config, &fetcher);
        let reference = BaselineReference::Remote(vec!["https://a/".into(), "https://b/".into()]);
        let dest = dir.path().join("baseline.png");
        assert!(resolver.fetch(&reference, "t.png", &dest).unwrap().is_none());
        assert!(!dest.exists());
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
    }
}
