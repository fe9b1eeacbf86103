//! # figcheck-compare
//!
//! Comparison engine for figure regression testing.
//!
//! Given a rendered figure and a test identity, the engine decides whether
//! the figure matches its reference, either by pixels against a baseline
//! image, by fingerprint against a hash library, or both.
//!
//! - [`baseline`] - Artifact names, baseline references and mirror failover
//! - [`fetch`] - Pluggable transport for remote baselines
//! - [`diff`] - RMS scoring and diff images
//! - [`hash_library`] - Reading, caching and writing hash libraries
//! - [`engine`] - Mode selection and the per-test verdict
//!
//! # Example
//!
//! ```rust,no_run
//! use figcheck_compare::ComparisonEngine;
//! use figcheck_core::{RunConfig, TestIdentity, TestOptions};
//! use figcheck_io::{RasterImage, SaveOptions, png};
//! use std::path::Path;
//!
//! let engine = ComparisonEngine::from_config(RunConfig::default()).unwrap();
//! let figure = |_: &SaveOptions| png::encode(&RasterImage::filled_rgb(4, 4, [0, 0, 0]));
//! let id = TestIdentity::parse("tests.test_plot.test_black").unwrap();
//! let result = engine.compare(&id, Path::new("tests/test_plot.rs"), &TestOptions::default(), &figure);
//! println!("{}: {}", id, result.status);
//! ```

#![warn(missing_docs)]

pub mod baseline;
pub mod diff;
pub mod engine;
mod error;
pub mod fetch;
pub mod hash_library;

pub use baseline::{BaselineReference, BaselineResolver, artifact_filename};
pub use diff::{PixelOutcome, Shape};
pub use engine::{ComparisonEngine, Mode};
pub use error::{CompareError, CompareResult};
pub use fetch::{BaselineFetcher, HttpFetcher};
pub use hash_library::{HashLibrary, HashLibraryCache, load_hash_library, write_hash_library};
