//! # figcheck-core
//!
//! Core types for figure regression testing.
//!
//! This crate provides the data model shared by every other figcheck crate:
//!
//! - [`TestIdentity`] - Stable key joining baselines, hashes and report rows
//! - [`ArtifactFormat`] - Supported output formats of a rendered figure
//! - [`Status`], [`SubStatus`] - Overall and per-method comparison outcomes
//! - [`ComparisonResult`] - The per-test outcome record
//! - [`RunConfig`], [`TestOptions`] - Run-wide and per-test configuration
//!
//! ## Crate Structure
//!
//! ```text
//! figcheck-core (this crate)
//!    ^
//!    |
//!    +-- figcheck-io (formats, normalizer, atomic writes)
//!    +-- figcheck-hash (fingerprint kernels)
//!    +-- figcheck-compare (baselines, comparison engine)
//!    +-- figcheck-report (fragments, merge, JSON/HTML summaries)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod format;
pub mod identity;
pub mod result;
pub mod status;

pub use config::{
    CONFIG_ENV, DEFAULT_TOLERANCE, MAX_HASH_SIZE, MAX_PHASH_SIDE, ResolvedOptions, RunConfig,
    SummaryFormat, TestOptions,
};
pub use error::{CoreError, CoreResult};
pub use format::ArtifactFormat;
pub use identity::{TestIdentity, sanitize_name};
pub use result::{ComparisonResult, KernelSummary};
pub use status::{Status, SubStatus};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{ResolvedOptions, RunConfig, SummaryFormat, TestOptions};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::format::ArtifactFormat;
    pub use crate::identity::TestIdentity;
    pub use crate::result::{ComparisonResult, KernelSummary};
    pub use crate::status::{Status, SubStatus};
}
