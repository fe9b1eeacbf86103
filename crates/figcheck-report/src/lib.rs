//! # figcheck-report
//!
//! Result aggregation and reporting for figure regression testing.
//!
//! - [`WorkerFragment`] - Per-worker results and fingerprints on disk
//! - [`merge_fragments`] / [`merge_hashes`] - Disjoint union after the run
//! - [`RunSummary`] - Ordered results plus [`Statistics`]
//! - [`html`] - Rich and basic HTML reports
//! - [`generate_summaries`] - Writes the requested report formats
//!
//! # Example
//!
//! ```rust,no_run
//! use figcheck_core::SummaryFormat;
//! use figcheck_report::{generate_summaries, merge_fragments, read_fragments};
//! use std::path::Path;
//!
//! let root = Path::new("figcheck-results");
//! let summary = merge_fragments(&read_fragments(root).unwrap()).unwrap();
//! let written = generate_summaries(&summary, root, &[SummaryFormat::Json, SummaryFormat::Html]).unwrap();
//! println!("{:?}", summary.statistics());
//! # let _ = written;
//! ```

#![warn(missing_docs)]

mod assets;
mod error;
mod fragment;
pub mod html;
mod summary;

pub use assets::{ASSETS, write_assets};
pub use error::{ReportError, ReportResult};
pub use fragment::{WorkerFragment, merge_fragments, merge_hashes, read_fragments};
pub use summary::{RunSummary, Statistics};

use figcheck_core::SummaryFormat;
use figcheck_io::write_atomic;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the JSON summary.
pub const JSON_FILE: &str = "results.json";

/// Writes each requested format into `results_dir`, returning the main file
/// of each format in request order.
///
/// The rich HTML report also writes its assets next to it.
pub fn generate_summaries(
    summary: &RunSummary,
    results_dir: &Path,
    formats: &[SummaryFormat],
) -> ReportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(results_dir)?;
    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = match format {
            SummaryFormat::Json => {
                let path = results_dir.join(JSON_FILE);
                summary.write(&path)?;
                path
            }
            SummaryFormat::Html => {
                write_assets(results_dir)?;
                let path = results_dir.join(html::HTML_FILE);
                write_atomic(&path, html::render_html(summary).as_bytes())?;
                path
            }
            SummaryFormat::BasicHtml => {
                let path = results_dir.join(html::BASIC_HTML_FILE);
                write_atomic(&path, html::render_basic_html(summary).as_bytes())?;
                path
            }
        };
        info!(format = format.name(), path = %path.display(), "wrote summary");
        written.push(path);
    }
    Ok(written)
}
