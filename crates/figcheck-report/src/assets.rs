//! Static report assets, embedded at build time.

use crate::ReportResult;
use figcheck_io::write_atomic;
use std::path::{Path, PathBuf};

/// `(file name, contents)` of every asset the rich report references.
pub const ASSETS: &[(&str, &str)] = &[
    ("styles.css", include_str!("../assets/styles.css")),
    ("extra.js", include_str!("../assets/extra.js")),
    ("hash.svg", include_str!("../assets/hash.svg")),
    ("image.svg", include_str!("../assets/image.svg")),
];

/// Copies the assets into `dir`, returning the written paths.
pub fn write_assets(dir: &Path) -> ReportResult<Vec<PathBuf>> {
    ASSETS
        .iter()
        .map(|(name, contents)| {
            let path = dir.join(name);
            write_atomic(&path, contents.as_bytes())?;
            Ok(path)
        })
        .collect()
}
