//! Temp-file-then-rename writes.
//!
//! Everything a later report pass reads (artifacts, fragments, libraries,
//! reports) goes through [`write_atomic`], so an interrupted run never leaves
//! a truncated file at a final path.

use crate::{IoError, IoResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

/// Writes `bytes` to `path` atomically, creating parent directories.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> IoResult<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| IoError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    trace!(path = %path.display(), len = bytes.len(), "wrote file");
    Ok(())
}

/// Copies `src` to `dst` atomically. The source is left in place.
pub fn copy_atomic<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> IoResult<()> {
    let bytes = std::fs::read(src.as_ref())?;
    write_atomic(dst, &bytes)
}
