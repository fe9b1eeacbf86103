//! Deterministic rendering.
//!
//! Renderers embed values that change between otherwise identical renders:
//! tool versions, creation dates, per-run salts. When determinism is enabled
//! [`render_normalized`] pins those fields for the chosen format so the same
//! logical figure always serializes to the same bytes.
//!
//! Some renderers only honor the `SOURCE_DATE_EPOCH` environment variable.
//! [`EnvGuard`] sets it for the duration of one render under a process-wide
//! lock and restores the previous value on drop, including during unwinding.
//!
//! # Example
//!
//! ```rust
//! use figcheck_io::normalize::DeterministicPolicy;
//!
//! let d = DeterministicPolicy { per_test: None, run: None, hash_in_play: true }.resolve();
//! assert!(d.enabled);
//! assert!(d.ambiguous);
//!
//! let d = DeterministicPolicy { per_test: Some(false), run: Some(true), hash_in_play: true }.resolve();
//! assert!(!d.enabled);
//! assert!(!d.ambiguous);
//! ```

use crate::{Figure, IoResult, SaveOptions, png};
use figcheck_core::ArtifactFormat;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Reproducible-builds timestamp variable.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Timestamp pinned into page-description formats.
pub const PINNED_EPOCH: &str = "1680254601";

/// Fixed salt for generated identifiers and creator strings.
pub const HASH_SALT: &str = "figcheck";

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Inputs to the determinism decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeterministicPolicy {
    /// Explicit per-test setting.
    pub per_test: Option<bool>,
    /// Explicit run-level setting.
    pub run: Option<bool>,
    /// Whether a fingerprint comparison or hash generation will use the bytes.
    pub hash_in_play: bool,
}

/// Outcome of the determinism decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Determinism {
    /// Pin metadata while rendering.
    pub enabled: bool,
    /// Nothing was explicit although fingerprints depend on the output.
    pub ambiguous: bool,
}

impl DeterministicPolicy {
    /// Per-test > run > inferred (on exactly when hashes are in play).
    pub fn resolve(&self) -> Determinism {
        match self.per_test.or(self.run) {
            Some(enabled) => Determinism {
                enabled,
                ambiguous: false,
            },
            None => Determinism {
                enabled: self.hash_in_play,
                ambiguous: self.hash_in_play,
            },
        }
    }
}

/// Fields pinned for one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedMetadata {
    /// Metadata keys and their pinned values (`None` omits the key).
    pub metadata: Vec<(&'static str, Option<&'static str>)>,
    /// Environment variable set while rendering.
    pub env: Option<(&'static str, &'static str)>,
    /// Salt for generated identifiers.
    pub hashsalt: Option<&'static str>,
}

impl PinnedMetadata {
    /// Keys pinned to `None`.
    pub fn omitted_keys(&self) -> Vec<&'static str> {
        self.metadata
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect()
    }
}

/// Fields that vary between renders of `format`.
pub fn pinned_metadata(format: ArtifactFormat) -> PinnedMetadata {
    match format {
        ArtifactFormat::Png => PinnedMetadata {
            metadata: vec![("Software", None)],
            env: None,
            hashsalt: None,
        },
        ArtifactFormat::Pdf => PinnedMetadata {
            metadata: vec![("Creator", None), ("Producer", None), ("CreationDate", None)],
            env: Some((SOURCE_DATE_EPOCH, PINNED_EPOCH)),
            hashsalt: None,
        },
        ArtifactFormat::Eps => PinnedMetadata {
            metadata: vec![("Creator", Some(HASH_SALT))],
            env: Some((SOURCE_DATE_EPOCH, PINNED_EPOCH)),
            hashsalt: None,
        },
        ArtifactFormat::Svg => PinnedMetadata {
            metadata: vec![("Date", None)],
            env: None,
            hashsalt: Some(HASH_SALT),
        },
    }
}

/// Renders `figure`, pinning variable fields when `determinism.enabled`.
///
/// With determinism on, pinned keys override the caller's metadata. PNG
/// output is additionally scrubbed of text chunks whose keyword is pinned
/// to `None`, for renderers that ignore the metadata request.
pub fn render_normalized(
    figure: &dyn Figure,
    options: &SaveOptions,
    determinism: Determinism,
) -> IoResult<Vec<u8>> {
    if !determinism.enabled {
        return figure.render(options);
    }

    let pinned = pinned_metadata(options.format);
    let mut options = options.clone();
    for (key, value) in &pinned.metadata {
        options
            .metadata
            .insert(key.to_string(), value.map(str::to_string));
    }
    if let Some(salt) = pinned.hashsalt {
        options.hashsalt = Some(salt.to_string());
    }
    debug!(format = %options.format, "rendering with pinned metadata");

    let bytes = {
        let _guard = pinned.env.map(|(key, value)| EnvGuard::set(key, value));
        figure.render(&options)?
    };

    if options.format == ArtifactFormat::Png {
        let omitted = pinned.omitted_keys();
        return png::strip_text_chunks(&bytes, &omitted);
    }
    Ok(bytes)
}

/// Scoped environment variable.
///
/// Holds a process-wide lock for its lifetime, so concurrent renders in one
/// process never observe each other's value. Not reentrant: creating a second
/// guard on the same thread while one is alive deadlocks.
pub struct EnvGuard {
    key: String,
    previous: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets `key` to `value` until the guard is dropped.
    pub fn set(key: &str, value: &str) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::env::var_os(key);
        // SAFETY: every mutation made through EnvGuard happens under ENV_LOCK.
        unsafe { std::env::set_var(key, value) };
        trace!(key, value, "pinned environment variable");
        Self {
            key: key.to_string(),
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: ENV_LOCK is still held; it is released after this body runs.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(&self.key, value),
                None => std::env::remove_var(&self.key),
            }
        }
    }
}
