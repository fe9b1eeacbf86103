//! Baseline fetching.
//!
//! Remote baselines are fetched through the [`BaselineFetcher`] trait so the
//! transport can be swapped out (tests use in-memory fetchers). The default
//! [`HttpFetcher`] speaks HTTP(S) via `ureq` and also reads `file://` URLs.

use crate::{CompareError, CompareResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fetches raw bytes for a URL.
pub trait BaselineFetcher: Send + Sync {
    /// Fetches the full body at `url`.
    fn fetch(&self, url: &str) -> CompareResult<Vec<u8>>;
}

impl<T: BaselineFetcher + ?Sized> BaselineFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> CompareResult<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Whether `location` names a remote mirror rather than a directory.
pub fn is_remote(location: &str) -> bool {
    let location = location.trim_start();
    location.starts_with("http://") || location.starts_with("https://") || location.starts_with("file://")
}

/// Blocking HTTP(S) and `file://` fetcher.
///
/// # Example
///
/// ```rust
/// use figcheck_compare::HttpFetcher;
/// use std::time::Duration;
///
/// let fetcher = HttpFetcher::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_max_size(8 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
    max_size: usize,
}

impl HttpFetcher {
    /// Creates a fetcher with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the maximum body size in bytes.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    fn fetch_http(&self, url: &str) -> CompareResult<Vec<u8>> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        let fail = |reason: String| CompareError::Fetch {
            url: url.to_string(),
            reason,
        };
        let mut response = agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| fail(e.to_string()))?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_size as u64)
            .read_to_vec()
            .map_err(|e| fail(e.to_string()))?;
        if bytes.is_empty() {
            return Err(fail("empty response body".into()));
        }
        debug!(url, len = bytes.len(), "fetched baseline");
        Ok(bytes)
    }

    fn fetch_file(&self, url: &str) -> CompareResult<Vec<u8>> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read(path).map_err(|e| CompareError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("figcheck/", env!("CARGO_PKG_VERSION")).to_string(),
            max_size: 64 * 1024 * 1024,
        }
    }
}

impl BaselineFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> CompareResult<Vec<u8>> {
        if url.starts_with("file://") {
            self.fetch_file(url)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url)
        } else {
            Err(CompareError::Fetch {
                url: url.to_string(),
                reason: "unsupported URL scheme".into(),
            })
        }
    }
}
