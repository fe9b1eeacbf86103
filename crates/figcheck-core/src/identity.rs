//! Test identities.
//!
//! A [`TestIdentity`] is the globally unique key of a test case:
//! `module[.Class].function[params]`. It joins baseline images, hash library
//! entries, generated artifacts and report rows, so it must be stable across
//! runs of the same suite revision.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Hex digits of the raw-key digest appended to altered directory names.
const DIGEST_SUFFIX_LEN: usize = 12;

/// Stable unique key of a test case.
///
/// # Example
///
/// ```rust
/// use figcheck_core::TestIdentity;
///
/// let id = TestIdentity::new("tests.test_plot", Some("TestLines"), "test_line")
///     .with_params("dashed-1.5");
/// assert_eq!(id.as_str(), "tests.test_plot.TestLines.test_line[dashed-1.5]");
/// assert_eq!(id.short_name(), "test_line[dashed-1.5]");
/// assert_eq!(id.module(), "tests.test_plot.TestLines");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestIdentity(String);

impl TestIdentity {
    /// Builds an identity from its module, optional class and function name.
    pub fn new(module: &str, class: Option<&str>, function: &str) -> Self {
        let mut key = String::with_capacity(module.len() + function.len() + 16);
        if !module.is_empty() {
            key.push_str(module);
            key.push('.');
        }
        if let Some(class) = class.filter(|c| !c.is_empty()) {
            key.push_str(class);
            key.push('.');
        }
        key.push_str(function);
        Self(key)
    }

    /// Parses an identity from its full string form.
    pub fn parse(key: impl Into<String>) -> CoreResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CoreError::InvalidIdentity("empty test identity".into()));
        }
        if key.chars().any(|c| c == '\n' || c == '\r') {
            return Err(CoreError::InvalidIdentity(format!(
                "line break in test identity {key:?}"
            )));
        }
        Ok(Self(key))
    }

    /// Appends a parametrization suffix (`name[params]`).
    pub fn with_params(mut self, params: &str) -> Self {
        self.0.push('[');
        self.0.push_str(params);
        self.0.push(']');
        self
    }

    /// The full key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Function name including the parametrization suffix.
    pub fn short_name(&self) -> &str {
        match self.split_point() {
            Some(dot) => &self.0[dot + 1..],
            None => &self.0,
        }
    }

    /// Function name without the parametrization suffix.
    pub fn function(&self) -> &str {
        let short = self.short_name();
        match short.find('[') {
            Some(bracket) => &short[..bracket],
            None => short,
        }
    }

    /// Everything before the function name (module and class).
    pub fn module(&self) -> &str {
        match self.split_point() {
            Some(dot) => &self.0[..dot],
            None => "",
        }
    }

    /// Path-safe form of the full key, used for per-test result directories.
    ///
    /// Distinct identities always map to distinct names: when sanitizing
    /// changes the key, or would yield `.` or `..`, a digest of the raw key is
    /// appended.
    ///
    /// ```rust
    /// use figcheck_core::TestIdentity;
    ///
    /// let plain = TestIdentity::parse("mod.test_x").unwrap();
    /// assert_eq!(plain.sanitized(), "mod.test_x");
    ///
    /// let a = TestIdentity::parse("mod.test_p[a/b]").unwrap();
    /// let b = TestIdentity::parse("mod.test_p[a_b]").unwrap();
    /// assert!(a.sanitized().starts_with("mod.test_p_a_b-"));
    /// assert_ne!(a.sanitized(), b.sanitized());
    /// ```
    pub fn sanitized(&self) -> String {
        let name = sanitize_name(&self.0);
        if name == self.0 && name != "." && name != ".." {
            return name;
        }
        let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
        format!("{name}-{}", &digest[..DIGEST_SUFFIX_LEN])
    }

    /// Last `.` that is not inside the parametrization brackets.
    fn split_point(&self) -> Option<usize> {
        let head_end = self.0.find('[').unwrap_or(self.0.len());
        self.0[..head_end].rfind('.')
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TestIdentity {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for TestIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replaces characters that are unsafe in file names.
///
/// Parametrization brackets become `_`, path separators become `_`, and a
/// trailing `_` left behind by a closing bracket is dropped.
///
/// ```rust
/// use figcheck_core::sanitize_name;
///
/// assert_eq!(sanitize_name("test_a[1/2]"), "test_a_1_2");
/// assert_eq!(sanitize_name("plain"), "plain");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.ends_with(']') {
        out.pop();
    }
    out
}
