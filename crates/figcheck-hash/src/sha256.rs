//! Exact kernel: SHA-256 of the raw artifact bytes.

use crate::kernel::{Equivalence, Kernel, KernelOverrides};
use crate::HashResult;
use sha2::{Digest, Sha256};

/// Registry name.
pub const SHA256: &str = "sha256";

/// Any single-bit change in the artifact changes the fingerprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Kernel;

impl Kernel for Sha256Kernel {
    fn name(&self) -> &'static str {
        SHA256
    }

    fn fingerprint(&self, bytes: &[u8]) -> HashResult<String> {
        Ok(hex::encode(Sha256::digest(bytes)))
    }

    fn equivalent(&self, actual: &str, expected: &str, _overrides: &KernelOverrides) -> Equivalence {
        Equivalence::exact(actual == expected)
    }
}
