//! Kernel registry.

use crate::kernel::{Kernel, KernelParams};
use crate::phash::{PHASH, PHashKernel};
use crate::sha256::{SHA256, Sha256Kernel};
use crate::{HashError, HashResult};
use tracing::debug;

/// Registered kernel names.
pub const KERNEL_NAMES: [&str; 2] = [PHASH, SHA256];

/// Kernel used when none is configured.
pub const DEFAULT_KERNEL: &str = SHA256;

/// Builds the kernel registered as `name`.
///
/// Unknown names fail here, at setup, never during a comparison.
///
/// ```rust
/// use figcheck_hash::{KernelParams, kernel_from_name};
///
/// let kernel = kernel_from_name("phash", &KernelParams::default()).unwrap();
/// assert_eq!(kernel.name(), "phash");
/// assert!(kernel_from_name("md5", &KernelParams::default()).is_err());
/// ```
pub fn kernel_from_name(name: &str, params: &KernelParams) -> HashResult<Box<dyn Kernel>> {
    debug!(kernel = name, ?params, "constructing hash kernel");
    match name {
        PHASH => Ok(Box::new(PHashKernel::new(
            params.hash_size,
            params.high_freq_factor,
            params.hamming_tolerance,
        )?)),
        SHA256 => Ok(Box::new(Sha256Kernel)),
        _ => Err(HashError::UnknownKernel {
            name: name.to_string(),
            available: KERNEL_NAMES.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_name_builds() {
        for name in KERNEL_NAMES {
            let kernel = kernel_from_name(name, &KernelParams::default()).unwrap();
            assert_eq!(kernel.name(), name);
        }
    }

    #[test]
    fn test_unknown_lists_available() {
        let err = kernel_from_name("PHASH", &KernelParams::default()).err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("PHASH"));
        assert!(msg.contains("phash, sha256"));
    }

    #[test]
    fn test_bad_params_fail_at_setup() {
        let params = KernelParams {
            hash_size: 0,
            ..KernelParams::default()
        };
        assert!(kernel_from_name("phash", &params).is_err());
        assert!(kernel_from_name("sha256", &params).is_ok());
    }
}
