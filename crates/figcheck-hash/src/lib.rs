//! # figcheck-hash
//!
//! Fingerprint kernels for figure regression testing.
//!
//! A kernel reduces an encoded artifact to a hex fingerprint that can be
//! stored in a hash library and compared on later runs:
//!
//! - [`Sha256Kernel`] (`sha256`) - exact; any changed byte changes the hash
//! - [`PHashKernel`] (`phash`) - perceptual; similar images hash a few bits apart
//!
//! Kernels are chosen by name through [`kernel_from_name`].
//!
//! # Example
//!
//! ```rust
//! use figcheck_hash::{KernelOverrides, KernelParams, kernel_from_name};
//!
//! let kernel = kernel_from_name("sha256", &KernelParams::default()).unwrap();
//! let a = kernel.fingerprint(b"artifact").unwrap();
//! let outcome = kernel.equivalent(&a, &a, &KernelOverrides::default());
//! assert!(outcome.equivalent);
//! ```

#![warn(missing_docs)]

pub mod dct;
mod error;
pub mod kernel;
pub mod phash;
mod registry;
pub mod resize;
pub mod sha256;

pub use error::{HashError, HashResult};
pub use kernel::{Equivalence, Kernel, KernelOverrides, KernelParams};
pub use phash::PHashKernel;
pub use registry::{DEFAULT_KERNEL, KERNEL_NAMES, kernel_from_name};
pub use sha256::Sha256Kernel;
