//! Integration tests for figcheck crates.
//!
//! End-to-end runs of the comparison engine against synthetic figures, plus
//! the run-level properties: determinism, merge correctness and report
//! stability. Shared fixtures live in [`fixtures`].

pub mod fixtures;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
