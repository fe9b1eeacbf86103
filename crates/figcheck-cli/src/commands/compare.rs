//! Image compare command

use crate::CompareArgs;
use anyhow::{Context, Result, bail};
use figcheck_compare::{PixelOutcome, diff::compare_files};
use figcheck_core::RunConfig;
use tracing::{debug, trace};

pub fn run(args: CompareArgs, config: &RunConfig, verbose: u8) -> Result<()> {
    trace!(baseline = %args.baseline.display(), result = %args.result.display(), "compare::run");
    let tolerance = args.tolerance.unwrap_or(config.default_tolerance);

    // Without --diff the diff image goes to a scratch file that is dropped.
    let scratch;
    let diff_path = match &args.diff {
        Some(path) => path.clone(),
        None => {
            scratch = tempfile::Builder::new()
                .prefix("figcheck-diff-")
                .suffix(".png")
                .tempfile()
                .context("Failed to create scratch diff file")?;
            scratch.path().to_path_buf()
        }
    };

    let outcome = compare_files(&args.baseline, &args.result, tolerance, &diff_path)
        .with_context(|| {
            format!(
                "Failed to compare {} and {}",
                args.baseline.display(),
                args.result.display()
            )
        })?;

    println!("Comparing {} vs {}", args.baseline.display(), args.result.display());
    match outcome {
        PixelOutcome::ShapeMismatch { expected, actual } => {
            bail!("FAIL: Image dimensions did not match: expected {expected}, got {actual}");
        }
        PixelOutcome::Within { rms } => {
            println!("  RMS difference: {rms:.6}");
            println!("  Tolerance:      {tolerance}");
            println!("PASS");
            Ok(())
        }
        PixelOutcome::Exceeds { rms } => {
            println!("  RMS difference: {rms:.6}");
            println!("  Tolerance:      {tolerance}");
            if args.diff.is_some() {
                debug!(path = %diff_path.display(), "wrote diff image");
                if verbose > 0 {
                    println!("Difference image saved to {}", diff_path.display());
                }
            }
            bail!("FAIL: RMS {rms} exceeds tolerance {tolerance}");
        }
    }
}
