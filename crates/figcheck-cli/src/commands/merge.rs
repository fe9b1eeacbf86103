//! Fragment merge command

use crate::MergeArgs;
use anyhow::{Context, Result, bail};
use figcheck_compare::write_hash_library;
use figcheck_core::RunConfig;
use figcheck_report::{generate_summaries, merge_fragments, merge_hashes, read_fragments};
use tracing::{info, trace};

pub fn run(args: MergeArgs, config: &RunConfig) -> Result<()> {
    trace!(dir = %args.results_dir.display(), "merge::run");
    let formats = super::summary_formats(&args.summary, config)?;

    let fragments = read_fragments(&args.results_dir)
        .with_context(|| format!("Failed to read fragments in {}", args.results_dir.display()))?;
    if fragments.is_empty() {
        bail!("No worker fragments found in {}", args.results_dir.display());
    }

    let summary = merge_fragments(&fragments).context("Failed to merge results")?;
    let stats = summary.statistics();
    println!(
        "{} tests from {} workers: {} passed, {} failed, {} skipped",
        stats.total,
        fragments.len(),
        stats.passed,
        stats.failed,
        stats.skipped
    );
    if stats.hash_disagreements + stats.image_disagreements > 0 {
        println!(
            "  hash and image disagree on {} tests",
            stats.hash_disagreements + stats.image_disagreements
        );
    }

    for path in generate_summaries(&summary, &args.results_dir, &formats)? {
        println!("Wrote {}", path.display());
    }

    let target = args.hash_library.as_ref().or(config.generate_hash_library.as_ref());
    if let Some(target) = target {
        let hashes = merge_hashes(&fragments).context("Failed to merge hashes")?;
        write_hash_library(target, &hashes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!(entries = hashes.len(), path = %target.display(), "wrote merged hash library");
        println!("Wrote {} ({} hashes)", target.display(), hashes.len());
    }
    Ok(())
}
