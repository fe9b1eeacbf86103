//! Summary re-render command

use crate::SummaryArgs;
use anyhow::{Context, Result};
use figcheck_core::RunConfig;
use figcheck_report::{RunSummary, generate_summaries};
use tracing::trace;

pub fn run(args: SummaryArgs, config: &RunConfig) -> Result<()> {
    trace!(input = %args.input.display(), "summary::run");
    let formats = super::summary_formats(&args.summary, config)?;

    let summary = RunSummary::read(&args.input)
        .with_context(|| format!("Failed to read summary: {}", args.input.display()))?;
    for path in generate_summaries(&summary, &args.out, &formats)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
