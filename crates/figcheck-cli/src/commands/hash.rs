//! Fingerprint command

use crate::HashArgs;
use anyhow::{Context, Result, bail};
use figcheck_core::RunConfig;
use figcheck_hash::{KernelParams, kernel_from_name};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{info, trace};

pub fn run(args: HashArgs, config: &RunConfig) -> Result<()> {
    trace!(inputs = args.input.len(), "hash::run");

    let mut params = KernelParams::from_config(config);
    if let Some(n) = args.hash_size {
        params.hash_size = n;
    }
    if let Some(f) = args.high_freq_factor {
        params.high_freq_factor = f;
    }
    let name = args.kernel.as_deref().unwrap_or(&config.kernel);
    let kernel = kernel_from_name(name, &params)?;

    let files = expand_inputs(&args.input)?;
    info!(files = files.len(), kernel = kernel.name(), "hashing artifacts");

    let hashes: Vec<Result<String>> = files
        .par_iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            kernel
                .fingerprint(&bytes)
                .with_context(|| format!("Failed to hash: {}", path.display()))
        })
        .collect();

    let mut failed = 0;
    for (path, hash) in files.iter().zip(hashes) {
        match hash {
            Ok(hash) => println!("{hash}  {}", path.display()),
            Err(err) => {
                eprintln!("{err:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} artifacts could not be hashed", files.len());
    }
    Ok(())
}

/// Expands glob patterns; plain paths pass through unchanged.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            files.push(PathBuf::from(input));
            continue;
        }
        let matched: Vec<PathBuf> = glob::glob(input)
            .with_context(|| format!("Invalid pattern: {input}"))?
            .filter_map(|r| r.ok())
            .collect();
        if matched.is_empty() {
            bail!("No files match pattern: {input}");
        }
        files.extend(matched);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        let pattern = format!("{}/*.png", dir.path().display());
        let files = expand_inputs(&[pattern, "plain.png".into()]).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[2], PathBuf::from("plain.png"));

        let missing = format!("{}/*.svg", dir.path().display());
        assert!(expand_inputs(&[missing]).is_err());
    }
}
