//! CLI command implementations

pub mod compare;
pub mod hash;
pub mod merge;
pub mod summary;

use anyhow::{Context, Result};
use figcheck_core::{RunConfig, SummaryFormat};

/// Summary formats from the command line, else the config, else json + html.
pub fn summary_formats(requested: &[String], config: &RunConfig) -> Result<Vec<SummaryFormat>> {
    let source = if requested.is_empty() {
        config.clone()
    } else {
        RunConfig {
            summary: requested.to_vec(),
            ..config.clone()
        }
    };
    let formats = source
        .summary_formats()
        .context("Unsupported summary format")?;
    if formats.is_empty() {
        return Ok(vec![SummaryFormat::Json, SummaryFormat::Html]);
    }
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_format_precedence() {
        let config = RunConfig {
            summary: vec!["basic-html".into()],
            ..Default::default()
        };
        assert_eq!(
            summary_formats(&[], &config).unwrap(),
            vec![SummaryFormat::BasicHtml]
        );
        assert_eq!(
            summary_formats(&["json".into()], &config).unwrap(),
            vec![SummaryFormat::Json]
        );
        assert_eq!(
            summary_formats(&[], &RunConfig::default()).unwrap(),
            vec![SummaryFormat::Json, SummaryFormat::Html]
        );
        assert!(summary_formats(&["pdf".into()], &config).is_err());
    }
}
