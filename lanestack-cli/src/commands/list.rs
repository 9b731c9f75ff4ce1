//! List command implementation - show the references a report would stack.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use lanestack_core::io::open_file_source;
use lanestack_core::{MatchCollector, StackConfig, ThresholdSelector};

use crate::config::Config;
use crate::progress::BarProgress;

pub fn execute(
    config: &Config,
    report: PathBuf,
    reads: PathBuf,
    min_reads: Option<usize>,
) -> Result<()> {
    if !report.exists() {
        return Err(anyhow!("Report file does not exist: {}", report.display()));
    }
    if !reads.exists() {
        return Err(anyhow!("Read file does not exist: {}", reads.display()));
    }

    let stack_config = StackConfig {
        min_reads: min_reads.unwrap_or(config.stack.min_reads),
        identity_filter: config.stack.identity_filter,
        show_insertions: config.stack.show_insertions,
    };
    let selector = ThresholdSelector {
        min_score: config.select.min_score,
        top_percent: config.select.top_percent,
        max_expect: config.select.max_expect,
        min_identity: config.select.min_identity,
    };

    let source = open_file_source(&report, &reads)
        .with_context(|| format!("Failed to open report {}", report.display()))?;

    let mut progress = BarProgress::new(!log::log_enabled!(log::Level::Info));
    let mut collector = MatchCollector::new(stack_config);
    let stats = collector
        .collect(source, &selector, &mut progress)
        .context("Failed to collect matches from the report")?;
    progress.finish();

    println!("{:>6}  {:>7}  reference", "reads", "flavor");
    for reference in collector.references() {
        println!(
            "{:>6}  {:>7}  {}",
            collector.row_count(reference),
            collector.flavor(),
            reference
        );
    }
    println!(
        "{} references, {} of {} reads used",
        stats.references, stats.reads_used, stats.reads_seen
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_report_is_an_error() {
        let config = Config::default();
        let result = execute(
            &config,
            PathBuf::from("/no/such/report.blast"),
            PathBuf::from("/no/such/reads.fasta"),
            None,
        );
        assert!(result.is_err());
    }
}
