//! Stack command implementation - build per-reference alignments from a
//! report and the read sequences.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use lanestack_core::io::open_file_source;
use lanestack_core::types::first_word;
use lanestack_core::{
    assemble_reference, Alignment, MatchCollector, StackConfig, ThresholdSelector,
};

use crate::config::Config;
use crate::progress::BarProgress;
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &Config,
    report: PathBuf,
    reads: PathBuf,
    out: Option<PathBuf>,
    format: OutputFormat,
    min_reads: Option<usize>,
    identity_filter: bool,
    no_insertions: bool,
    min_score: Option<f32>,
    top_percent: Option<f32>,
    max_expect: Option<f64>,
    min_identity: Option<f32>,
) -> Result<()> {
    log::info!("Report file: {}", report.display());
    log::info!("Read file:   {}", reads.display());

    if !report.exists() {
        return Err(anyhow!("Report file does not exist: {}", report.display()));
    }
    if !reads.exists() {
        return Err(anyhow!("Read file does not exist: {}", reads.display()));
    }

    let stack_config = StackConfig {
        min_reads: min_reads.unwrap_or(config.stack.min_reads),
        identity_filter: identity_filter || config.stack.identity_filter,
        show_insertions: !no_insertions && config.stack.show_insertions,
    };
    let selector = ThresholdSelector {
        min_score: min_score.unwrap_or(config.select.min_score),
        top_percent: top_percent.unwrap_or(config.select.top_percent),
        max_expect: max_expect.unwrap_or(config.select.max_expect),
        min_identity: min_identity.unwrap_or(config.select.min_identity),
    };

    let source = open_file_source(&report, &reads)
        .with_context(|| format!("Failed to open report {}", report.display()))?;

    let mut progress = BarProgress::new(!log::log_enabled!(log::Level::Info));
    let mut collector = MatchCollector::new(stack_config);
    collector
        .collect(source, &selector, &mut progress)
        .context("Failed to collect matches from the report")?;

    if let Some(dir) = out.as_ref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let references: Vec<String> = collector.references().map(String::from).collect();
    let mut used_names: HashMap<String, usize> = HashMap::new();
    let mut alignment = Alignment::new();
    let mut total_rows = 0usize;
    let mut total_errors = 0usize;

    for reference in &references {
        let stats = assemble_reference(&collector, reference, &mut alignment, &mut progress)
            .map_err(|_| anyhow!("Cancelled"))?;
        total_rows += stats.rows_out;
        total_errors += stats.errors;

        match out.as_ref() {
            Some(dir) => {
                let path = dir.join(output_file_name(reference, format, &mut used_names));
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                write_alignment(&mut writer, &alignment, format)?;
                log::debug!("Wrote {}", path.display());
            }
            None => {
                let stdout = std::io::stdout();
                let mut writer = stdout.lock();
                write_alignment(&mut writer, &alignment, format)?;
                writeln!(writer)?;
            }
        }
    }
    progress.finish();

    log::info!("References written: {}", references.len());
    log::info!("Rows stacked:       {total_rows}");
    if total_errors > 0 {
        log::warn!("Rows skipped due to errors: {total_errors}");
    }

    Ok(())
}

/// A filesystem-safe, collision-free file name for one reference.
fn output_file_name(
    reference: &str,
    format: OutputFormat,
    used: &mut HashMap<String, usize>,
) -> String {
    let base: String = first_word(reference.trim_start_matches('>'))
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' { ch } else { '_' })
        .take(80)
        .collect();
    let base = if base.is_empty() { "reference".to_string() } else { base };

    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    let stem = if *count == 1 {
        base
    } else {
        format!("{base}.{count}")
    };
    let extension = match format {
        OutputFormat::Text => "aln.txt",
        OutputFormat::Fasta => "aln.fasta",
        OutputFormat::Json => "aln.json",
    };
    format!("{stem}.{extension}")
}

fn write_alignment<W: Write>(
    writer: &mut W,
    alignment: &Alignment,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(writer, alignment),
        OutputFormat::Fasta => write_fasta(writer, alignment),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, alignment)
                .context("Failed to serialize alignment")?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

/// Name-prefixed rows, every row padded to the alignment's full width.
fn write_text<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    writeln!(writer, "{}", alignment.name())?;

    let width = alignment.length();
    let name_width = alignment
        .lanes()
        .iter()
        .map(|lane| lane.name().len())
        .chain([REFERENCE_LABEL.len()])
        .max()
        .unwrap_or(0);

    if let Some(original) = alignment.original_reference() {
        writeln!(writer, "{:name_width$}  {}", "Original", original)?;
    }
    if let Some(reference) = alignment.reference() {
        let row = pad_row(&reference.to_padded_string(), width);
        writeln!(writer, "{REFERENCE_LABEL:name_width$}  {row}")?;
    }
    for lane in alignment.lanes() {
        let row = pad_row(&lane.to_padded_string(), width);
        writeln!(writer, "{:name_width$}  {row}", lane.name())?;
    }
    Ok(())
}

/// One gapped FASTA record per row, reference first.
fn write_fasta<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    let width = alignment.length();
    if let Some(reference) = alignment.reference() {
        writeln!(writer, ">{}", alignment.name().trim_start_matches('>'))?;
        writeln!(writer, "{}", pad_row(&reference.to_padded_string(), width))?;
    }
    for lane in alignment.lanes() {
        writeln!(writer, ">{}", lane.name())?;
        writeln!(writer, "{}", pad_row(&lane.to_padded_string(), width))?;
    }
    Ok(())
}

const REFERENCE_LABEL: &str = "Reference";

fn pad_row(row: &str, width: usize) -> String {
    let mut padded = row.to_string();
    while padded.len() < width {
        padded.push('-');
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alignment() -> Alignment {
        let mut alignment = Alignment::new();
        alignment.set_name(">refA description");
        alignment.set_reference(">refA description", "ABCDE".to_string());
        alignment.add_sequence(
            "read1".to_string(),
            String::new(),
            None,
            String::new(),
            2,
            "CDE".to_string(),
            0,
            String::new(),
        );
        alignment
    }

    #[test]
    fn test_write_text_pads_rows() {
        let mut out = Vec::new();
        write_text(&mut out, &sample_alignment()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">refA description");
        assert!(lines[1].starts_with("Reference"));
        assert!(lines[1].ends_with("ABCDE"));
        assert!(lines[2].starts_with("read1"));
        assert!(lines[2].ends_with("--CDE"));
    }

    #[test]
    fn test_write_fasta() {
        let mut out = Vec::new();
        write_fasta(&mut out, &sample_alignment()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">refA description\nABCDE\n>read1\n--CDE\n");
    }

    #[test]
    fn test_output_file_name_sanitizes_and_dedups() {
        let mut used = HashMap::new();
        let first = output_file_name(">gi|123|ref A", OutputFormat::Text, &mut used);
        assert_eq!(first, "gi_123_ref.aln.txt");
        let second = output_file_name(">gi|123|ref B", OutputFormat::Text, &mut used);
        assert_eq!(second, "gi_123_ref.2.aln.txt");
    }

    #[test]
    fn test_missing_report_is_an_error() {
        let config = Config::default();
        let result = execute(
            &config,
            PathBuf::from("/no/such/report.blast"),
            PathBuf::from("/no/such/reads.fasta"),
            None,
            OutputFormat::Text,
            None,
            false,
            false,
            None,
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }
}
