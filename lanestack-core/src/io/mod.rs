//! File-backed input for the alignment stacker
//!
//! [`report`] splits BLAST-style text reports into per-read match records;
//! [`fasta`] supplies the read sequences the reports reference by name.

pub mod fasta;
pub mod report;

pub use fasta::read_sequences;
pub use report::{ReportIterator, ReportParser};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::source::SourceError;

/// Buffered text reader over a plain or gzipped file.
pub type TextReader = BufReader<Box<dyn Read>>;

/// Opens the flat-file read/match source: the report supplies the match
/// blocks, the reads file supplies the sequences they refer to. The returned
/// iterator plugs directly into the collector.
pub fn open_file_source<P: AsRef<Path>, Q: AsRef<Path>>(
    report: P,
    reads: Q,
) -> Result<ReportIterator<TextReader>, SourceError> {
    let sequences = fasta::read_sequences(reads)?;
    ReportParser::iter_file(report, sequences)
}

/// Opens a text file for reading, decompressing ".gz" paths transparently.
pub fn open_text_file<P: AsRef<Path>>(path: P) -> Result<TextReader, SourceError> {
    let file = File::open(&path)?;
    let reader: Box<dyn Read> = if path.as_ref().to_string_lossy().ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::new(reader))
}
