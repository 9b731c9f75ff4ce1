//! BLAST-style text report parser
//!
//! Splits a multi-query report into one [`ReadRecord`] per "Query=" section,
//! with one [`MatchRecord`] per ">"-headed subject block. Only the metadata
//! the selection policy needs is parsed here (score, expect, identity); the
//! block text itself is carried verbatim for the downstream scanner.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::scan;
use crate::source::{MatchRecord, ReadRecord, SourceError};
use crate::types::first_word;

/// Parser for BLAST-style text reports.
pub struct ReportParser;

impl ReportParser {
    /// Parses a whole report from any `BufRead` source. Read sequences are
    /// looked up by name in `sequences`.
    pub fn parse_reader<R: BufRead>(
        reader: R,
        sequences: &HashMap<String, String>,
    ) -> Result<Vec<ReadRecord>, SourceError> {
        ReportIterator::new(reader, sequences.clone()).collect()
    }

    /// Parses a report file, transparently decompressing ".gz" paths.
    pub fn parse_file<P: AsRef<Path>>(
        path: P,
        sequences: &HashMap<String, String>,
    ) -> Result<Vec<ReadRecord>, SourceError> {
        let reader = super::open_text_file(path)?;
        Self::parse_reader(reader, sequences)
    }

    /// Streaming variant of [`parse_file`](Self::parse_file), for feeding the
    /// collector without materializing the whole report.
    pub fn iter_file<P: AsRef<Path>>(
        path: P,
        sequences: HashMap<String, String>,
    ) -> Result<ReportIterator<super::TextReader>, SourceError> {
        let reader = super::open_text_file(path)?;
        Ok(ReportIterator::new(reader, sequences))
    }
}

/// Iterator over the report's query sections.
pub struct ReportIterator<R: BufRead> {
    reader: R,
    sequences: HashMap<String, String>,
    /// Lookahead holding the next section's "Query=" line.
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> ReportIterator<R> {
    pub fn new(reader: R, sequences: HashMap<String, String>) -> Self {
        Self {
            reader,
            sequences,
            pending: None,
            done: false,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line)? {
            0 => Ok(None),
            _ => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
        }
    }

    fn build_read(&self, header_line: &str, lines: &[String]) -> ReadRecord {
        let header = header_line
            .trim_start()
            .strip_prefix("Query=")
            .unwrap_or("")
            .trim()
            .to_string();
        let sequence = self.sequences.get(first_word(&header)).cloned();

        let mut matches = Vec::new();
        let mut block: Option<Vec<&str>> = None;
        for line in lines {
            let trimmed = line.trim_start();
            if trimmed.starts_with('>') {
                flush_block(&mut block, &mut matches);
                block = Some(vec![line.as_str()]);
            } else if is_trailer(trimmed) {
                break;
            } else if let Some(current) = block.as_mut() {
                current.push(line.as_str());
            }
        }
        flush_block(&mut block, &mut matches);

        ReadRecord {
            header,
            sequence,
            matches,
        }
    }
}

impl<R: BufRead> Iterator for ReportIterator<R> {
    type Item = Result<ReadRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // locate the section start, either buffered or further down the file
        let header_line = match self.pending.take() {
            Some(line) => line,
            None => loop {
                match self.next_line() {
                    Ok(Some(line)) if line.trim_start().starts_with("Query=") => break line,
                    Ok(Some(_)) => continue,
                    Ok(None) => {
                        self.done = true;
                        return None;
                    }
                    Err(error) => {
                        self.done = true;
                        return Some(Err(error));
                    }
                }
            },
        };

        let mut lines = Vec::new();
        loop {
            match self.next_line() {
                Ok(Some(line)) if line.trim_start().starts_with("Query=") => {
                    self.pending = Some(line);
                    break;
                }
                Ok(Some(line)) => lines.push(line),
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }

        Some(Ok(self.build_read(&header_line, &lines)))
    }
}

/// Report trailer sections that end the last subject block.
fn is_trailer(line: &str) -> bool {
    line.starts_with("Database:")
        || line.starts_with("Lambda")
        || line.starts_with("Effective")
        || line.starts_with("Matrix:")
}

fn flush_block(block: &mut Option<Vec<&str>>, matches: &mut Vec<MatchRecord>) {
    if let Some(lines) = block.take() {
        let mut text = lines.join("\n");
        text.push('\n');
        let bit_score = parse_bit_score(&text);
        let expect = parse_expect(&text);
        let percent_identity = parse_identity(&text);
        matches.push(MatchRecord {
            text: Some(text),
            bit_score,
            expect,
            percent_identity,
        });
    }
}

fn parse_bit_score(text: &str) -> f32 {
    scan::grab_next(text, "Score =", "Score=")
        .and_then(|token| token.parse().ok())
        .unwrap_or(0.0)
}

/// Expect values may appear as "Expect = 1e-10," or "Expect(2) = e-103";
/// a bare "e-NNN" means "1e-NNN".
fn parse_expect(text: &str) -> f64 {
    let Some(at) = text.find("Expect") else {
        return 0.0;
    };
    let rest = &text[at..];
    let Some(eq) = rest.find('=') else {
        return 0.0;
    };
    let Some(token) = rest[eq + 1..].split_whitespace().next() else {
        return 0.0;
    };
    let token = token.trim_end_matches(',');
    let normalized = if token.starts_with('e') || token.starts_with('E') {
        format!("1{token}")
    } else {
        token.to_string()
    };
    normalized.parse().unwrap_or(0.0)
}

/// "Identities = 45/50 (90%)" parsed from the fraction, not the rounded
/// percentage.
fn parse_identity(text: &str) -> f32 {
    let Some(token) = scan::grab_next(text, "Identities =", "Identities=") else {
        return 0.0;
    };
    let Some((hits, total)) = token.split_once('/') else {
        return 0.0;
    };
    match (hits.parse::<f32>(), total.parse::<f32>()) {
        (Ok(hits), Ok(total)) if total > 0.0 => 100.0 * hits / total,
        _ => 0.0,
    }
}
