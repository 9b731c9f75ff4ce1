//! Unified types shared across the lanestack core.

use serde::{Deserialize, Serialize};

/// Which molecule-type combination a run's match reports represent.
///
/// Detected once from the first parseable match text of a collection pass and
/// locked for the remainder of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    /// Nucleotide reads aligned against a protein reference (BLASTX-style).
    TranslatedNucleotide,
    /// Protein reads against a protein reference (BLASTP-style).
    Protein,
    /// Nucleotide reads against a nucleotide reference (BLASTN-style).
    Nucleotide,
    /// Not yet determined, or undeterminable.
    Unknown,
}

impl Flavor {
    /// Alignment slots consumed per aligned column: 3 nucleotide positions
    /// per translated residue, 1 otherwise.
    pub fn codon_unit(self) -> usize {
        match self {
            Flavor::TranslatedNucleotide => 3,
            _ => 1,
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Flavor::TranslatedNucleotide => "translated-nucleotide",
            Flavor::Protein => "protein",
            Flavor::Nucleotide => "nucleotide",
            Flavor::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Molecule type of one side of the stacked alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoleculeType {
    Dna,
    Protein,
    /// Nucleotide-derived display of reads aligned at protein resolution.
    CDna,
}

/// Caller-supplied configuration for a collection/build run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Minimum rows a reference bucket must have to survive the post-pass
    /// filter; values <= 1 disable filtering.
    pub min_reads: usize,
    /// When enabled, matches with a reported identity in (0, 97) percent are
    /// skipped during collection.
    pub identity_filter: bool,
    /// Track read insertions and merge them into shared alignment columns.
    pub show_insertions: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            min_reads: 10,
            identity_filter: false,
            show_insertions: true,
        }
    }
}

/// One read's contribution to a reference bucket: normalized header,
/// whitespace-free sequence, and the truncated, header-stripped match text.
/// Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMatch {
    pub header: String,
    pub sequence: String,
    pub match_text: String,
}

impl ReadMatch {
    /// Dedup key: the first whitespace-delimited token of the header.
    pub fn name(&self) -> &str {
        first_word(&self.header)
    }
}

/// Counters reported at the end of a collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectStats {
    pub reads_seen: usize,
    pub reads_used: usize,
    pub references: usize,
}

/// Counters reported at the end of one reference build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub errors: usize,
}

/// First whitespace-delimited token of a string, or the whole string if it
/// contains no whitespace.
pub fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or(text)
}

/// First line of a string (without the line terminator).
pub fn first_line(text: &str) -> &str {
    match text.find('\n') {
        Some(pos) => text[..pos].trim_end_matches('\r'),
        None => text,
    }
}

/// Reverse complement of a nucleotide sequence, preserving case. Characters
/// without a complement (ambiguity codes, gaps) are kept as-is.
pub fn reverse_complement(sequence: &str) -> String {
    sequence
        .chars()
        .rev()
        .map(|ch| match ch {
            'A' => 'T',
            'T' => 'A',
            'G' => 'C',
            'C' => 'G',
            'U' => 'A',
            'a' => 't',
            't' => 'a',
            'g' => 'c',
            'c' => 'g',
            'u' => 'a',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codon_unit() {
        assert_eq!(Flavor::TranslatedNucleotide.codon_unit(), 3);
        assert_eq!(Flavor::Protein.codon_unit(), 1);
        assert_eq!(Flavor::Nucleotide.codon_unit(), 1);
    }

    #[test]
    fn test_first_word_and_line() {
        assert_eq!(first_word("read1 some description"), "read1");
        assert_eq!(first_word("read1"), "read1");
        assert_eq!(first_line("ref line one\r\nLength = 10"), "ref line one");
        assert_eq!(first_line("single line"), "single line");
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ACGT"), "ACGT");
        assert_eq!(reverse_complement("AACG"), "CGTT");
        assert_eq!(reverse_complement("acgtN-"), "-Nacgt");
    }

    #[test]
    fn test_default_config() {
        let config = StackConfig::default();
        assert_eq!(config.min_reads, 10);
        assert!(!config.identity_filter);
        assert!(config.show_insertions);
    }
}
