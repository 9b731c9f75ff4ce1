//! Per-reference build orchestration
//!
//! Turns one collected reference bucket into a finished [`Alignment`]: one
//! lane per read, a reconstructed consensus as the reference row, and merged
//! insertion columns. Row failures are counted and skipped; only cancellation
//! aborts a build.

use crate::alignment::Alignment;
use crate::collect::MatchCollector;
use crate::gapped;
use crate::merge::{merge_insertions, InsertionMap};
use crate::progress::{Cancelled, Progress};
use crate::types::{first_word, BuildStats, Flavor, MoleculeType};

/// Builds the alignment for `reference` from the collector's bucket.
///
/// The sink is cleared first. On cancellation the rows committed so far stay
/// in the sink, but no reference consensus is installed.
pub fn assemble_reference(
    collector: &MatchCollector,
    reference: &str,
    alignment: &mut Alignment,
    progress: &mut dyn Progress,
) -> Result<BuildStats, Cancelled> {
    alignment.clear();
    alignment.set_name(reference);

    let flavor = collector.flavor();
    match flavor {
        Flavor::TranslatedNucleotide => {
            alignment.set_reference_type(MoleculeType::Protein);
            alignment.set_sequence_type(MoleculeType::CDna);
        }
        Flavor::Protein => {
            alignment.set_reference_type(MoleculeType::Protein);
            alignment.set_sequence_type(MoleculeType::Protein);
        }
        Flavor::Nucleotide => {
            alignment.set_reference_type(MoleculeType::Dna);
            alignment.set_sequence_type(MoleculeType::Dna);
        }
        Flavor::Unknown => {
            log::error!("No alignment flavor detected, nothing to assemble");
            return Ok(BuildStats::default());
        }
    }

    let rows = collector.rows(reference).unwrap_or(&[]);
    let show_insertions = collector.config().show_insertions;

    progress.set_task("Alignment stacker", first_word(reference));
    progress.set_maximum(rows.len() as u64);

    let mut stats = BuildStats {
        rows_in: rows.len(),
        ..BuildStats::default()
    };
    let mut consensus: Option<Vec<u8>> = None;
    let mut original: Option<Vec<u8>> = None;
    let mut pending = InsertionMap::new();
    let mut emitted = 0usize;

    for row in rows {
        progress.check_cancelled()?;
        let mut insertions = Vec::new();
        let result = match flavor {
            Flavor::TranslatedNucleotide => gapped::build_translated_row(
                &row.header,
                &row.sequence,
                &row.match_text,
                &mut insertions,
                show_insertions,
                &mut consensus,
                &mut original,
                alignment,
            ),
            Flavor::Protein => gapped::build_protein_row(
                &row.header,
                &row.sequence,
                &row.match_text,
                &mut insertions,
                show_insertions,
                &mut consensus,
                alignment,
            ),
            Flavor::Nucleotide => gapped::build_nucleotide_row(
                &row.header,
                &row.sequence,
                &row.match_text,
                &mut insertions,
                show_insertions,
                &mut consensus,
                alignment,
            ),
            Flavor::Unknown => break,
        };
        match result {
            Ok(()) => {
                // insertion rows are indexed by emitted lane, not input row
                for (column, text) in insertions {
                    pending.entry(column).or_default().push((emitted, text));
                }
                emitted += 1;
                stats.rows_out += 1;
            }
            Err(error) => {
                log::warn!("Skipping read '{}': {error}", row.name());
                stats.errors += 1;
            }
        }
        progress.increment();
    }

    if let Some(buffer) = consensus {
        let true_len = consensus_length(&buffer, flavor);
        let text: String = buffer[..true_len]
            .iter()
            .map(|&slot| if slot == 0 { ' ' } else { slot as char })
            .collect();
        alignment.set_reference(reference, text);
        alignment.trim_to_true_length(true_len);
    }

    if let Some(buffer) = original {
        let mut end = buffer.len();
        while end > 0 && buffer[end - 1] == b'?' {
            end -= 1;
        }
        let text: String = buffer[..end].iter().map(|&slot| slot as char).collect();
        alignment.set_original_reference(text);
    }

    if show_insertions && !pending.is_empty() {
        merge_insertions(&pending, alignment, progress)?;
    }

    log::debug!(
        "Reference '{}': {} rows stacked, {} skipped",
        first_word(reference),
        stats.rows_out,
        stats.errors
    );
    Ok(stats)
}

/// True consensus length: trailing unwritten slots dropped, except that a
/// translated consensus keeps a partially written final codon whole.
fn consensus_length(buffer: &[u8], flavor: Flavor) -> usize {
    let mut true_len = buffer.len();
    while true_len > 0 && buffer[true_len - 1] == 0 {
        true_len -= 1;
    }
    if flavor == Flavor::TranslatedNucleotide && true_len % 3 != 0 {
        let rounded = 3 * (true_len / 3) + 3;
        if rounded <= buffer.len() && buffer[rounded - 3] != 0 {
            true_len = rounded;
        }
    }
    true_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::source::{MatchRecord, MatchSelector, ReadRecord, SourceError};
    use crate::types::StackConfig;

    struct AllMatches;

    impl MatchSelector for AllMatches {
        fn active_matches(&self, read: &ReadRecord) -> Vec<usize> {
            (0..read.matches.len()).collect()
        }
    }

    fn read(name: &str, sequence: &str, text: &str) -> Result<ReadRecord, SourceError> {
        Ok(ReadRecord {
            header: format!(">{name} sample read"),
            sequence: Some(sequence.to_string()),
            matches: vec![MatchRecord {
                text: Some(text.to_string()),
                bit_score: 50.0,
                expect: 1e-10,
                percent_identity: 0.0,
            }],
        })
    }

    fn collected(reads: Vec<Result<ReadRecord, SourceError>>) -> MatchCollector {
        let config = StackConfig {
            min_reads: 1,
            ..StackConfig::default()
        };
        let mut collector = MatchCollector::new(config);
        collector.collect(reads, &AllMatches, &mut NoProgress).unwrap();
        collector
    }

    #[test]
    fn test_protein_build_end_to_end() {
        let text_r1 = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 AB-DE 4\nSbjct: 3 ABCDE 7\n";
        let text_r2 = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 ABXCD 5\nSbjct: 1 AB-CD 4\n";
        let collector = collected(vec![read("r1", "ABDE", text_r1), read("r2", "ABXCD", text_r2)]);

        let mut alignment = Alignment::new();
        let stats =
            assemble_reference(&collector, ">refA description", &mut alignment, &mut NoProgress)
                .unwrap();

        assert_eq!(stats, BuildStats { rows_in: 2, rows_out: 2, errors: 0 });
        assert_eq!(alignment.reference_type(), Some(MoleculeType::Protein));
        assert_eq!(alignment.sequence_type(), Some(MoleculeType::Protein));

        // consensus: r1 wrote ABCDE at 3..7, r2 overwrote 1..4, trailing
        // unwritten slots trimmed, then one column opened by r2's insertion
        assert_eq!(alignment.reference().unwrap().block(), "AB-CDCDE");
        let opened: Vec<i64> = alignment.insertions_into_reference().iter().copied().collect();
        assert_eq!(opened, vec![2]);

        let lane0 = alignment.lane(0).unwrap();
        assert_eq!(lane0.leading_gaps(), 3);
        assert_eq!(lane0.block(), "AB-DE");
        assert_eq!(lane0.trailing_gaps(), 0);

        let lane1 = alignment.lane(1).unwrap();
        assert_eq!(lane1.block(), "ABxCD");
        assert_eq!(lane1.trailing_gaps(), 3);

        // every row spans the same number of columns
        assert_eq!(lane0.len(), 8);
        assert_eq!(lane1.len(), 8);
        assert_eq!(alignment.reference().unwrap().len(), 8);
    }

    #[test]
    fn test_translated_build_keeps_partial_codon() {
        let text = ">refX protein\nLength = 4\n\n Score = 20.0 bits (40), Expect = 1e-03\n Frame = +1\nQuery: 1 MAK 9\nSbjct: 2 MAK 4\n";
        let collector = collected(vec![read("r1", "ATGGCCAAA", text)]);

        let mut alignment = Alignment::new();
        let stats = assemble_reference(&collector, ">refX protein", &mut alignment, &mut NoProgress)
            .unwrap();

        assert_eq!(stats.rows_out, 1);
        assert_eq!(alignment.reference_type(), Some(MoleculeType::Protein));
        assert_eq!(alignment.sequence_type(), Some(MoleculeType::CDna));

        // K written at slot 9 keeps its whole codon: length 12, not 10
        assert_eq!(alignment.reference().unwrap().block(), "   M  A  K  ");
        assert_eq!(alignment.original_reference(), Some("?MAK"));
        assert_eq!(alignment.lane(0).unwrap().len(), 12);
    }

    #[test]
    fn test_failed_row_is_counted_and_skipped() {
        let good = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 AB-DE 4\nSbjct: 3 ABCDE 7\n";
        // query end past the read's length
        let bad = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 ABCDE 50\nSbjct: 3 ABCDE 7\n";
        let collector = collected(vec![read("r1", "ABDE", good), read("r2", "ABCDE", bad)]);

        let mut alignment = Alignment::new();
        let stats =
            assemble_reference(&collector, ">refA description", &mut alignment, &mut NoProgress)
                .unwrap();

        assert_eq!(stats, BuildStats { rows_in: 2, rows_out: 1, errors: 1 });
        assert_eq!(alignment.num_lanes(), 1);
        assert!(alignment.reference().is_some());
    }

    #[test]
    fn test_unknown_reference_yields_empty_stats() {
        let text = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 AB-DE 4\nSbjct: 3 ABCDE 7\n";
        let collector = collected(vec![read("r1", "ABDE", text)]);

        let mut alignment = Alignment::new();
        let stats =
            assemble_reference(&collector, ">nosuch ref", &mut alignment, &mut NoProgress).unwrap();
        assert_eq!(stats, BuildStats::default());
        assert_eq!(alignment.num_lanes(), 0);
    }

    #[test]
    fn test_cancellation_aborts_before_reference_is_set() {
        use crate::progress::CancelFlag;
        let text = ">refA description\nLength = 10\n\n Score = 50.0 bits (120), Expect = 1e-10\nQuery: 1 AB-DE 4\nSbjct: 3 ABCDE 7\n";
        let collector = collected(vec![read("r1", "ABDE", text)]);

        let mut alignment = Alignment::new();
        let flag = CancelFlag::new();
        flag.cancel();
        let mut flag = flag;
        let result = assemble_reference(&collector, ">refA description", &mut alignment, &mut flag);
        assert_eq!(result, Err(Cancelled));
        assert!(alignment.reference().is_none());
    }
}
