//! Gapped-alignment row builders
//!
//! One builder per flavor, sharing a single skeleton: parse the match's
//! coordinates and aligned rows, project the subject onto the shared
//! reference consensus (last writer wins), then walk the aligned column pairs
//! to produce the read's lane and any insertions. All report coordinates are
//! 1-based inclusive.

use thiserror::Error;

use crate::alignment::Alignment;
use crate::scan::{self, ScanError};
use crate::types::reverse_complement;

/// Substitute for a missing or unparseable "Length" statement.
const DEFAULT_REFERENCE_LENGTH: i64 = 10_000;

/// Extra consensus capacity past a nucleotide reference's declared length,
/// which may be a lower bound only.
const NUCLEOTIDE_HEADROOM: usize = 10_000;

/// Per-row failures. Caught at the row boundary, counted, and skipped; they
/// never abort the reference's build.
#[derive(Debug, Error)]
pub enum LaneError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("read '{read}': read length too short: {len} < {needed}")]
    ReadTooShort { read: String, len: usize, needed: i64 },

    #[error("read cursor out of bounds: {pos} not within 0..{len}")]
    CursorOutOfBounds { pos: i64, len: usize },

    #[error("subject projection outside the reference buffer: position {pos}, buffer {len}")]
    ReferenceOverrun { pos: i64, len: usize },

    #[error("aligned query and subject rows differ in length: {query} != {subject}")]
    RowLengthMismatch { query: usize, subject: usize },
}

/// One row's pending insertion: alignment column and consumed read text.
/// The orchestrator attaches the row index when it files these into the
/// column-ordered multimap.
pub type RowInsertion = (i64, String);

/// Builds one translated-nucleotide row: protein-level columns, each
/// consuming one codon (3 nucleotide slots) of the read and the consensus.
#[allow(clippy::too_many_arguments)]
pub fn build_translated_row(
    read_header: &str,
    read_sequence: &str,
    match_text: &str,
    insertions: &mut Vec<RowInsertion>,
    show_insertions: bool,
    consensus: &mut Option<Vec<u8>>,
    original_consensus: &mut Option<Vec<u8>>,
    alignment: &mut Alignment,
) -> Result<(), LaneError> {
    let length = declared_length(match_text);

    let consensus = consensus.get_or_insert_with(|| vec![0u8; 3 * length as usize]);
    let original = original_consensus.get_or_insert_with(|| vec![b'?'; length as usize]);

    let frame = scan::grab_next_int(match_text, "Frame =", "Frame=");

    let mut start_query = scan::grab_next_int(match_text, "Query:", "Query");
    let mut end_query = scan::grab_last_int_passed_score(match_text, "Query")?;
    check_read_length(read_header, read_sequence, start_query, end_query)?;

    let start_subject = scan::grab_next_int(match_text, "Sbjct:", "Sbjct");
    let end_subject = scan::grab_last_int_passed_score(match_text, "Sbjct")?;

    let query_row = scan::grab_query_string(match_text)?;
    let subject_row = scan::grab_subject_string(match_text)?;
    check_row_lengths(&query_row, &subject_row)?;

    project_subject(&subject_row, start_subject, 3, consensus, Some(original))?;

    let mut name = read_header.to_string();
    let read;
    if frame < 0 {
        name.push_str(" (rev)");
        let len = read_sequence.len() as i64;
        start_query = len - start_query + 1;
        end_query = len - end_query + 1;
        read = reverse_complement(read_sequence);
    } else {
        read = read_sequence.to_string();
    }

    let mut pos = start_query - 1; // position in the read
    let mut align_pos = 3 * (start_subject - 1); // position in the stacked alignment
    let mut block = String::with_capacity(3 * query_row.len());
    let mut open: Option<usize> = None;

    let query = query_row.as_bytes();
    let subject = subject_row.as_bytes();
    for column in 0..query.len() {
        if query[column] == b'-' {
            open = None;
            block.push_str("---");
            align_pos += 3;
        } else if subject[column] == b'-' {
            if show_insertions {
                let codon = read_slice(&read, pos, 3)?;
                extend_insertion(insertions, &mut open, align_pos - 1, codon);
            }
            pos += 3;
            align_pos += 3;
        } else {
            open = None;
            block.push_str(read_slice(&read, pos, 3)?);
            pos += 3;
            align_pos += 3;
        }
    }

    let leading_gaps = (3 * (start_subject - 1)).max(0) as usize;
    let trailing_gaps = (3 * (length - end_subject)).max(0) as usize;
    let unaligned_prefix = prefix_of(&read, start_query);
    let unaligned_suffix = suffix_of(&read, end_query);
    alignment.add_sequence(
        name,
        match_text.to_string(),
        None,
        unaligned_prefix,
        leading_gaps,
        block,
        trailing_gaps,
        unaligned_suffix,
    );
    Ok(())
}

/// Builds one protein row: one residue per column.
#[allow(clippy::too_many_arguments)]
pub fn build_protein_row(
    read_header: &str,
    read_sequence: &str,
    match_text: &str,
    insertions: &mut Vec<RowInsertion>,
    show_insertions: bool,
    consensus: &mut Option<Vec<u8>>,
    alignment: &mut Alignment,
) -> Result<(), LaneError> {
    let length = declared_length(match_text);

    let consensus = consensus.get_or_insert_with(|| vec![0u8; length as usize]);

    let start_query = scan::grab_next_int(match_text, "Query:", "Query");
    let end_query = scan::grab_last_int_passed_score(match_text, "Query")?;
    check_read_length(read_header, read_sequence, start_query, end_query)?;

    let start_subject = scan::grab_next_int(match_text, "Sbjct:", "Sbjct");
    let end_subject = scan::grab_last_int_passed_score(match_text, "Sbjct")?;

    let query_row = scan::grab_query_string(match_text)?;
    let subject_row = scan::grab_subject_string(match_text)?;
    check_row_lengths(&query_row, &subject_row)?;

    project_subject(&subject_row, start_subject, 1, consensus, None)?;

    let mut pos = start_query - 1;
    let mut align_pos = start_subject - 1;
    let mut block = String::with_capacity(query_row.len());
    let mut open: Option<usize> = None;

    let query = query_row.as_bytes();
    let subject = subject_row.as_bytes();
    for column in 0..query.len() {
        if query[column] == b'-' {
            open = None;
            block.push('-');
            align_pos += 1;
        } else if subject[column] == b'-' {
            if show_insertions {
                let residue = read_slice(read_sequence, pos, 1)?;
                extend_insertion(insertions, &mut open, align_pos - 1, residue);
            }
            pos += 1;
            align_pos += 1;
        } else {
            open = None;
            block.push_str(read_slice(read_sequence, pos, 1)?);
            pos += 1;
            align_pos += 1;
        }
    }

    let leading_gaps = (start_subject - 1).max(0) as usize;
    let trailing_gaps = (length - end_subject).max(0) as usize;
    let unaligned_prefix = prefix_of(read_sequence, start_query);
    let unaligned_suffix = suffix_of(read_sequence, end_query);
    alignment.add_sequence(
        read_header.to_string(),
        match_text.to_string(),
        None,
        unaligned_prefix,
        leading_gaps,
        block,
        trailing_gaps,
        unaligned_suffix,
    );
    Ok(())
}

/// Builds one nucleotide row. Handles strand normalization, "Length >="
/// lower bounds with grow-only consensus resizing, and the trailing-gap
/// equalization needed when the declared length was approximate.
#[allow(clippy::too_many_arguments)]
pub fn build_nucleotide_row(
    read_header: &str,
    read_sequence: &str,
    match_text: &str,
    insertions: &mut Vec<RowInsertion>,
    show_insertions: bool,
    consensus: &mut Option<Vec<u8>>,
    alignment: &mut Alignment,
) -> Result<(), LaneError> {
    let mut has_exact_length = true;
    let mut length = scan::grab_next_int(match_text, "Length =", "Length=");
    if length <= 0 {
        has_exact_length = false;
        length = scan::grab_next_int(match_text, "Length >=", "Length>=");
        if length <= 0 {
            length = DEFAULT_REFERENCE_LENGTH;
        }
        // the declared length is only a lower bound: grow the consensus if a
        // later row implies more room (grow-only, never shrink)
        if let Some(buffer) = consensus.as_mut() {
            if buffer.len() < length as usize {
                buffer.resize(length as usize + 1, 0u8);
            }
        }
    }

    let strand = parse_strand_pair(match_text);

    let consensus =
        consensus.get_or_insert_with(|| vec![0u8; length as usize + NUCLEOTIDE_HEADROOM]);

    let mut start_query = scan::grab_next_int(match_text, "Query:", "Query");
    let mut end_query = scan::grab_last_int_passed_score(match_text, "Query")?;
    check_read_length(read_header, read_sequence, start_query, end_query)?;

    let mut start_subject = scan::grab_next_int(match_text, "Sbjct:", "Sbjct");
    let mut end_subject = scan::grab_last_int_passed_score(match_text, "Sbjct")?;

    let mut query_row = scan::grab_query_string(match_text)?;
    let mut subject_row = scan::grab_subject_string(match_text)?;
    check_row_lengths(&query_row, &subject_row)?;

    let query_minus = strand
        .as_ref()
        .is_some_and(|(query, _)| query.eq_ignore_ascii_case("Minus"));
    let subject_minus = strand
        .as_ref()
        .is_some_and(|(_, subject)| subject.eq_ignore_ascii_case("Minus"));
    if query_minus && subject_minus {
        return Err(ScanError::MinusMinusStrand.into());
    }

    let mut name = read_header.to_string();
    if query_minus {
        // coordinates are reported descending; the read itself is already
        // stored on the plus strand
        let (low, high) = (start_query.min(end_query), start_query.max(end_query));
        start_query = low;
        end_query = high;
        name.push_str(" (-/+)");
    }
    if subject_minus {
        let (low, high) = (start_subject.min(end_subject), start_subject.max(end_subject));
        start_subject = low;
        end_subject = high;
        query_row = reverse_complement(&query_row);
        subject_row = reverse_complement(&subject_row);
        if !query_minus {
            name.push_str(" (+/-)");
        }
    }

    project_subject(&subject_row, start_subject, 1, consensus, None)?;

    let mut pos = start_query - 1;
    let mut align_pos = start_subject - 1;
    let mut block = String::with_capacity(query_row.len());
    let mut open: Option<usize> = None;

    let query = query_row.as_bytes();
    let subject = subject_row.as_bytes();
    let read_len = read_sequence.len();
    for column in 0..query.len() {
        let ch = query[column] as char;
        if ch == '-' {
            open = None;
            block.push('-');
            align_pos += 1;
        } else if subject[column] == b'-' {
            if show_insertions {
                check_cursor(pos, 1, read_len)?;
                extend_insertion(insertions, &mut open, align_pos - 1, &ch.to_string());
            }
            pos += 1;
            align_pos += 1;
        } else {
            open = None;
            // residues come from the aligned query row: for minus-strand
            // queries it is the row, not the stored read, that pairs
            // column-wise with the subject
            check_cursor(pos, 1, read_len)?;
            block.push(ch);
            pos += 1;
            align_pos += 1;
        }
    }

    let leading_gaps = (start_subject - 1).max(0) as usize;
    let trailing_gaps = (length - end_subject).max(0) as usize;
    let unaligned_prefix = prefix_of(read_sequence, start_query);
    let unaligned_suffix = suffix_of(read_sequence, end_query);
    alignment.add_sequence(
        name,
        match_text.to_string(),
        None,
        unaligned_prefix,
        leading_gaps,
        block,
        trailing_gaps,
        unaligned_suffix,
    );

    if !has_exact_length {
        equalize_row_lengths(alignment);
    }
    Ok(())
}

/// "Length =" value, defaulting when absent or zero.
fn declared_length(match_text: &str) -> i64 {
    let length = scan::grab_next_int(match_text, "Length =", "Length=");
    if length <= 0 {
        DEFAULT_REFERENCE_LENGTH
    } else {
        length
    }
}

/// The "Strand =" pair, reported either as one combined token
/// ("Plus/Minus") or as three tokens ("Plus / Minus").
fn parse_strand_pair(match_text: &str) -> Option<(String, String)> {
    let token = scan::grab_next(match_text, "Strand =", "Strand=")?;
    if let Some((query, subject)) = token.split_once('/') {
        if !subject.is_empty() {
            return Some((query.to_string(), subject.to_string()));
        }
    }
    scan::grab_next3(match_text, "Strand =", "Strand=")
        .map(|[query, _, subject]| (query.to_string(), subject.to_string()))
}

fn check_read_length(
    read_header: &str,
    read_sequence: &str,
    start_query: i64,
    end_query: i64,
) -> Result<(), LaneError> {
    let needed = start_query.max(end_query);
    if (read_sequence.len() as i64) < needed {
        return Err(LaneError::ReadTooShort {
            read: crate::types::first_word(read_header).to_string(),
            len: read_sequence.len(),
            needed,
        });
    }
    Ok(())
}

fn check_row_lengths(query_row: &str, subject_row: &str) -> Result<(), LaneError> {
    if query_row.len() != subject_row.len() {
        return Err(LaneError::RowLengthMismatch {
            query: query_row.len(),
            subject: subject_row.len(),
        });
    }
    Ok(())
}

/// Writes the subject row's non-gap characters into the consensus at
/// `stride * (position - 1)`, last writer wins. The optional original buffer
/// receives the same characters unscaled.
fn project_subject(
    subject_row: &str,
    start_subject: i64,
    stride: usize,
    consensus: &mut [u8],
    mut original: Option<&mut Vec<u8>>,
) -> Result<(), LaneError> {
    let mut p = start_subject;
    for ch in subject_row.bytes() {
        if ch == b'-' {
            continue;
        }
        if p < 1 {
            return Err(LaneError::ReferenceOverrun { pos: p - 1, len: consensus.len() });
        }
        let index = stride * (p as usize - 1);
        let len = consensus.len();
        let slot = consensus
            .get_mut(index)
            .ok_or(LaneError::ReferenceOverrun { pos: index as i64, len })?;
        *slot = ch;
        if let Some(buffer) = original.as_deref_mut() {
            let index = p as usize - 1;
            let len = buffer.len();
            let slot = buffer
                .get_mut(index)
                .ok_or(LaneError::ReferenceOverrun { pos: index as i64, len })?;
            *slot = ch;
        }
        p += 1;
    }
    Ok(())
}

/// `count` read characters at cursor `pos`, bounds-checked.
fn read_slice(read: &str, pos: i64, count: usize) -> Result<&str, LaneError> {
    check_cursor(pos, count, read.len())?;
    let start = pos as usize;
    Ok(&read[start..start + count])
}

fn check_cursor(pos: i64, count: usize, len: usize) -> Result<(), LaneError> {
    if pos < 0 || (pos as usize) + count > len {
        return Err(LaneError::CursorOutOfBounds { pos, len });
    }
    Ok(())
}

/// Opens a new insertion at `column` or extends the currently open one.
fn extend_insertion(
    insertions: &mut Vec<RowInsertion>,
    open: &mut Option<usize>,
    column: i64,
    text: &str,
) {
    match open {
        Some(index) => insertions[*index].1.push_str(text),
        None => {
            insertions.push((column, text.to_string()));
            *open = Some(insertions.len() - 1);
        }
    }
}

/// Read characters strictly before the 1-based query start.
fn prefix_of(read: &str, start_query: i64) -> String {
    let end = (start_query - 1).clamp(0, read.len() as i64) as usize;
    read[..end].to_string()
}

/// Read characters strictly after the 1-based query end.
fn suffix_of(read: &str, end_query: i64) -> String {
    let start = end_query.clamp(0, read.len() as i64) as usize;
    read[start..].to_string()
}

/// Pads every lane's trailing gaps up to the longest realized row, keeping
/// rows column-aligned when the declared reference length was only a bound.
fn equalize_row_lengths(alignment: &mut Alignment) {
    let longest = alignment.lanes().iter().map(|lane| lane.len()).max().unwrap_or(0);
    let differ = alignment.lanes().iter().any(|lane| lane.len() != longest);
    if !differ {
        return;
    }
    for row in 0..alignment.num_lanes() {
        if let Some(lane) = alignment.lane_mut(row) {
            let length = lane.len();
            if length < longest {
                lane.set_trailing_gaps(lane.trailing_gaps() + (longest - length));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTEIN_MATCH: &str = "\
Length = 10

 Score = 50.0 bits (120), Expect = 1e-10
 Identities = 4/5 (80%)

Query: 1 AB-DE 4
Sbjct: 3 ABCDE 7
";

    #[test]
    fn test_protein_worked_example() {
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_protein_row(
            "r1",
            "ABDE",
            PROTEIN_MATCH,
            &mut insertions,
            true,
            &mut consensus,
            &mut alignment,
        )
        .unwrap();

        let lane = alignment.lane(0).unwrap();
        assert_eq!(lane.leading_gaps(), 2);
        assert_eq!(lane.block(), "AB-DE");
        assert_eq!(lane.trailing_gaps(), 3);
        assert_eq!(lane.len(), 10);
        assert!(insertions.is_empty());

        // subject projection: ABCDE written at 1-based positions 3..7
        let buffer = consensus.unwrap();
        assert_eq!(buffer.len(), 10);
        assert_eq!(&buffer[2..7], b"ABCDE");
        assert_eq!(&buffer[0..2], &[0, 0]);
        assert_eq!(&buffer[7..10], &[0, 0, 0]);
    }

    #[test]
    fn test_protein_insertion_capture() {
        let text = "\
Length = 4
 Score = 10 bits
Query: 1 ABXCD 5
Sbjct: 1 AB-CD 4
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_protein_row("r1", "ABXCD", text, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();

        assert_eq!(insertions, vec![(1, "X".to_string())]);
        let lane = alignment.lane(0).unwrap();
        assert_eq!(lane.block(), "ABCD");
        assert_eq!(lane.len(), 4);
    }

    #[test]
    fn test_protein_insertion_disabled() {
        let text = "\
Length = 4
 Score = 10 bits
Query: 1 ABXCD 5
Sbjct: 1 AB-CD 4
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_protein_row("r1", "ABXCD", text, &mut insertions, false, &mut consensus, &mut alignment)
            .unwrap();
        assert!(insertions.is_empty());
        assert_eq!(alignment.lane(0).unwrap().block(), "ABCD");
    }

    #[test]
    fn test_protein_read_too_short() {
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        let result = build_protein_row(
            "r1 description",
            "AB",
            PROTEIN_MATCH,
            &mut insertions,
            true,
            &mut consensus,
            &mut alignment,
        );
        assert!(matches!(result, Err(LaneError::ReadTooShort { .. })));
        assert_eq!(alignment.num_lanes(), 0);
    }

    #[test]
    fn test_translated_codon_scaling() {
        let text = "\
Length = 4
 Score = 20.0 bits (40), Expect = 1e-03
 Frame = +1
Query: 1 MAK 9
Sbjct: 2 MAK 4
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut original = None;
        let mut insertions = Vec::new();
        build_translated_row(
            "r1",
            "ATGGCCAAA",
            text,
            &mut insertions,
            true,
            &mut consensus,
            &mut original,
            &mut alignment,
        )
        .unwrap();

        let buffer = consensus.unwrap();
        assert_eq!(buffer.len(), 12); // 3x the declared length
        assert_eq!(buffer[3], b'M');
        assert_eq!(buffer[6], b'A');
        assert_eq!(buffer[9], b'K');

        let original = original.unwrap();
        assert_eq!(original.len(), 4);
        assert_eq!(&original[1..4], b"MAK");
        assert_eq!(original[0], b'?');

        let lane = alignment.lane(0).unwrap();
        assert_eq!(lane.leading_gaps(), 3);
        assert_eq!(lane.block(), "ATGGCCAAA"); // nucleotides, 3 per column
        assert_eq!(lane.trailing_gaps(), 0);
        assert_eq!(lane.len(), 12);
    }

    #[test]
    fn test_translated_negative_frame_reverses_read() {
        let text = "\
Length = 3
 Score = 20.0 bits (40), Expect = 1e-03
 Frame = -1
Query: 9 MA 4
Sbjct: 1 MA 2
";
        // revcomp("TTTGGCCAT") = "ATGGCCAAA"; flipped coordinates 9->1, 4->6
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut original = None;
        let mut insertions = Vec::new();
        build_translated_row(
            "r1",
            "TTTGGCCAT",
            text,
            &mut insertions,
            true,
            &mut consensus,
            &mut original,
            &mut alignment,
        )
        .unwrap();

        let lane = alignment.lane(0).unwrap();
        assert!(lane.name().ends_with(" (rev)"));
        assert_eq!(lane.block(), "ATGGCC");
        assert_eq!(lane.unaligned_suffix(), "AAA");
    }

    #[test]
    fn test_nucleotide_plus_plus() {
        let text = "\
Length = 20
 Score = 30.0 bits, Expect = 1e-05
 Strand = Plus / Plus
Query: 1 ACGT 4
Sbjct: 5 ACGT 8
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_nucleotide_row("r1", "ACGT", text, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();

        let lane = alignment.lane(0).unwrap();
        assert_eq!(lane.leading_gaps(), 4);
        assert_eq!(lane.block(), "ACGT");
        assert_eq!(lane.trailing_gaps(), 12);
        assert_eq!(&consensus.unwrap()[4..8], b"ACGT");
    }

    #[test]
    fn test_nucleotide_minus_minus_rejected() {
        let text = "\
Length = 20
 Score = 30.0 bits, Expect = 1e-05
 Strand = Minus / Minus
Query: 4 ACGT 1
Sbjct: 8 ACGT 5
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        let result = build_nucleotide_row(
            "r1",
            "ACGT",
            text,
            &mut insertions,
            true,
            &mut consensus,
            &mut alignment,
        );
        assert!(matches!(result, Err(LaneError::Scan(ScanError::MinusMinusStrand))));
        assert_eq!(alignment.num_lanes(), 0);
    }

    #[test]
    fn test_nucleotide_subject_minus_reverses_rows() {
        let text = "\
Length = 10
 Score = 30.0 bits, Expect = 1e-05
 Strand = Plus / Minus
Query: 1 AACG 4
Sbjct: 8 AACG 5
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_nucleotide_row("r1", "AACG", text, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();

        let lane = alignment.lane(0).unwrap();
        assert!(lane.name().ends_with(" (+/-)"));
        // rows reverse-complemented, subject coordinates swapped ascending
        assert_eq!(lane.leading_gaps(), 4);
        assert_eq!(lane.block(), "CGTT");
        assert_eq!(lane.trailing_gaps(), 2);
        assert_eq!(&consensus.unwrap()[4..8], b"CGTT");
    }

    #[test]
    fn test_nucleotide_query_minus_swaps_coordinates() {
        let text = "\
Length = 10
 Score = 30.0 bits, Expect = 1e-05
 Strand = Minus / Plus
Query: 4 ACGT 1
Sbjct: 1 ACGT 4
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_nucleotide_row("r1", "ACGT", text, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();

        let lane = alignment.lane(0).unwrap();
        assert!(lane.name().ends_with(" (-/+)"));
        assert_eq!(lane.leading_gaps(), 0);
        assert_eq!(lane.block(), "ACGT");
    }

    #[test]
    fn test_nucleotide_combined_strand_token() {
        let text = "\
Length = 10
 Score = 30.0 bits, Expect = 1e-05
 Strand=Plus/Plus
Query: 1 AC 2
Sbjct: 1 AC 2
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_nucleotide_row("r1", "AC", text, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();
        assert_eq!(alignment.lane(0).unwrap().block(), "AC");
    }

    #[test]
    fn test_nucleotide_lower_bound_grows_consensus() {
        let first = "\
Length >= 6
 Score = 30.0 bits, Expect = 1e-05
 Strand = Plus / Plus
Query: 1 ACGT 4
Sbjct: 1 ACGT 4
";
        let second = "\
Length >= 12
 Score = 30.0 bits, Expect = 1e-05
 Strand = Plus / Plus
Query: 1 ACGT 4
Sbjct: 9 ACGT 12
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_nucleotide_row("r1", "ACGT", first, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();
        let initial = consensus.as_ref().unwrap().len();
        build_nucleotide_row("r2", "ACGT", second, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();
        assert!(consensus.as_ref().unwrap().len() >= initial);

        // rows built from differing bounds are padded to a common extent
        let len0 = alignment.lane(0).unwrap().len();
        let len1 = alignment.lane(1).unwrap().len();
        assert_eq!(len0, len1);
    }

    #[test]
    fn test_last_writer_wins_on_shared_positions() {
        let text_a = "\
Length = 6
 Score = 10 bits
Query: 1 AAA 3
Sbjct: 1 AAA 3
";
        let text_b = "\
Length = 6
 Score = 10 bits
Query: 1 CCC 3
Sbjct: 2 CCC 4
";
        let mut alignment = Alignment::new();
        let mut consensus = None;
        let mut insertions = Vec::new();
        build_protein_row("r1", "AAA", text_a, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();
        build_protein_row("r2", "CCC", text_b, &mut insertions, true, &mut consensus, &mut alignment)
            .unwrap();
        assert_eq!(&consensus.unwrap()[..4], b"ACCC");
    }

    #[test]
    fn test_project_subject_rejects_positions_past_the_buffer() {
        let mut consensus = vec![0u8; 4];
        let err = project_subject("ABCDE", 1, 1, &mut consensus, None).unwrap_err();
        assert!(matches!(err, LaneError::ReferenceOverrun { pos: 4, len: 4 }));
        // residues before the overrun stay written
        assert_eq!(&consensus, b"ABCD");
    }
}
