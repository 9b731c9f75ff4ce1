//! Insertion merging
//!
//! Rows that consumed read residues opposite reference gaps carry pending
//! insertions keyed by the alignment column they follow. Merging opens new
//! columns for them, widest text wins per column, and splices every lane so
//! the stack stays column-aligned. Aligned residues are uppercased and
//! inserted text lowercased so renderers can tell them apart.

use std::collections::BTreeMap;

use crate::alignment::Alignment;
use crate::progress::{Cancelled, Progress};

/// Pending insertions for one reference: column -> (row, consumed text).
pub type InsertionMap = BTreeMap<i64, Vec<(usize, String)>>;

/// Splices all pending insertions into `alignment`.
///
/// Columns are processed in ascending order; each opened column shifts every
/// later one right by its width, tracked by a running offset. Cancellation is
/// polled per column and leaves already-spliced columns in place.
pub fn merge_insertions(
    columns: &InsertionMap,
    alignment: &mut Alignment,
    progress: &mut dyn Progress,
) -> Result<(), Cancelled> {
    if columns.is_empty() {
        return Ok(());
    }

    for row in 0..alignment.num_lanes() {
        if let Some(lane) = alignment.lane_mut(row) {
            lane.set_block(lane.block().to_ascii_uppercase());
        }
    }

    progress.set_subtask("merging insertions");
    progress.set_maximum(columns.len() as u64);

    let mut offset: i64 = 0;
    for (&column, pending) in columns {
        progress.check_cancelled()?;

        let width = pending.iter().map(|(_, text)| text.len()).max().unwrap_or(0);
        if width == 0 {
            continue;
        }
        let current = column + offset;

        let mut inserted = vec![false; alignment.num_lanes()];
        for (row, text) in pending {
            if let Some(lane) = alignment.lane_mut(*row) {
                let pos = splice_position(current, lane.leading_gaps());
                let mut piece = text.to_ascii_lowercase();
                while piece.len() < width {
                    piece.push('-');
                }
                let pos = pos.clamp(0, lane.block().len() as i64) as usize;
                lane.set_block(spliced(lane.block(), pos, &piece));
                inserted[*row] = true;
            }
        }

        for row in 0..alignment.num_lanes() {
            if inserted[row] {
                continue;
            }
            if let Some(lane) = alignment.lane_mut(row) {
                let pos = splice_position(current, lane.leading_gaps());
                if pos <= 0 {
                    lane.set_leading_gaps(lane.leading_gaps() + width);
                } else if (pos as usize) <= lane.block().len() {
                    lane.set_block(spliced(lane.block(), pos as usize, &gaps(width)));
                } else if (pos as usize) > lane.block().len() + 1 {
                    lane.set_trailing_gaps(lane.trailing_gaps() + width);
                }
                // a column opening exactly at the block's end adds nothing
            }
        }

        if let Some(reference) = alignment.reference_mut() {
            let pos = splice_position(current, reference.leading_gaps());
            if pos <= 0 {
                reference.set_leading_gaps(reference.leading_gaps() + width);
            } else if (pos as usize) <= reference.block().len() {
                reference.set_block(spliced(reference.block(), pos as usize, &gaps(width)));
            } else if (pos as usize) > reference.block().len() + 1 {
                reference.set_trailing_gaps(reference.trailing_gaps() + width);
            }
        }
        for opened in 0..width as i64 {
            alignment.insertions_into_reference_mut().insert(current + 1 + opened);
        }

        offset += width as i64;
        progress.increment();
    }
    Ok(())
}

/// Block byte index at which a column opened after alignment column
/// `current` lands within a lane with `leading` leading gaps.
fn splice_position(current: i64, leading: usize) -> i64 {
    current - leading as i64 + 1
}

fn spliced(block: &str, pos: usize, piece: &str) -> String {
    let mut out = String::with_capacity(block.len() + piece.len());
    out.push_str(&block[..pos]);
    out.push_str(piece);
    out.push_str(&block[pos..]);
    out
}

fn gaps(width: usize) -> String {
    "-".repeat(width)
}
