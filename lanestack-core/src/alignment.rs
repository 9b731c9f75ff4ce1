//! Stacked-alignment data model
//!
//! [`Alignment`] is the sink the orchestrator fills for one reference: the
//! reconstructed reference consensus plus one [`Lane`] per read. Downstream
//! visualization/export consumers receive it by value; nothing here is shared
//! across builds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::MoleculeType;

/// One read's aligned row: a gapped residue block padded to the reference's
/// full extent by leading/trailing gap counts, plus the unaligned read
/// overhangs on either side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    name: String,
    /// Raw match text the row was derived from, kept for display.
    raw_text: String,
    original_name: Option<String>,
    unaligned_prefix: String,
    leading_gaps: usize,
    block: String,
    trailing_gaps: usize,
    unaligned_suffix: String,
}

impl Lane {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        raw_text: String,
        original_name: Option<String>,
        unaligned_prefix: String,
        leading_gaps: usize,
        block: String,
        trailing_gaps: usize,
        unaligned_suffix: String,
    ) -> Self {
        Self {
            name,
            raw_text,
            original_name,
            unaligned_prefix,
            leading_gaps,
            block,
            trailing_gaps,
            unaligned_suffix,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn unaligned_prefix(&self) -> &str {
        &self.unaligned_prefix
    }

    pub fn unaligned_suffix(&self) -> &str {
        &self.unaligned_suffix
    }

    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn set_block(&mut self, block: String) {
        self.block = block;
    }

    pub fn leading_gaps(&self) -> usize {
        self.leading_gaps
    }

    pub fn set_leading_gaps(&mut self, leading_gaps: usize) {
        self.leading_gaps = leading_gaps;
    }

    pub fn trailing_gaps(&self) -> usize {
        self.trailing_gaps
    }

    pub fn set_trailing_gaps(&mut self, trailing_gaps: usize) {
        self.trailing_gaps = trailing_gaps;
    }

    /// Total column extent: leading gaps + block + trailing gaps.
    pub fn len(&self) -> usize {
        self.leading_gaps + self.block.len() + self.trailing_gaps
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the lane at full extent with `-` as the gap symbol.
    pub fn to_padded_string(&self) -> String {
        let mut row = String::with_capacity(self.len());
        for _ in 0..self.leading_gaps {
            row.push('-');
        }
        row.push_str(&self.block);
        for _ in 0..self.trailing_gaps {
            row.push('-');
        }
        row
    }
}

/// The per-reference multiple alignment handed to downstream consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alignment {
    name: String,
    reference_type: Option<MoleculeType>,
    sequence_type: Option<MoleculeType>,
    reference_key: String,
    reference: Option<Lane>,
    original_reference: Option<String>,
    lanes: Vec<Lane>,
    /// Columns opened by the insertion merger, for rendering inserted vs.
    /// originally aligned columns differently.
    insertions_into_reference: BTreeSet<i64>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the sink for a fresh build.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn reference_type(&self) -> Option<MoleculeType> {
        self.reference_type
    }

    pub fn set_reference_type(&mut self, molecule_type: MoleculeType) {
        self.reference_type = Some(molecule_type);
    }

    pub fn sequence_type(&self) -> Option<MoleculeType> {
        self.sequence_type
    }

    pub fn set_sequence_type(&mut self, molecule_type: MoleculeType) {
        self.sequence_type = Some(molecule_type);
    }

    /// Appends one read's lane.
    #[allow(clippy::too_many_arguments)]
    pub fn add_sequence(
        &mut self,
        name: String,
        raw_text: String,
        original_name: Option<String>,
        unaligned_prefix: String,
        leading_gaps: usize,
        block: String,
        trailing_gaps: usize,
        unaligned_suffix: String,
    ) {
        self.lanes.push(Lane::new(
            name,
            raw_text,
            original_name,
            unaligned_prefix,
            leading_gaps,
            block,
            trailing_gaps,
            unaligned_suffix,
        ));
    }

    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, row: usize) -> Option<&Lane> {
        self.lanes.get(row)
    }

    pub fn lane_mut(&mut self, row: usize) -> Option<&mut Lane> {
        self.lanes.get_mut(row)
    }

    pub fn reference_key(&self) -> &str {
        &self.reference_key
    }

    /// Installs the reconstructed consensus as the reference lane.
    pub fn set_reference(&mut self, key: &str, consensus: String) {
        self.reference_key = key.to_string();
        self.reference = Some(Lane::new(
            key.to_string(),
            String::new(),
            None,
            String::new(),
            0,
            consensus,
            0,
            String::new(),
        ));
    }

    pub fn reference(&self) -> Option<&Lane> {
        self.reference.as_ref()
    }

    pub fn reference_mut(&mut self) -> Option<&mut Lane> {
        self.reference.as_mut()
    }

    pub fn set_original_reference(&mut self, text: String) {
        self.original_reference = Some(text);
    }

    pub fn original_reference(&self) -> Option<&str> {
        self.original_reference.as_deref()
    }

    pub fn insertions_into_reference(&self) -> &BTreeSet<i64> {
        &self.insertions_into_reference
    }

    pub fn insertions_into_reference_mut(&mut self) -> &mut BTreeSet<i64> {
        &mut self.insertions_into_reference
    }

    /// Trims every lane's trailing gaps so no lane extends past column `n`.
    /// Called after the consensus's trailing placeholder run is removed.
    pub fn trim_to_true_length(&mut self, n: usize) {
        for lane in &mut self.lanes {
            let length = lane.len();
            if length > n {
                lane.trailing_gaps = lane.trailing_gaps.saturating_sub(length - n);
            }
        }
    }

    /// Longest column extent over the reference and all lanes.
    pub fn length(&self) -> usize {
        self.lanes
            .iter()
            .map(Lane::len)
            .chain(self.reference.as_ref().map(Lane::len))
            .max()
            .unwrap_or(0)
    }
}
