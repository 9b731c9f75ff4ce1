//! Upstream read/match source interfaces
//!
//! The collector consumes an iterator of [`ReadRecord`]s plus an external
//! active-match policy. Which matches are eligible for a read is decided by a
//! [`MatchSelector`]; the stock [`ThresholdSelector`] applies the usual
//! score/expect/identity/top-percent thresholds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conditions that abort a whole collection pass.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source does not provide alignment text")]
    MissingAlignmentSupport,

    #[error("read '{0}': sequence not found")]
    MissingSequence(String),

    #[error("no active matches found")]
    NoActiveMatches,

    #[error("could not determine the alignment flavor; translated-nucleotide, protein or nucleotide matches are required")]
    UnknownFlavor,

    #[error("invalid FASTA input: {0}")]
    InvalidFasta(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One match record as delivered by the upstream source: the raw report text
/// plus the metadata the selection policy filters on.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Raw report text; `None` when the source stores scores without text.
    pub text: Option<String>,
    pub bit_score: f32,
    pub expect: f64,
    /// Percent identity in [0, 100]; 0 when the source did not report one.
    pub percent_identity: f32,
}

/// One read as delivered by the upstream source.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRecord {
    pub header: String,
    pub sequence: Option<String>,
    pub matches: Vec<MatchRecord>,
}

/// External active-match selection policy: returns the indices of the
/// matches of `read` that are eligible for stacking.
pub trait MatchSelector {
    fn active_matches(&self, read: &ReadRecord) -> Vec<usize>;
}

/// Stock threshold-based selection: a match is active when its bit score,
/// expect value and identity pass the configured thresholds and its score is
/// within `top_percent` of the read's best active score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelector {
    pub min_score: f32,
    /// Keep matches scoring at least `(1 - top_percent/100)` of the best
    /// eligible score; 0 keeps only ties with the best.
    pub top_percent: f32,
    pub max_expect: f64,
    /// Minimum percent identity; matches reporting 0 identity always pass.
    pub min_identity: f32,
}

impl Default for ThresholdSelector {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            top_percent: 10.0,
            max_expect: 0.01,
            min_identity: 0.0,
        }
    }
}

impl ThresholdSelector {
    fn passes(&self, m: &MatchRecord) -> bool {
        m.bit_score >= self.min_score
            && m.expect <= self.max_expect
            && (m.percent_identity <= 0.0 || m.percent_identity >= self.min_identity)
    }
}

impl MatchSelector for ThresholdSelector {
    fn active_matches(&self, read: &ReadRecord) -> Vec<usize> {
        let best = read
            .matches
            .iter()
            .filter(|m| self.passes(m))
            .map(|m| m.bit_score)
            .fold(f32::NEG_INFINITY, f32::max);
        if best == f32::NEG_INFINITY {
            return Vec::new();
        }
        let cutoff = (1.0 - self.top_percent / 100.0) * best;
        read.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| self.passes(m) && m.bit_score >= cutoff)
            .map(|(i, _)| i)
            .collect()
    }
}
