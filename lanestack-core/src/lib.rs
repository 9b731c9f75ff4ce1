//! Lanestack Core Library
//!
//! Turns per-read local-alignment reports against shared references into
//! per-reference multiple alignments: a reconstructed consensus, one lane per
//! read, and merged insertion columns.

pub mod alignment;
pub mod assemble;
pub mod collect;
pub mod gapped;
pub mod io;
pub mod merge;
pub mod progress;
pub mod scan;
pub mod source;
pub mod types;

// Re-export commonly used types and functions
pub use alignment::{Alignment, Lane};
pub use assemble::assemble_reference;
pub use collect::MatchCollector;
pub use merge::{merge_insertions, InsertionMap};
pub use progress::{CancelFlag, Cancelled, NoProgress, Progress};
pub use source::{MatchRecord, MatchSelector, ReadRecord, SourceError, ThresholdSelector};
pub use types::{BuildStats, CollectStats, Flavor, MoleculeType, ReadMatch, StackConfig};

/// Version information for the lanestack core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
