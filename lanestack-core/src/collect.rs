//! Reference aggregator
//!
//! Consumes the upstream read/match stream, detects the run's alignment
//! flavor once, and buckets (read header, read sequence, match text) triples
//! by reference key. Any given reference holds at most one triple per read;
//! the first-seen match wins.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::progress::Progress;
use crate::scan;
use crate::source::{MatchSelector, ReadRecord, SourceError};
use crate::types::{first_line, first_word, CollectStats, Flavor, ReadMatch, StackConfig};

/// Marker whose second occurrence bounds the first local-alignment block of a
/// match text.
const SCORE_MARKER: &str = "Score =";

/// Identity floor applied when the identity filter is enabled.
const IDENTITY_THRESHOLD: f32 = 97.0;

/// Collects read/match triples per reference key for one run.
#[derive(Debug)]
pub struct MatchCollector {
    config: StackConfig,
    flavor: Flavor,
    buckets: BTreeMap<String, Vec<ReadMatch>>,
    stats: CollectStats,
}

impl MatchCollector {
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            flavor: Flavor::Unknown,
            buckets: BTreeMap::new(),
            stats: CollectStats::default(),
        }
    }

    /// Runs one collection pass over `reads`.
    ///
    /// Eligibility of individual matches is decided by `selector`.
    /// Cancellation stops the pass promptly but keeps the buckets collected
    /// so far; fatal [`SourceError`]s abort and leave the collector empty of
    /// guarantees.
    pub fn collect<I>(
        &mut self,
        reads: I,
        selector: &dyn MatchSelector,
        progress: &mut dyn Progress,
    ) -> Result<CollectStats, SourceError>
    where
        I: IntoIterator<Item = Result<ReadRecord, SourceError>>,
    {
        self.buckets.clear();
        self.flavor = Flavor::Unknown;
        self.stats = CollectStats::default();

        let mut warned_missing_text = false;
        let mut warned_unknown_flavor = false;
        let mut any_active = false;
        let mut any_text = false;
        let mut cancelled = false;
        // read names already recorded per reference key, for dedup
        let mut seen: HashMap<String, HashSet<String>> = HashMap::new();
        // reference keys this read contributed to in the current pass
        let mut keys_for_read: HashSet<String> = HashSet::new();

        progress.set_task("Alignment stacker", "Collecting data");
        log::info!("Collecting data...");

        let mut count = 0u64;
        for read in reads {
            if progress.check_cancelled().is_err() {
                log::warn!("Collection cancelled, dataset may be incomplete");
                cancelled = true;
                break;
            }
            let read = read?;
            self.stats.reads_seen += 1;
            count += 1;

            let active = selector.active_matches(&read);
            if !active.is_empty() {
                any_active = true;
                let header = normalize_header(&read.header);
                let read_name = first_word(&header).to_string();
                let sequence: String = read
                    .sequence
                    .as_deref()
                    .ok_or_else(|| SourceError::MissingSequence(read_name.clone()))?
                    .split_whitespace()
                    .collect();

                let mut read_used = false;
                for index in active {
                    let Some(record) = read.matches.get(index) else {
                        continue;
                    };
                    let Some(text) = record.text.as_deref() else {
                        if !warned_missing_text {
                            log::warn!("Match text missing, skipping match");
                            warned_missing_text = true;
                        }
                        continue;
                    };
                    any_text = true;
                    if self.config.identity_filter
                        && record.percent_identity > 0.0
                        && record.percent_identity < IDENTITY_THRESHOLD
                    {
                        continue;
                    }

                    let match_text = scan::remove_reference_header(
                        scan::truncate_before_second_occurrence(text, SCORE_MARKER),
                    )
                    .to_string();
                    let key = first_line(text).to_string();

                    if self.flavor == Flavor::Unknown {
                        match scan::guess_flavor(&match_text) {
                            Flavor::Unknown => {
                                if !warned_unknown_flavor {
                                    log::warn!("Unknown report format encountered");
                                    warned_unknown_flavor = true;
                                }
                                continue;
                            }
                            flavor => {
                                log::info!("Detected {flavor} matches");
                                self.flavor = flavor;
                            }
                        }
                    }

                    let names = seen.entry(key.clone()).or_default();
                    if !names.contains(&read_name) {
                        names.insert(read_name.clone());
                        // a read never contributes two matches to the same
                        // reference within one pass
                        if keys_for_read.insert(key.clone()) {
                            self.buckets.entry(key).or_default().push(ReadMatch {
                                header: header.clone(),
                                sequence: sequence.clone(),
                                match_text,
                            });
                            read_used = true;
                        }
                    }
                }
                if read_used {
                    self.stats.reads_used += 1;
                }
                keys_for_read.clear();
            }

            if count % 100 == 0 {
                progress.set_subtask(&format!("Collecting data ({count} reads processed)"));
                progress.set_progress(count);
            }
        }

        if !cancelled && !any_active {
            return Err(SourceError::NoActiveMatches);
        }
        if !cancelled && !any_text {
            return Err(SourceError::MissingAlignmentSupport);
        }

        if self.config.min_reads > 1 {
            let before = self.buckets.len();
            let min_reads = self.config.min_reads;
            self.buckets.retain(|_, rows| rows.len() >= min_reads);
            let dropped = before - self.buckets.len();
            if dropped > 0 {
                log::info!("Removed {dropped} references with fewer than {min_reads} reads");
            }
        }
        self.stats.references = self.buckets.len();

        log::info!("Reads total: {}", self.stats.reads_seen);
        log::info!("Reads used:  {}", self.stats.reads_used);
        log::info!("References:  {}", self.stats.references);

        if self.flavor == Flavor::Unknown {
            return Err(SourceError::UnknownFlavor);
        }
        Ok(self.stats)
    }

    /// The flavor locked during the last pass.
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }

    /// Reference keys in deterministic (sorted) order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Rows collected for one reference key, in stored order.
    pub fn rows(&self, reference: &str) -> Option<&[ReadMatch]> {
        self.buckets.get(reference).map(Vec::as_slice)
    }

    pub fn row_count(&self, reference: &str) -> usize {
        self.buckets.get(reference).map_or(0, Vec::len)
    }

    pub fn num_references(&self) -> usize {
        self.buckets.len()
    }
}

/// Strips line breaks and a leading '>' from a read header.
fn normalize_header(header: &str) -> String {
    let cleaned: String = header.chars().filter(|ch| *ch != '\r' && *ch != '\n').collect();
    match cleaned.strip_prefix('>') {
        Some(rest) => rest.trim().to_string(),
        None => cleaned,
    }
}
