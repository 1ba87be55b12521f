//! Single-pass statistics collection over the trie

use super::record::{Record, RecordKind};
use crate::trie::{NodeRef, StatTrie};
use std::collections::BTreeMap;

/// Length in characters → number of unique words of that length
pub type LengthHistogram = BTreeMap<usize, u64>;

/// Smallest and largest value seen for one metric
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Span<T> {
    fn observe(span: &mut Option<Self>, value: T) {
        match span {
            Some(s) => {
                if value < s.min {
                    s.min = value;
                }
                if value > s.max {
                    s.max = value;
                }
            }
            None => {
                *span = Some(Span {
                    min: value,
                    max: value,
                })
            }
        }
    }
}

/// Running extrema for reporting; `None` when no record fed the metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extrema {
    /// Word counts
    pub count: Option<Span<u64>>,
    /// Word lengths
    pub length: Option<Span<usize>>,
    /// Prefix entropies
    pub entropy: Option<Span<f64>>,
}

/// Corpus totals copied from the trie at collection time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusTotals {
    pub nodes: usize,
    pub inserted_words: u64,
    pub unique_words: u64,
    pub unique_word_chars: u64,
}

impl CorpusTotals {
    pub fn of(trie: &StatTrie) -> Self {
        Self {
            nodes: trie.total_nodes(),
            inserted_words: trie.total_inserted_words(),
            unique_words: trie.total_unique_words(),
            unique_word_chars: trie.total_unique_word_characters(),
        }
    }

    /// `count / inserted_words`, or 0 for an empty corpus
    pub fn rate(&self, count: u64) -> f64 {
        if self.inserted_words == 0 {
            0.0
        } else {
            count as f64 / self.inserted_words as f64
        }
    }
}

/// Everything one traversal produced
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Records in traversal order; a node may contribute a prefix and a word
    pub records: Vec<Record>,
    pub length_histogram: LengthHistogram,
    pub extrema: Extrema,
    pub totals: CorpusTotals,
}

impl Statistics {
    pub fn words(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_word())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_prefix())
    }

    /// Number of unique words sharing `length`
    pub fn length_population(&self, length: usize) -> u64 {
        self.length_histogram.get(&length).copied().unwrap_or(0)
    }
}

/// Shannon entropy (bits) of the branching distribution at `node`
///
/// Outcomes are the children's counts plus, for a terminal node, the mass
/// that stops here. A node with a zero count has no distribution and
/// yields 0.
pub fn local_entropy(node: NodeRef<'_>) -> f64 {
    let total = node.count();
    if total == 0 {
        tracing::debug!(node = node.id().index(), "entropy requested for empty node");
        return 0.0;
    }

    let total = total as f64;
    let term = |count: u64| {
        if count == 0 {
            return 0.0;
        }
        let p = count as f64 / total;
        -p * p.log2()
    };

    let mut h: f64 = node.children().map(|(_, child)| term(child.count())).sum();
    if node.is_end() {
        h += term(node.effective_end_count());
    }
    // -0.0 and rounding dust from a single certain outcome
    h.max(0.0)
}

/// Walk the trie once and build per-node records
pub fn collect_statistics(trie: &StatTrie) -> Statistics {
    let totals = CorpusTotals::of(trie);
    let mut stats = Statistics {
        totals,
        ..Statistics::default()
    };

    trie.traverse(|node, prefix| {
        let entropy = local_entropy(node);
        let length = prefix.chars().count();

        if entropy > 0.0 {
            let count = node.count();
            stats.records.push(Record {
                string: prefix.to_string(),
                kind: RecordKind::Prefix,
                count,
                length,
                entropy,
                frequency_rate: totals.rate(count),
                score: 0.0,
            });
            Span::observe(&mut stats.extrema.entropy, entropy);
        }

        if node.is_end() {
            let count = node.effective_end_count();
            stats.records.push(Record {
                string: prefix.to_string(),
                kind: RecordKind::Word,
                count,
                length,
                entropy,
                frequency_rate: totals.rate(count),
                score: 0.0,
            });
            *stats.length_histogram.entry(length).or_insert(0) += 1;
            Span::observe(&mut stats.extrema.count, count);
            Span::observe(&mut stats.extrema.length, length);
        }
    });

    tracing::debug!(
        records = stats.records.len(),
        lengths = stats.length_histogram.len(),
        "statistics collected"
    );
    stats
}
