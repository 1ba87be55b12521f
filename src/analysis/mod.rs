// Trie-based anomaly analysis
//
// One collection pass turns the counting trie into word and prefix records.
// Percentile thresholds are derived from those records, and the records are
// partitioned into three independent anomaly sets:
//
// - frequency: words that occur rarely (low tail of word counts)
// - length: words whose length is unpopular (weighted length-bucket percentile)
// - entropy: prefixes whose branching is least predictable (high tail)
//
// `Analysis` borrows the trie for its whole lifetime, so the trie cannot be
// mutated or dropped while records, thresholds or node sets derived from it
// are still in use.

mod classifier;
mod collector;
mod marker;
mod record;
mod threshold;

pub use classifier::{
    classify, classify_entropy, classify_frequency, classify_length, exceeds_entropy_threshold,
    is_frequency_rare, is_length_rare, triggered_axes, AnomalyAxis, AnomalySets, Mode,
};
pub use collector::{
    collect_statistics, local_entropy, CorpusTotals, Extrema, LengthHistogram, Span, Statistics,
};
pub use marker::{mark_anomaly_nodes, mark_records, NodeSet};
pub use record::{covered_mass, Record, RecordKind};
pub use threshold::{
    entropy_threshold, frequency_threshold, length_frequency_threshold, percentile_index,
    Thresholds,
};

use crate::config::AnalysisConfig;
use crate::trie::StatTrie;

/// Statistics, thresholds and anomaly sets for one trie snapshot
///
/// # Example
/// ```
/// use stattrie::analysis::{Analysis, AnomalyAxis};
/// use stattrie::config::AnalysisConfig;
/// use stattrie::trie::StatTrie;
///
/// let mut trie = StatTrie::new();
/// for _ in 0..10 {
///     trie.insert("GET /index");
///     trie.insert("GET /login");
/// }
/// trie.insert("GET /admin");
///
/// let analysis = Analysis::collect(&trie, AnalysisConfig::default());
/// let rare = analysis.anomalies().get(AnomalyAxis::Frequency);
/// assert_eq!(rare[0].string, "GET /admin");
/// ```
#[derive(Debug)]
pub struct Analysis<'t> {
    trie: &'t StatTrie,
    config: AnalysisConfig,
    statistics: Statistics,
    thresholds: Thresholds,
    anomalies: AnomalySets,
}

impl<'t> Analysis<'t> {
    /// Collect statistics, compute thresholds and classify
    pub fn collect(trie: &'t StatTrie, config: AnalysisConfig) -> Self {
        let statistics = collect_statistics(trie);
        let thresholds = Thresholds::compute(&statistics, &config);
        for axis in AnomalyAxis::ALL {
            let computable = match axis {
                AnomalyAxis::Frequency => thresholds.frequency.is_some(),
                AnomalyAxis::Length => thresholds.length_frequency.is_some(),
                AnomalyAxis::Entropy => thresholds.entropy.is_some(),
            };
            if !computable {
                tracing::warn!(%axis, "no records for axis, threshold not computable");
            }
        }
        let anomalies = classify(&statistics.records, &thresholds);

        Self {
            trie,
            config,
            statistics,
            thresholds,
            anomalies,
        }
    }

    /// Recompute thresholds and anomaly sets with new percentiles
    ///
    /// The trie is unchanged (it is borrowed), so the records are reused.
    pub fn reclassify(&mut self, config: AnalysisConfig) {
        self.thresholds = Thresholds::compute(&self.statistics, &config);
        self.anomalies = classify(&self.statistics.records, &self.thresholds);
        self.config = config;
    }

    pub fn trie(&self) -> &'t StatTrie {
        self.trie
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn anomalies(&self) -> &AnomalySets {
        &self.anomalies
    }

    /// Records for a listing: every record for [`Mode::All`], else one axis
    pub fn records(&self, mode: Mode) -> &[Record] {
        match mode {
            Mode::All => &self.statistics.records,
            Mode::Axis(axis) => self.anomalies.get(axis),
        }
    }

    /// Nodes flagged under `mode`
    pub fn mark_anomaly_nodes(&self, mode: Mode) -> NodeSet {
        let mut nodes = NodeSet::default();
        mark_anomaly_nodes(self.trie, &self.anomalies, mode, &mut nodes);
        nodes
    }

    /// Fraction of inserted-word mass covered by one axis, at most 1
    pub fn anomaly_rate(&self, axis: AnomalyAxis) -> f64 {
        self.statistics
            .totals
            .rate(covered_mass(self.anomalies.get(axis)))
    }
}
