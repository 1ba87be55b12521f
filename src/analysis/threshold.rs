//! Percentile thresholds for the three anomaly axes
//!
//! All thresholds are recomputed from scratch from one [`Statistics`]
//! value. An axis with no records has no threshold (`None`) rather than an
//! out-of-bounds read.

use super::collector::{LengthHistogram, Statistics};
use crate::config::AnalysisConfig;

/// Cutoffs derived from one statistics pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thresholds {
    /// Word counts at or below this are frequency-rare
    pub frequency: Option<u64>,
    /// Prefix entropies at or above this are entropy-rare
    pub entropy: Option<f64>,
    /// Length buckets whose population is at or below this are length-rare
    pub length_frequency: Option<u64>,
    pub length_histogram: LengthHistogram,
}

impl Thresholds {
    /// Compute all three thresholds for the given percentiles
    pub fn compute(stats: &Statistics, config: &AnalysisConfig) -> Self {
        let counts: Vec<u64> = stats.words().map(|r| r.count).collect();
        let entropies: Vec<f64> = stats.prefixes().map(|r| r.entropy).collect();

        let thresholds = Self {
            frequency: frequency_threshold(counts, config.freq_percentile),
            entropy: entropy_threshold(entropies, config.entropy_percentile),
            length_frequency: length_frequency_threshold(
                &stats.length_histogram,
                config.len_percentile,
                stats.totals.inserted_words,
            ),
            length_histogram: stats.length_histogram.clone(),
        };

        tracing::debug!(
            frequency = ?thresholds.frequency,
            entropy = ?thresholds.entropy,
            length_frequency = ?thresholds.length_frequency,
            "thresholds computed"
        );
        thresholds
    }

    /// Population of the length bucket `length` falls into
    pub fn length_population(&self, length: usize) -> u64 {
        self.length_histogram.get(&length).copied().unwrap_or(0)
    }
}

/// Index of `percentile` within `n` sorted values, clamped to `[0, n-1]`
///
/// `n` must be positive.
pub fn percentile_index(percentile: f64, n: usize) -> usize {
    let raw = (percentile / 100.0 * n as f64).floor();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(n - 1)
    }
}

/// Word count at `percentile` of the ascending count distribution
pub fn frequency_threshold(mut counts: Vec<u64>, percentile: f64) -> Option<u64> {
    if counts.is_empty() {
        return None;
    }
    counts.sort_unstable();
    Some(counts[percentile_index(percentile, counts.len())])
}

/// Prefix entropy at `percentile` of the ascending entropy distribution
pub fn entropy_threshold(mut entropies: Vec<f64>, percentile: f64) -> Option<f64> {
    if entropies.is_empty() {
        return None;
    }
    entropies.sort_unstable_by(f64::total_cmp);
    Some(entropies[percentile_index(percentile, entropies.len())])
}

/// Weighted percentile over length popularity
///
/// Buckets are ordered by ascending population (ties by length) and their
/// populations accumulated until the running sum first reaches
/// `percentile% · total_words`. The population of the bucket where the walk
/// stops is the threshold. If the target is never reached the walk stops at
/// the last bucket.
pub fn length_frequency_threshold(
    histogram: &LengthHistogram,
    percentile: f64,
    total_words: u64,
) -> Option<u64> {
    let mut buckets: Vec<(usize, u64)> = histogram.iter().map(|(&l, &n)| (l, n)).collect();
    if buckets.is_empty() {
        return None;
    }
    buckets.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let target = percentile / 100.0 * total_words as f64;
    let mut idx = 0;
    let mut cumulative = buckets[0].1;
    while (cumulative as f64) < target && idx + 1 < buckets.len() {
        idx += 1;
        cumulative += buckets[idx].1;
    }
    if (cumulative as f64) < target {
        tracing::debug!(target, cumulative, "length percentile not reached, using last bucket");
    }
    Some(buckets[idx].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_index_clamps() {
        assert_eq!(percentile_index(0.0, 10), 0);
        assert_eq!(percentile_index(5.0, 10), 0);
        assert_eq!(percentile_index(50.0, 10), 5);
        assert_eq!(percentile_index(99.0, 10), 9);
        assert_eq!(percentile_index(100.0, 10), 9);
        assert_eq!(percentile_index(-3.0, 10), 0);
        assert_eq!(percentile_index(100.0, 1), 0);
    }

    #[test]
    fn test_frequency_threshold() {
        let counts = vec![10, 1, 12, 11, 10, 10, 10, 13, 10, 10];
        assert_eq!(frequency_threshold(counts.clone(), 0.0), Some(1));
        assert_eq!(frequency_threshold(counts.clone(), 10.0), Some(10));
        assert_eq!(frequency_threshold(counts, 100.0), Some(13));
        assert_eq!(frequency_threshold(Vec::new(), 5.0), None);
    }

    #[test]
    fn test_entropy_threshold_high_percentile() {
        let entropies = vec![0.5, 1.0, 2.0, 1.5];
        assert_eq!(entropy_threshold(entropies.clone(), 95.0), Some(2.0));
        assert_eq!(entropy_threshold(entropies, 50.0), Some(1.5));
        assert_eq!(entropy_threshold(Vec::new(), 95.0), None);
    }

    #[test]
    fn test_length_threshold_walks_by_population() {
        // lengths 3 and 4 are popular, 9 and 12 are rare
        let histogram: LengthHistogram =
            [(3, 40), (4, 50), (9, 2), (12, 1)].into_iter().collect();
        // target 5% of 93 = 4.65: 1, 1+2=3, 3+40=43 stops at population 40
        assert_eq!(length_frequency_threshold(&histogram, 5.0, 93), Some(40));
        // target 2% of 93 = 1.86: 1, 1+2=3 stops at population 2
        assert_eq!(length_frequency_threshold(&histogram, 2.0, 93), Some(2));
        assert_eq!(length_frequency_threshold(&histogram, 0.0, 93), Some(1));
    }

    #[test]
    fn test_length_threshold_unreachable_target_clamps() {
        let histogram: LengthHistogram = [(2, 1), (5, 3)].into_iter().collect();
        // weighted mass (100 words) far exceeds the 4 unique words
        assert_eq!(length_frequency_threshold(&histogram, 50.0, 100), Some(3));
    }

    #[test]
    fn test_length_threshold_empty() {
        assert_eq!(
            length_frequency_threshold(&LengthHistogram::new(), 5.0, 0),
            None
        );
    }

    #[test]
    fn test_thresholds_compute_on_empty_statistics() {
        let thresholds = Thresholds::compute(&Statistics::default(), &AnalysisConfig::default());
        assert_eq!(thresholds, Thresholds::default());
    }
}
