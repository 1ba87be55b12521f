//! Three-way anomaly classification
//!
//! Frequency and length flag the low tail (`<= threshold`), entropy flags the
//! high tail (`>= threshold`). Each set is sorted by ascending score with the
//! string as tie-break, so the most severe entry comes first.

use super::record::Record;
use super::threshold::Thresholds;
use crate::error::StatTrieError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One independent rarity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyAxis {
    Frequency,
    Length,
    Entropy,
}

impl AnomalyAxis {
    pub const ALL: [AnomalyAxis; 3] = [
        AnomalyAxis::Frequency,
        AnomalyAxis::Length,
        AnomalyAxis::Entropy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnomalyAxis::Frequency => "frequency",
            AnomalyAxis::Length => "length",
            AnomalyAxis::Entropy => "entropy",
        }
    }
}

impl fmt::Display for AnomalyAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Mode selector for classifier, marker and export dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Union of the three axes (or every record, for listings)
    All,
    Axis(AnomalyAxis),
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Axis(axis) => axis.name(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Mode {
    type Err = StatTrieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "all" => Ok(Mode::All),
            "f" | "freq" | "frequency" => Ok(Mode::Axis(AnomalyAxis::Frequency)),
            "l" | "len" | "length" => Ok(Mode::Axis(AnomalyAxis::Length)),
            "e" | "entropy" => Ok(Mode::Axis(AnomalyAxis::Entropy)),
            _ => Err(StatTrieError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Anomalous records per axis; a record may appear in several sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalySets {
    pub frequency: Vec<Record>,
    pub length: Vec<Record>,
    pub entropy: Vec<Record>,
}

impl AnomalySets {
    pub fn get(&self, axis: AnomalyAxis) -> &[Record] {
        match axis {
            AnomalyAxis::Frequency => &self.frequency,
            AnomalyAxis::Length => &self.length,
            AnomalyAxis::Entropy => &self.entropy,
        }
    }

    pub fn total(&self) -> usize {
        self.frequency.len() + self.length.len() + self.entropy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Word count at or below the frequency cutoff
pub fn is_frequency_rare(record: &Record, thresholds: &Thresholds) -> bool {
    record.is_word() && thresholds.frequency.is_some_and(|t| record.count <= t)
}

/// Length bucket population at or below the length cutoff
pub fn is_length_rare(record: &Record, thresholds: &Thresholds) -> bool {
    record.is_word()
        && thresholds
            .length_frequency
            .is_some_and(|t| thresholds.length_population(record.length) <= t)
}

/// Prefix entropy at or ABOVE the entropy cutoff (high tail)
pub fn exceeds_entropy_threshold(record: &Record, thresholds: &Thresholds) -> bool {
    record.is_prefix() && thresholds.entropy.is_some_and(|t| record.entropy >= t)
}

/// Axes a record triggers, in canonical order
pub fn triggered_axes(record: &Record, thresholds: &Thresholds) -> Vec<AnomalyAxis> {
    AnomalyAxis::ALL
        .into_iter()
        .filter(|&axis| match axis {
            AnomalyAxis::Frequency => is_frequency_rare(record, thresholds),
            AnomalyAxis::Length => is_length_rare(record, thresholds),
            AnomalyAxis::Entropy => exceeds_entropy_threshold(record, thresholds),
        })
        .collect()
}

/// Partition records into the three anomaly sets
pub fn classify(records: &[Record], thresholds: &Thresholds) -> AnomalySets {
    AnomalySets {
        frequency: classify_frequency(records, thresholds),
        length: classify_length(records, thresholds),
        entropy: classify_entropy(records, thresholds),
    }
}

/// Frequency-rare words, score = count (rarest first)
pub fn classify_frequency(records: &[Record], thresholds: &Thresholds) -> Vec<Record> {
    select(records, |r| {
        is_frequency_rare(r, thresholds).then_some(r.count as f64)
    })
}

/// Length-rare words, score = length bucket population
pub fn classify_length(records: &[Record], thresholds: &Thresholds) -> Vec<Record> {
    select(records, |r| {
        is_length_rare(r, thresholds).then(|| thresholds.length_population(r.length) as f64)
    })
}

/// Entropy-rare prefixes, score = -entropy (highest entropy first)
pub fn classify_entropy(records: &[Record], thresholds: &Thresholds) -> Vec<Record> {
    select(records, |r| {
        exceeds_entropy_threshold(r, thresholds).then_some(-r.entropy)
    })
}

fn select<F>(records: &[Record], score: F) -> Vec<Record>
where
    F: Fn(&Record) -> Option<f64>,
{
    let mut selected: Vec<Record> = records
        .iter()
        .filter_map(|r| {
            score(r).map(|s| Record {
                score: s,
                ..r.clone()
            })
        })
        .collect();
    selected.sort_by(by_severity);
    selected
}

fn by_severity(a: &Record, b: &Record) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.string.cmp(&b.string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::RecordKind;

    fn word(s: &str, count: u64) -> Record {
        Record {
            string: s.to_string(),
            kind: RecordKind::Word,
            count,
            length: s.chars().count(),
            entropy: 0.0,
            frequency_rate: 0.0,
            score: 0.0,
        }
    }

    fn prefix(s: &str, entropy: f64) -> Record {
        Record {
            kind: RecordKind::Prefix,
            entropy,
            ..word(s, 10)
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("a".parse::<Mode>().unwrap(), Mode::All);
        assert_eq!(
            "Entropy".parse::<Mode>().unwrap(),
            Mode::Axis(AnomalyAxis::Entropy)
        );
        assert_eq!("l".parse::<Mode>().unwrap(), Mode::Axis(AnomalyAxis::Length));
        assert!(matches!(
            "x".parse::<Mode>(),
            Err(StatTrieError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_frequency_sorted_rarest_first_with_ties_by_string() {
        let records = vec![word("zz", 1), word("aa", 1), word("mid", 3), word("big", 9)];
        let thresholds = Thresholds {
            frequency: Some(3),
            ..Thresholds::default()
        };
        let rare = classify_frequency(&records, &thresholds);
        let names: Vec<_> = rare.iter().map(|r| r.string.as_str()).collect();
        assert_eq!(names, vec!["aa", "zz", "mid"]);
        assert_eq!(rare[2].score, 3.0);
    }

    #[test]
    fn test_entropy_flags_high_tail() {
        let records = vec![prefix("lo", 0.2), prefix("hi", 2.5), prefix("top", 3.0), word("w", 1)];
        let thresholds = Thresholds {
            entropy: Some(2.5),
            ..Thresholds::default()
        };
        let rare = classify_entropy(&records, &thresholds);
        let names: Vec<_> = rare.iter().map(|r| r.string.as_str()).collect();
        assert_eq!(names, vec!["top", "hi"]);
        assert_eq!(rare[0].score, -3.0);
    }

    #[test]
    fn test_length_uses_bucket_population() {
        let records = vec![word("abc", 5), word("abd", 5), word("abcdefgh", 5)];
        let thresholds = Thresholds {
            length_frequency: Some(1),
            length_histogram: [(3, 2), (8, 1)].into_iter().collect(),
            ..Thresholds::default()
        };
        let rare = classify_length(&records, &thresholds);
        assert_eq!(rare.len(), 1);
        assert_eq!(rare[0].string, "abcdefgh");
        assert_eq!(rare[0].score, 1.0);
    }

    #[test]
    fn test_missing_threshold_flags_nothing() {
        let records = vec![word("a", 1), prefix("", 1.0)];
        let sets = classify(&records, &Thresholds::default());
        assert!(sets.is_empty());
    }

    #[test]
    fn test_triggered_axes() {
        let thresholds = Thresholds {
            frequency: Some(1),
            length_frequency: Some(1),
            entropy: Some(1.0),
            length_histogram: [(1, 1)].into_iter().collect(),
        };
        assert_eq!(
            triggered_axes(&word("a", 1), &thresholds),
            vec![AnomalyAxis::Frequency, AnomalyAxis::Length]
        );
        assert_eq!(
            triggered_axes(&prefix("a", 1.5), &thresholds),
            vec![AnomalyAxis::Entropy]
        );
    }
}
