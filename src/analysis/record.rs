use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of node a record was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Terminal node; frequency and length axes
    Word,
    /// Branching node with positive entropy; entropy axis
    Prefix,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Word => "word",
            RecordKind::Prefix => "prefix",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of one word or prefix, as seen by one collection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub string: String,
    pub kind: RecordKind,
    /// Effective end count for words, raw node count for prefixes
    pub count: u64,
    /// Length in characters (node depth)
    pub length: usize,
    /// Local entropy of the node, in bits
    pub entropy: f64,
    /// `count / total inserted words`
    pub frequency_rate: f64,
    /// Severity assigned by the classifier; lower sorts first
    pub score: f64,
}

impl Record {
    pub fn is_word(&self) -> bool {
        self.kind == RecordKind::Word
    }

    pub fn is_prefix(&self) -> bool {
        self.kind == RecordKind::Prefix
    }
}

/// Insertions accounted for by `records`, each insertion counted once
///
/// Word counts are effective end counts and never overlap. A prefix count
/// includes every insertion below it, so a prefix only adds when no shorter
/// prefix in the set already contains it.
pub fn covered_mass(records: &[Record]) -> u64 {
    let words: u64 = records.iter().filter(|r| r.is_word()).map(|r| r.count).sum();

    let mut prefixes: Vec<&Record> = records.iter().filter(|r| r.is_prefix()).collect();
    // an enclosing prefix sorts before everything it contains
    prefixes.sort_by(|a, b| a.string.cmp(&b.string));

    let mut outer: Option<&str> = None;
    let mut nested_free = 0;
    for record in prefixes {
        if matches!(outer, Some(o) if record.string.starts_with(o)) {
            continue;
        }
        outer = Some(record.string.as_str());
        nested_free += record.count;
    }
    words + nested_free
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(string: &str, kind: RecordKind, count: u64) -> Record {
        Record {
            string: string.to_string(),
            kind,
            count,
            length: string.chars().count(),
            entropy: 1.0,
            frequency_rate: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_nested_prefixes_count_once() {
        let records = [
            record("car", RecordKind::Prefix, 2),
            record("ca", RecordKind::Prefix, 4),
            record("d", RecordKind::Prefix, 3),
            record("cb", RecordKind::Prefix, 1),
        ];
        assert_eq!(covered_mass(&records), 4 + 3 + 1);
    }

    #[test]
    fn test_root_prefix_covers_everything() {
        let records = [
            record("ca", RecordKind::Prefix, 4),
            record("", RecordKind::Prefix, 5),
        ];
        assert_eq!(covered_mass(&records), 5);
    }

    #[test]
    fn test_word_counts_add_up() {
        let records = [
            record("car", RecordKind::Word, 1),
            record("cart", RecordKind::Word, 1),
        ];
        assert_eq!(covered_mass(&records), 2);
    }
}
