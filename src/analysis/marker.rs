//! Map anomalous records back to trie nodes

use super::classifier::{AnomalyAxis, AnomalySets, Mode};
use super::record::Record;
use crate::trie::{NodeId, StatTrie};
use fnv::FnvHashSet;

/// Set of nodes, deduplicated by identity
pub type NodeSet = FnvHashSet<NodeId>;

/// Resolve each record's string to its node and add it to `nodes`
///
/// Each string is resolved with a prefix-bounded walk, never a full
/// traversal. Strings whose path no longer exists are skipped.
pub fn mark_records(trie: &StatTrie, records: &[Record], nodes: &mut NodeSet) {
    for record in records {
        let mut reached = None;
        if trie.traverse_prefix(&record.string, |node, _| reached = Some(node.id())) {
            if let Some(id) = reached {
                nodes.insert(id);
            }
        }
    }
}

/// Mark the nodes of one axis, or of all three for [`Mode::All`]
pub fn mark_anomaly_nodes(trie: &StatTrie, sets: &AnomalySets, mode: Mode, nodes: &mut NodeSet) {
    match mode {
        Mode::All => {
            for axis in AnomalyAxis::ALL {
                mark_records(trie, sets.get(axis), nodes);
            }
        }
        Mode::Axis(axis) => mark_records(trie, sets.get(axis), nodes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::RecordKind;

    fn record(s: &str, kind: RecordKind) -> Record {
        Record {
            string: s.to_string(),
            kind,
            count: 1,
            length: s.chars().count(),
            entropy: 0.0,
            frequency_rate: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_mark_resolves_node_identity() {
        let trie: StatTrie = ["cat", "car"].into_iter().collect();
        let mut nodes = NodeSet::default();
        mark_records(&trie, &[record("cat", RecordKind::Word)], &mut nodes);
        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains(&trie.find("cat").unwrap()));
    }

    #[test]
    fn test_mark_skips_missing_paths() {
        let trie: StatTrie = ["cat"].into_iter().collect();
        let mut nodes = NodeSet::default();
        mark_records(&trie, &[record("cow", RecordKind::Word)], &mut nodes);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_all_mode_dedups_shared_nodes() {
        let trie: StatTrie = ["to", "top", "tor"].into_iter().collect();
        let sets = AnomalySets {
            frequency: vec![record("to", RecordKind::Word)],
            length: vec![record("to", RecordKind::Word), record("top", RecordKind::Word)],
            entropy: vec![record("to", RecordKind::Prefix)],
        };
        let mut nodes = NodeSet::default();
        mark_anomaly_nodes(&trie, &sets, Mode::All, &mut nodes);
        assert_eq!(nodes.len(), 2);

        let mut entropy_only = NodeSet::default();
        mark_anomaly_nodes(
            &trie,
            &sets,
            Mode::Axis(AnomalyAxis::Entropy),
            &mut entropy_only,
        );
        assert_eq!(entropy_only.len(), 1);
    }

    #[test]
    fn test_root_prefix_marks_root() {
        let trie: StatTrie = ["a", "b"].into_iter().collect();
        let mut nodes = NodeSet::default();
        mark_records(&trie, &[record("", RecordKind::Prefix)], &mut nodes);
        assert!(nodes.contains(&NodeId::ROOT));
    }
}
