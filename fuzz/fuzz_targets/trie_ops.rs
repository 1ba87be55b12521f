#![no_main]

use libfuzzer_sys::fuzz_target;
use stattrie::analysis::{Analysis, Mode};
use stattrie::config::AnalysisConfig;
use stattrie::preprocess::LineCleaner;
use stattrie::trie::StatTrie;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Cleaned lines are inserted, every other raw line is then removed
    let cleaner = LineCleaner::new().with_delimiters(";");
    let mut trie = StatTrie::new();
    for line in input.lines() {
        for seq in cleaner.clean_line(line) {
            trie.insert(&seq);
        }
    }
    for line in input.lines().step_by(2) {
        trie.remove(line);
    }

    let mut end_mass = 0;
    trie.traverse(|node, _| {
        let children: u64 = node.children().map(|(_, c)| c.count()).sum();
        assert!(node.count() >= children);
        end_mass += node.effective_end_count();
    });
    assert_eq!(end_mass, trie.total_inserted_words());

    let analysis = Analysis::collect(&trie, AnalysisConfig::default());
    let _ = analysis.mark_anomaly_nodes(Mode::All);
});
