//! Trie build and analysis benchmark
//!
//! Measures the two hot phases of the pipeline on a synthetic request log:
//!
//! 1. Building the counting trie from cleaned lines
//! 2. `Analysis::collect` (statistics, thresholds, classification)
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench trie_analysis
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stattrie::analysis::{Analysis, Mode};
use stattrie::config::AnalysisConfig;
use stattrie::tree_export::trim_tree;
use stattrie::trie::StatTrie;

/// Deterministic corpus with a skewed popularity distribution
fn synthetic_corpus(n: usize) -> Vec<String> {
    const VERBS: [&str; 4] = ["get", "post", "put", "delete"];
    (0..n)
        .map(|i| {
            // LCG keeps the corpus reproducible without an RNG dependency
            let x = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let resource = (x >> 33) % 64;
            let id = (x >> 17) % (1 + resource * 4);
            format!("{} /api/r{}/{}", VERBS[(x % 4) as usize], resource, id)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_build");
    for size in [1_000, 10_000, 50_000] {
        let corpus = synthetic_corpus(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            b.iter(|| {
                let trie: StatTrie = corpus.iter().collect();
                black_box(trie.total_nodes())
            });
        });
    }
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_collect");
    for size in [1_000, 10_000, 50_000] {
        let trie: StatTrie = synthetic_corpus(size).iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &trie, |b, trie| {
            b.iter(|| {
                let analysis = Analysis::collect(trie, AnalysisConfig::default());
                black_box(analysis.anomalies().total())
            });
        });
    }
    group.finish();
}

fn bench_trim(c: &mut Criterion) {
    let trie: StatTrie = synthetic_corpus(10_000).iter().collect();
    let analysis = Analysis::collect(&trie, AnalysisConfig::default());
    let marked = analysis.mark_anomaly_nodes(Mode::All);
    c.bench_function("trim_tree_10000", |b| {
        b.iter(|| black_box(trim_tree(&trie, &marked).node_count()))
    });
}

criterion_group!(benches, bench_build, bench_analysis, bench_trim);
criterion_main!(benches);
