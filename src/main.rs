use anyhow::{Context, Result};
use clap::Parser;
use stattrie::analysis::{Analysis, AnomalyAxis};
use stattrie::cli::Cli;
use stattrie::preprocess::{Preprocessor, CLEANED_FILE};
use stattrie::tree_export::{self, TreeSelection};
use stattrie::trie::StatTrie;
use stattrie::{csv_output, report};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber: TRACE with --debug, else RUST_LOG or info
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path, preprocessor: &Preprocessor) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    preprocessor
        .clean_reader(BufReader::new(file))
        .with_context(|| format!("Cannot read {}", path.display()))
}

fn write_cleaned(path: &Path, sequences: &[String]) {
    let mut content = sequences.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    match fs::write(path, content) {
        Ok(()) => tracing::info!(path = %path.display(), "cleaned corpus written"),
        Err(e) => tracing::error!(path = %path.display(), error = %e, "cannot write cleaned corpus"),
    }
}

/// CLI flags first, then trees listed in the config, each selection once
fn json_targets(args: &Cli, analysis: &Analysis<'_>) -> Vec<(TreeSelection, PathBuf)> {
    let mut targets = args.json_exports();
    let (configured, rejected) = analysis.config().export.json_trees();
    for e in rejected {
        tracing::warn!(error = %e, "skipping json export");
    }
    for selection in configured {
        if !targets.iter().any(|(s, _)| *s == selection) {
            targets.push((selection, args.output_path(selection.file_name())));
        }
    }
    targets
}

/// Write every requested output; a failed export is logged and skipped
fn export_all(args: &Cli, analysis: &Analysis<'_>) -> usize {
    let mut failures = 0;

    if let Err(e) = report::export_report(analysis, args.output_path(report::REPORT_FILE)) {
        tracing::error!(error = %e, "report export failed");
        failures += 1;
    }

    let (modes, rejected) = analysis.config().export.csv_modes();
    for e in rejected {
        tracing::warn!(error = %e, "skipping csv export");
    }
    for mode in modes {
        let path = args.output_path(csv_output::file_name(mode));
        if let Err(e) = csv_output::export_csv(analysis, mode, path) {
            tracing::error!(%mode, error = %e, "csv export failed");
            failures += 1;
        }
    }

    for (selection, path) in json_targets(args, analysis) {
        let marked = analysis.mark_anomaly_nodes(selection.mode());
        let result = match selection {
            TreeSelection::Complete => tree_export::export_full_json(analysis.trie(), &marked, &path),
            TreeSelection::Partial(_) => {
                tree_export::export_partial_json(analysis.trie(), &marked, &path)
            }
        };
        if let Err(e) = result {
            tracing::error!(?selection, error = %e, "json export failed");
            failures += 1;
        }
    }

    failures
}

fn print_summary(analysis: &Analysis<'_>, output_dir: &Path) {
    let totals = &analysis.statistics().totals;
    println!(
        "Analyzed {} words ({} unique, {} nodes)",
        totals.inserted_words, totals.unique_words, totals.nodes
    );
    for axis in AnomalyAxis::ALL {
        println!(
            "{:<10} anomalies: {:>6} ({:.2}% of inserted words)",
            axis,
            analysis.anomalies().get(axis).len(),
            analysis.anomaly_rate(axis) * 100.0
        );
    }
    println!("Results written to {}", output_dir.display());
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.analysis_config()?;
    let preprocessor = args.preprocessor()?;

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Cannot create {}", args.output_dir.display()))?;

    let sequences = read_input(&args.input, &preprocessor)?;
    write_cleaned(&args.output_path(CLEANED_FILE), &sequences);

    let trie: StatTrie = sequences.iter().collect();
    tracing::info!(
        inserted = trie.total_inserted_words(),
        unique = trie.total_unique_words(),
        nodes = trie.total_nodes(),
        "trie built"
    );

    let analysis = Analysis::collect(&trie, config);
    let failures = export_all(&args, &analysis);
    if failures > 0 {
        tracing::warn!(failures, "some exports failed");
    }

    print_summary(&analysis, &args.output_dir);
    Ok(())
}
