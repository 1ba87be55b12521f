//! Plain-text overall report

use crate::analysis::{Analysis, AnomalyAxis, Span};
use crate::error::{Result, StatTrieError};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

pub const REPORT_FILE: &str = "overall_report.txt";

/// Render the report for an analysis
pub fn render(analysis: &Analysis<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, analysis);
    out
}

/// Write the report to `path`
pub fn export_report<P: AsRef<Path>>(analysis: &Analysis<'_>, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render(analysis)).map_err(|e| StatTrieError::io(path, e))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

fn write_report(out: &mut String, analysis: &Analysis<'_>) -> fmt::Result {
    let stats = analysis.statistics();
    let totals = &stats.totals;
    let config = analysis.config();
    let thresholds = analysis.thresholds();

    writeln!(out, "=== Corpus ===")?;
    writeln!(out, "Total nodes:            {}", totals.nodes)?;
    writeln!(out, "Total inserted words:   {}", totals.inserted_words)?;
    writeln!(out, "Total unique words:     {}", totals.unique_words)?;
    writeln!(out, "Unique word chars:      {}", totals.unique_word_chars)?;
    writeln!(out)?;

    writeln!(out, "=== Extrema ===")?;
    writeln!(out, "Word count:    {}", span(stats.extrema.count))?;
    writeln!(out, "Word length:   {}", span(stats.extrema.length))?;
    writeln!(
        out,
        "Entropy:       {}",
        stats
            .extrema
            .entropy
            .map(|s| format!("{:.6} .. {:.6}", s.min, s.max))
            .unwrap_or_else(|| "n/a".to_string())
    )?;
    writeln!(out)?;

    writeln!(out, "=== Thresholds ===")?;
    writeln!(
        out,
        "Frequency        (p{:>5.1}): {}",
        config.freq_percentile,
        opt(thresholds.frequency)
    )?;
    writeln!(
        out,
        "Length frequency (p{:>5.1}): {}",
        config.len_percentile,
        opt(thresholds.length_frequency)
    )?;
    writeln!(
        out,
        "Entropy          (p{:>5.1}): {}",
        config.entropy_percentile,
        thresholds
            .entropy
            .map(|t| format!("{:.6}", t))
            .unwrap_or_else(|| "n/a".to_string())
    )?;

    for axis in AnomalyAxis::ALL {
        let records = analysis.anomalies().get(axis);
        writeln!(out)?;
        writeln!(out, "=== {} anomalies ===", title(axis))?;
        writeln!(
            out,
            "Count: {}  Mass: {:.6}",
            records.len(),
            analysis.anomaly_rate(axis)
        )?;
        for record in records.iter().take(config.report_examples) {
            writeln!(
                out,
                "  {:<32} count={:<8} len={:<4} entropy={:.6}",
                format!("{:?}", record.string),
                record.count,
                record.length,
                record.entropy
            )?;
        }
        if records.len() > config.report_examples {
            writeln!(
                out,
                "  ... {} more",
                records.len() - config.report_examples
            )?;
        }
    }
    Ok(())
}

fn title(axis: AnomalyAxis) -> &'static str {
    match axis {
        AnomalyAxis::Frequency => "Frequency",
        AnomalyAxis::Length => "Length",
        AnomalyAxis::Entropy => "Entropy",
    }
}

fn span<T: fmt::Display>(span: Option<Span<T>>) -> String {
    span.map(|s| format!("{} .. {}", s.min, s.max))
        .unwrap_or_else(|| "n/a".to_string())
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::trie::StatTrie;

    #[test]
    fn test_report_sections() {
        let trie: StatTrie = ["cat", "cat", "car", "cart", "dog"].into_iter().collect();
        let analysis = Analysis::collect(&trie, AnalysisConfig::default());
        let report = render(&analysis);

        assert!(report.contains("Total inserted words:   5"));
        assert!(report.contains("Word count:    1 .. 2"));
        assert!(report.contains("Frequency        (p  5.0): 1"));
        assert!(report.contains("=== Frequency anomalies ==="));
        assert!(report.contains("=== Length anomalies ==="));
        assert!(report.contains("=== Entropy anomalies ==="));
        // car, cart and dog: 3 of 5 inserted words
        assert!(report.contains("Count: 3  Mass: 0.600000"));
        // entropy flags "ca" and "car"; "car" lies inside "ca"
        assert!(report.contains("Count: 2  Mass: 0.800000"));
    }

    #[test]
    fn test_report_limits_examples() {
        let mut trie = StatTrie::new();
        for i in 0..12 {
            trie.insert(&format!("w{:02}", i));
        }
        let config = AnalysisConfig {
            report_examples: 2,
            ..AnalysisConfig::default()
        };
        let analysis = Analysis::collect(&trie, config);
        let report = render(&analysis);
        assert!(report.contains("... 10 more"));
    }

    #[test]
    fn test_empty_report_marks_not_computable() {
        let trie = StatTrie::new();
        let analysis = Analysis::collect(&trie, AnalysisConfig::default());
        let report = render(&analysis);
        assert!(report.contains("Word count:    n/a"));
        assert!(report.contains("Frequency        (p  5.0): n/a"));
        assert!(report.contains("Count: 0  Mass: 0.000000"));
    }
}
