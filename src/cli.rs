//! CLI argument parsing for stattrie

use crate::analysis::{AnomalyAxis, Mode};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::preprocess::{LineCleaner, Preprocessor, RegexExtractor};
use crate::tree_export::TreeSelection;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Percentile preset applied before any explicit percentile flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// 5 / 5 / 95 (default)
    Default,
    /// 1 / 1 / 99
    Strict,
    /// 10 / 10 / 90
    Permissive,
}

#[derive(Parser, Debug)]
#[command(name = "stattrie")]
#[command(version)]
#[command(about = "Trie-based frequency, length and entropy anomaly triage for logs", long_about = None)]
pub struct Cli {
    /// Input file, one record per line
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving the report, CSV listings and JSON trees
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// TOML configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Percentile preset
    #[arg(long = "preset", value_enum)]
    pub preset: Option<Preset>,

    /// Frequency percentile (low tail)
    #[arg(long = "perc-freq", value_name = "PERCENT")]
    pub perc_freq: Option<f64>,

    /// Length-popularity percentile (low tail)
    #[arg(long = "perc-len", value_name = "PERCENT")]
    pub perc_len: Option<f64>,

    /// Entropy percentile (high tail)
    #[arg(long = "perc-entropy", value_name = "PERCENT")]
    pub perc_entropy: Option<f64>,

    /// CSV listings to write (all, frequency, length, entropy)
    #[arg(long = "csv", value_name = "MODES", value_delimiter = ',')]
    pub csv: Option<Vec<String>>,

    /// Extract regex matches (or capture groups) instead of cleaning lines
    #[arg(long = "regex", value_name = "PATTERN")]
    pub regex: Option<String>,

    /// Extra characters that split a line into several records
    #[arg(long = "delim", value_name = "CHARS")]
    pub delim: Option<String>,

    /// Extra characters dropped while cleaning
    #[arg(long = "ignore", value_name = "CHARS")]
    pub ignore: Option<String>,

    /// Insert lines verbatim, without cleaning
    #[arg(long = "raw", conflicts_with = "regex")]
    pub raw: bool,

    /// Do not lower-case input while cleaning (regex matches are kept verbatim)
    #[arg(long = "keep-case")]
    pub keep_case: bool,

    /// Export the complete trie as JSON
    #[arg(long = "json-complete", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub json_complete: Option<Option<PathBuf>>,

    /// Export the trie trimmed to all anomalies
    #[arg(long = "json-partial", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub json_partial: Option<Option<PathBuf>>,

    /// Export the trie trimmed to frequency anomalies
    #[arg(long = "json-freq", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub json_freq: Option<Option<PathBuf>>,

    /// Export the trie trimmed to length anomalies
    #[arg(long = "json-len", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub json_len: Option<Option<PathBuf>>,

    /// Export the trie trimmed to entropy anomalies
    #[arg(long = "json-entropy", value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub json_entropy: Option<Option<PathBuf>>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Config file (or defaults), then preset, then explicit flags
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(preset) = self.preset {
            let base = match preset {
                Preset::Default => AnalysisConfig::default(),
                Preset::Strict => AnalysisConfig::strict(),
                Preset::Permissive => AnalysisConfig::permissive(),
            };
            config.freq_percentile = base.freq_percentile;
            config.len_percentile = base.len_percentile;
            config.entropy_percentile = base.entropy_percentile;
        }

        if let Some(p) = self.perc_freq {
            config.freq_percentile = p;
        }
        if let Some(p) = self.perc_len {
            config.len_percentile = p;
        }
        if let Some(p) = self.perc_entropy {
            config.entropy_percentile = p;
        }
        if let Some(csv) = &self.csv {
            config.export.csv = csv.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn preprocessor(&self) -> Result<Preprocessor> {
        if self.raw {
            return Ok(Preprocessor::Raw);
        }
        if let Some(pattern) = &self.regex {
            return Ok(Preprocessor::Extract(RegexExtractor::new(pattern)?));
        }
        let mut cleaner = LineCleaner::new().with_lowercase(!self.keep_case);
        if let Some(delim) = &self.delim {
            cleaner = cleaner.with_delimiters(delim);
        }
        if let Some(ignore) = &self.ignore {
            cleaner = cleaner.with_ignored(ignore);
        }
        Ok(Preprocessor::Clean(cleaner))
    }

    /// Requested JSON trees with their target paths
    ///
    /// A flag given without a value writes the default file name into
    /// `output_dir`.
    pub fn json_exports(&self) -> Vec<(TreeSelection, PathBuf)> {
        let flags = [
            (TreeSelection::Complete, &self.json_complete),
            (TreeSelection::Partial(Mode::All), &self.json_partial),
            (
                TreeSelection::Partial(Mode::Axis(AnomalyAxis::Frequency)),
                &self.json_freq,
            ),
            (
                TreeSelection::Partial(Mode::Axis(AnomalyAxis::Length)),
                &self.json_len,
            ),
            (
                TreeSelection::Partial(Mode::Axis(AnomalyAxis::Entropy)),
                &self.json_entropy,
            ),
        ];
        flags
            .into_iter()
            .filter_map(|(selection, flag)| {
                flag.as_ref().map(|path| {
                    let path = path
                        .clone()
                        .unwrap_or_else(|| self.output_path(selection.file_name()));
                    (selection, path)
                })
            })
            .collect()
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatTrieError;

    #[test]
    fn test_cli_parses_positionals() {
        let cli = Cli::parse_from(["stattrie", "in.log", "out"]);
        assert_eq!(cli.input, PathBuf::from("in.log"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(!cli.debug);
        assert!(cli.json_exports().is_empty());
    }

    #[test]
    fn test_cli_requires_output_dir() {
        assert!(Cli::try_parse_from(["stattrie", "in.log"]).is_err());
    }

    #[test]
    fn test_cli_percentiles_override_defaults() {
        let cli = Cli::parse_from([
            "stattrie",
            "in.log",
            "out",
            "--perc-freq",
            "2.5",
            "--perc-entropy",
            "99",
        ]);
        let config = cli.analysis_config().unwrap();
        assert_eq!(config.freq_percentile, 2.5);
        assert_eq!(config.len_percentile, 5.0);
        assert_eq!(config.entropy_percentile, 99.0);
    }

    #[test]
    fn test_cli_preset_then_flag() {
        let cli = Cli::parse_from([
            "stattrie",
            "in.log",
            "out",
            "--preset",
            "strict",
            "--perc-len",
            "7",
        ]);
        let config = cli.analysis_config().unwrap();
        assert_eq!(config.freq_percentile, 1.0);
        assert_eq!(config.len_percentile, 7.0);
        assert_eq!(config.entropy_percentile, 99.0);
    }

    #[test]
    fn test_cli_rejects_out_of_range_percentile() {
        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--perc-freq", "120"]);
        assert!(matches!(
            cli.analysis_config(),
            Err(StatTrieError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cli_json_flags_default_and_explicit_paths() {
        let cli = Cli::parse_from([
            "stattrie",
            "in.log",
            "out",
            "--json-partial",
            "--json-entropy=/tmp/e.json",
        ]);
        let exports = cli.json_exports();
        assert_eq!(
            exports,
            vec![
                (
                    TreeSelection::Partial(Mode::All),
                    PathBuf::from("out").join("partial_trie.json")
                ),
                (
                    TreeSelection::Partial(Mode::Axis(AnomalyAxis::Entropy)),
                    PathBuf::from("/tmp/e.json")
                ),
            ]
        );
    }

    #[test]
    fn test_cli_csv_modes() {
        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--csv", "f,e"]);
        let config = cli.analysis_config().unwrap();
        let (modes, rejected) = config.export.csv_modes();
        assert!(rejected.is_empty());
        assert_eq!(
            modes,
            vec![
                Mode::Axis(AnomalyAxis::Frequency),
                Mode::Axis(AnomalyAxis::Entropy)
            ]
        );
    }

    #[test]
    fn test_cli_preprocessor_selection() {
        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--raw"]);
        assert!(matches!(cli.preprocessor().unwrap(), Preprocessor::Raw));

        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--regex", "(\\d+)"]);
        assert!(matches!(
            cli.preprocessor().unwrap(),
            Preprocessor::Extract(_)
        ));

        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--regex", r"(/\w+)"]);
        assert_eq!(cli.preprocessor().unwrap().process_line("GET /Admin"), vec!["/Admin"]);

        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--ignore", "Q"]);
        assert_eq!(cli.preprocessor().unwrap().process_line("aQbq"), vec!["ab"]);

        let cli = Cli::parse_from(["stattrie", "in.log", "out", "--regex", "("]);
        assert!(cli.preprocessor().is_err());
    }

    #[test]
    fn test_cli_raw_conflicts_with_regex() {
        assert!(Cli::try_parse_from(["stattrie", "a", "b", "--raw", "--regex", "x"]).is_err());
    }

    #[test]
    fn test_cli_debug_flag() {
        let cli = Cli::parse_from(["stattrie", "a", "b", "--debug"]);
        assert!(cli.debug);
    }
}
