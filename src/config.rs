//! Analysis configuration
//!
//! Percentiles select how much of each metric's distribution counts as
//! "rare". Frequency and length look at the low tail; entropy looks at the
//! high tail, so its percentile is configured high.

use crate::analysis::Mode;
use crate::error::{Result, StatTrieError};
use crate::tree_export::TreeSelection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Configuration for threshold computation and reporting
///
/// # Example
/// ```
/// use stattrie::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.freq_percentile, 5.0);
/// assert_eq!(config.entropy_percentile, 95.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Percentile of word counts below which a word is frequency-rare
    pub freq_percentile: f64,

    /// Percentile of inserted-word mass used for the length-popularity cutoff
    pub len_percentile: f64,

    /// Percentile of prefix entropies above which branching is unusual
    pub entropy_percentile: f64,

    /// Example entries listed per axis in the text report
    pub report_examples: usize,

    /// Export selection, by mode selector name
    pub export: ExportConfig,
}

/// Which CSV files and JSON trees to write
///
/// CSV entries are mode selectors (`all`, `frequency`, `length`, `entropy`
/// or their one-letter forms). JSON entries additionally accept `complete`
/// and `partial`. Unknown entries are reported and skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub csv: Vec<String>,
    pub json: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv: ["all", "frequency", "length", "entropy"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            json: Vec::new(),
        }
    }
}

impl ExportConfig {
    /// Parse the CSV selectors, splitting valid modes from rejected ones
    pub fn csv_modes(&self) -> (Vec<Mode>, Vec<StatTrieError>) {
        parse_modes(&self.csv)
    }

    /// Parse the JSON tree selectors
    pub fn json_trees(&self) -> (Vec<TreeSelection>, Vec<StatTrieError>) {
        parse_modes(&self.json)
    }
}

fn parse_modes<T>(selectors: &[String]) -> (Vec<T>, Vec<StatTrieError>)
where
    T: FromStr<Err = StatTrieError> + PartialEq,
{
    let mut modes = Vec::new();
    let mut rejected = Vec::new();
    for selector in selectors {
        match selector.parse::<T>() {
            Ok(mode) if !modes.contains(&mode) => modes.push(mode),
            Ok(_) => {}
            Err(e) => rejected.push(e),
        }
    }
    (modes, rejected)
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            freq_percentile: 5.0,
            len_percentile: 5.0,
            entropy_percentile: 95.0,
            report_examples: 8,
            export: ExportConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Flag only the extreme tails
    pub fn strict() -> Self {
        Self {
            freq_percentile: 1.0,
            len_percentile: 1.0,
            entropy_percentile: 99.0,
            ..Self::default()
        }
    }

    /// Flag wider tails, for small corpora
    pub fn permissive() -> Self {
        Self {
            freq_percentile: 10.0,
            len_percentile: 10.0,
            entropy_percentile: 90.0,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to the defaults.
    ///
    /// # Example TOML
    /// ```toml
    /// freq_percentile = 2.5
    /// entropy_percentile = 97
    ///
    /// [export]
    /// csv = ["all", "entropy"]
    /// json = ["partial"]
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| StatTrieError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StatTrieError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("freq_percentile", self.freq_percentile),
            ("len_percentile", self.len_percentile),
            ("entropy_percentile", self.entropy_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(StatTrieError::InvalidConfig(format!(
                    "{} must be in [0, 100], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
