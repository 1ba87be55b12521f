//! CSV output for record listings
//!
//! One file per mode: every record for `all`, otherwise the anomaly set of
//! one axis in severity order.

use crate::analysis::{triggered_axes, Analysis, AnomalyAxis, Mode, Record, Thresholds};
use crate::error::{Result, StatTrieError};
use std::fs;
use std::path::Path;

const HEADER: &str = "String,Kind,Frequency,Length,Length frequency,Entropy,Rate,Anomaly";

/// CSV row for a single record
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub string: String,
    pub kind: String,
    pub frequency: u64,
    pub length: usize,
    /// Unique words sharing the length; words only
    pub length_frequency: Option<u64>,
    pub entropy: f64,
    pub rate: f64,
    pub anomalies: Vec<AnomalyAxis>,
}

impl CsvRecord {
    pub fn from_record(record: &Record, thresholds: &Thresholds) -> Self {
        Self {
            string: record.string.clone(),
            kind: record.kind.to_string(),
            frequency: record.count,
            length: record.length,
            length_frequency: record
                .is_word()
                .then(|| thresholds.length_population(record.length)),
            entropy: record.entropy,
            rate: record.frequency_rate,
            anomalies: triggered_axes(record, thresholds),
        }
    }
}

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    rows: Vec<CsvRecord>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for `mode`, in the order the analysis lists them
    pub fn from_analysis(analysis: &Analysis<'_>, mode: Mode) -> Self {
        let thresholds = analysis.thresholds();
        Self {
            rows: analysis
                .records(mode)
                .iter()
                .map(|r| CsvRecord::from_record(r, thresholds))
                .collect(),
        }
    }

    pub fn add_record(&mut self, row: CsvRecord) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(row: &CsvRecord) -> String {
        let anomalies: Vec<&str> = row.anomalies.iter().map(|a| a.name()).collect();
        [
            Self::escape_field(&row.string),
            row.kind.clone(),
            row.frequency.to_string(),
            row.length.to_string(),
            row.length_frequency
                .map(|n| n.to_string())
                .unwrap_or_default(),
            format!("{:.6}", row.entropy),
            format!("{:.6}", row.rate),
            anomalies.join("/"),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::with_capacity(HEADER.len() + 1 + self.rows.len() * 48);
        output.push_str(HEADER);
        output.push('\n');
        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }
        output
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_csv()).map_err(|e| StatTrieError::io(path, e))?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "csv written");
        Ok(())
    }
}

/// Default file name for a mode's listing
pub fn file_name(mode: Mode) -> &'static str {
    match mode {
        Mode::All => "all_entries.csv",
        Mode::Axis(AnomalyAxis::Frequency) => "frequency_anomalies.csv",
        Mode::Axis(AnomalyAxis::Length) => "length_anomalies.csv",
        Mode::Axis(AnomalyAxis::Entropy) => "entropy_anomalies.csv",
    }
}

/// Write the listing for `mode` to `path`
pub fn export_csv<P: AsRef<Path>>(analysis: &Analysis<'_>, mode: Mode, path: P) -> Result<()> {
    CsvOutput::from_analysis(analysis, mode).write_to(path)
}
