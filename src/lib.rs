//! Stattrie - counting-trie anomaly triage for logs and token streams
//!
//! Strings are stored in a prefix tree with occurrence counts. One pass over
//! the tree yields word and prefix records, from which percentile thresholds
//! flag entries that are rare by frequency, by length popularity, or by
//! branching entropy. Results are exported as CSV listings, a text report,
//! and full or trimmed JSON trees.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod preprocess;
pub mod report;
pub mod tree_export;
pub mod trie;
