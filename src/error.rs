//! Error type shared by the library components
//!
//! Not-found conditions on the trie are never errors; they surface as `false`
//! or a no-op. Everything that can fail for a reason the caller should see is
//! one of these variants.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by exporters, configuration and preprocessing
#[derive(Error, Debug)]
pub enum StatTrieError {
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mode not supported: {0}")]
    UnsupportedMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatTrieError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatTrieError>;
