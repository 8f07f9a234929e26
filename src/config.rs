//! Pipeline configuration.
//!
//! Every threshold the pipeline applies lives here so tests can pin small fixed values
//! and the CLI can override them.

use crate::error::{CordError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Default missingness ratio above which a column is dropped
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.70;

/// Default number of journals in the top-journals table
pub const DEFAULT_TOP_JOURNALS: usize = 20;

/// Default number of words in the title word table
pub const DEFAULT_TOP_WORDS: usize = 30;

/// Default minimum token length for title words
pub const DEFAULT_MIN_WORD_LENGTH: usize = 3;

const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "of", "in", "to", "a", "is", "for", "on", "with", "as", "by", "at", "an",
    "are", "from", "or", "this", "that", "be", "was", "will", "have", "has", "been", "can",
    "could", "would", "should", "may", "might", "must", "shall", "covid", "coronavirus",
    "sars", "cov",
];

/// Title word-frequency filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordFilter {
    /// Lowercase words excluded from counting
    pub stop_words: BTreeSet<String>,
    /// Tokens shorter than this (in characters) are discarded
    pub min_length: usize,
    /// Number of rows kept in the output table
    pub top_n: usize,
}

impl Default for WordFilter {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            min_length: DEFAULT_MIN_WORD_LENGTH,
            top_n: DEFAULT_TOP_WORDS,
        }
    }
}

impl WordFilter {
    /// Whether a lowercased token survives the length and stop-word filters
    pub fn accepts(&self, token: &str) -> bool {
        token.chars().count() >= self.min_length && !self.stop_words.contains(token)
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Columns with a missing ratio strictly above this are dropped
    pub missing_threshold: f64,
    /// Separator between names in the `authors` field
    pub author_delimiter: String,
    /// Rows kept in the top-journals table
    pub top_journals: usize,
    pub words: WordFilter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            author_delimiter: ",".to_string(),
            top_journals: DEFAULT_TOP_JOURNALS,
            words: WordFilter::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| CordError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Reject settings the pipeline cannot apply
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.missing_threshold) {
            return Err(CordError::Config(format!(
                "missing_threshold must be within [0, 1], got {}",
                self.missing_threshold
            )));
        }
        if self.author_delimiter.is_empty() {
            return Err(CordError::Config("author_delimiter must not be empty".to_string()));
        }
        if self.words.min_length == 0 {
            return Err(CordError::Config("words.min_length must be at least 1".to_string()));
        }
        Ok(())
    }
}
