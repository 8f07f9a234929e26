//! Record types shared by every pipeline stage.
//!
//! [`RawRecord`] mirrors one row of the CORD-19 `metadata.csv` export, restricted to the
//! fixed set of columns in [`Column`]. [`CleanedRecord`] is what survives normalization
//! and pruning.

use crate::normalize::clean_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A known input column.
///
/// Declaration order is the canonical column order used for schemas and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    CordUid,
    Title,
    Abstract,
    Journal,
    PublishTime,
    Authors,
    SourceX,
    Doi,
    Url,
    License,
}

impl Column {
    /// Every known column in canonical order
    pub const ALL: [Column; 10] = [
        Column::CordUid,
        Column::Title,
        Column::Abstract,
        Column::Journal,
        Column::PublishTime,
        Column::Authors,
        Column::SourceX,
        Column::Doi,
        Column::Url,
        Column::License,
    ];

    /// Header name in the upstream CSV
    pub fn header(self) -> &'static str {
        match self {
            Column::CordUid => "cord_uid",
            Column::Title => "title",
            Column::Abstract => "abstract",
            Column::Journal => "journal",
            Column::PublishTime => "publish_time",
            Column::Authors => "authors",
            Column::SourceX => "source_x",
            Column::Doi => "doi",
            Column::Url => "url",
            Column::License => "license",
        }
    }

    /// Look up a column by its CSV header name
    pub fn from_header(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.header() == name)
    }

    /// Whether the cleaned value is kept as text (filled with `""` when missing).
    ///
    /// `publish_time` and `authors` only feed derived numeric fields.
    pub fn is_text(self) -> bool {
        !matches!(self, Column::PublishTime | Column::Authors)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One untyped input row. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub cord_uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub source_x: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

impl RawRecord {
    /// Raw value of a column, if present
    pub fn get(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::CordUid => &self.cord_uid,
            Column::Title => &self.title,
            Column::Abstract => &self.abstract_text,
            Column::Journal => &self.journal,
            Column::PublishTime => &self.publish_time,
            Column::Authors => &self.authors,
            Column::SourceX => &self.source_x,
            Column::Doi => &self.doi,
            Column::Url => &self.url,
            Column::License => &self.license,
        };
        value.as_deref()
    }

    /// True when the column is null or cleans to an empty string
    pub fn is_missing(&self, column: Column) -> bool {
        !self.get(column).is_some_and(|v| !clean_text(v).is_empty())
    }
}

/// A record after normalization, derivation, and pruning.
///
/// Text fields are `None` only when their column was pruned dataset-wide; otherwise a
/// missing value has been filled with an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub cord_uid: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub source: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
    pub publish_year: Option<i32>,
    /// 1-12
    pub publish_month: Option<u32>,
    pub author_count: Option<usize>,
    pub abstract_length: Option<usize>,
    pub title_word_count: Option<usize>,
}

impl CleanedRecord {
    /// Cleaned text value of a text column
    pub fn text(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::CordUid => &self.cord_uid,
            Column::Title => &self.title,
            Column::Abstract => &self.abstract_text,
            Column::Journal => &self.journal,
            Column::SourceX => &self.source,
            Column::Doi => &self.doi,
            Column::Url => &self.url,
            Column::License => &self.license,
            Column::PublishTime | Column::Authors => return None,
        };
        value.as_deref()
    }

    /// Whether the record carries a usable value for the column.
    ///
    /// Text columns count when non-empty; `publish_time` and `authors` count when their
    /// derived field parsed.
    pub fn has_value(&self, column: Column) -> bool {
        match column {
            Column::PublishTime => self.publish_year.is_some(),
            Column::Authors => self.author_count.is_some(),
            _ => self.text(column).is_some_and(|v| !v.is_empty()),
        }
    }

    pub(crate) fn set_text(&mut self, column: Column, value: String) {
        let slot = match column {
            Column::CordUid => &mut self.cord_uid,
            Column::Title => &mut self.title,
            Column::Abstract => &mut self.abstract_text,
            Column::Journal => &mut self.journal,
            Column::SourceX => &mut self.source,
            Column::Doi => &mut self.doi,
            Column::Url => &mut self.url,
            Column::License => &mut self.license,
            Column::PublishTime | Column::Authors => return,
        };
        *slot = Some(value);
    }
}
