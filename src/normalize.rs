//! Record normalization.
//!
//! Turns one [`RawRecord`] into one [`CleanedRecord`]: cleans free text, parses the
//! publication date and derives the numeric features. Pure, one row at a time; the
//! dataset-wide column decisions happen later in [`crate::prune`].

use crate::record::{CleanedRecord, RawRecord};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Full-date formats, tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%Y %b %d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Partial formats that name a month but no day; parsed with day 1 appended
const YEAR_MONTH_FORMATS: &[(&str, &str)] = &[("%Y-%m-%d", "-01"), ("%Y %b %d", " 01")];

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Year and (when the input names one) month of a publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: Option<u32>,
}

impl DateParts {
    fn from_date(date: impl Datelike) -> Option<Self> {
        Self::checked(date.year(), Some(date.month()))
    }

    fn checked(year: i32, month: Option<u32>) -> Option<Self> {
        (MIN_YEAR..=MAX_YEAR)
            .contains(&year)
            .then_some(Self { year, month })
    }
}

/// Parse a publication date string.
///
/// Returns `None` unless the whole string matches one of the accepted formats and names
/// a real calendar date. A bare year yields no month.
pub fn parse_publish_date(value: &str) -> Option<DateParts> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return DateParts::from_date(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return DateParts::from_date(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return DateParts::from_date(datetime.date_naive());
    }

    for (format, day_suffix) in YEAR_MONTH_FORMATS {
        let padded = format!("{}{}", value, day_suffix);
        if let Ok(date) = NaiveDate::parse_from_str(&padded, format) {
            return DateParts::from_date(date);
        }
    }

    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<i32>()
            .ok()
            .and_then(|year| DateParts::checked(year, None));
    }

    None
}

/// Collapse whitespace runs to single spaces and drop control characters
pub fn clean_text(value: &str) -> String {
    value
        .split_whitespace()
        .map(|token| token.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of non-empty, trimmed names in an author list
pub fn count_authors(authors: &str, delimiter: &str) -> usize {
    authors
        .split(delimiter)
        .filter(|name| !name.trim().is_empty())
        .count()
}

/// Whitespace token count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Normalize one raw row.
///
/// Text fields are cleaned but left `None` when the raw value is absent; filling and
/// column pruning are applied by the pruner.
pub fn normalize_record(raw: &RawRecord, author_delimiter: &str) -> CleanedRecord {
    let clean = |value: &Option<String>| value.as_deref().map(clean_text);

    let title = clean(&raw.title);
    let abstract_text = clean(&raw.abstract_text);
    let date = raw.publish_time.as_deref().and_then(parse_publish_date);

    CleanedRecord {
        cord_uid: clean(&raw.cord_uid),
        title_word_count: Some(title.as_deref().map_or(0, word_count)),
        title,
        abstract_length: abstract_text.as_deref().map(|a| word_count(&a.to_lowercase())),
        abstract_text,
        journal: clean(&raw.journal),
        source: clean(&raw.source_x),
        doi: clean(&raw.doi),
        url: clean(&raw.url),
        license: clean(&raw.license),
        publish_year: date.map(|d| d.year),
        publish_month: date.and_then(|d| d.month),
        author_count: raw
            .authors
            .as_deref()
            .map(|a| count_authors(a, author_delimiter)),
    }
}
