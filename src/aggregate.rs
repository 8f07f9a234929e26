//! Count-by-key summary tables over a [`CleanedDataset`].
//!
//! Every function here reads the dataset without mutating it and returns an empty table
//! for an empty dataset or a pruned source column.

use crate::config::WordFilter;
use crate::dataset::CleanedDataset;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::LazyLock;
use tracing::debug;

/// Runs of alphabetic characters; everything else is a boundary
static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}+").expect("word pattern is valid"));

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One row of an aggregate table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow<K> {
    pub key: K,
    pub count: usize,
    /// Share of the table's total, in percent, where the table defines one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Ordered count-by-key table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateTable<K> {
    rows: Vec<AggregateRow<K>>,
    #[serde(skip)]
    has_percentage: bool,
}

impl<K> AggregateTable<K> {
    pub fn rows(&self) -> &[AggregateRow<K>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows carry a `percentage`, even when the table is empty
    pub fn has_percentage(&self) -> bool {
        self.has_percentage
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

impl<K: PartialEq> AggregateTable<K> {
    pub fn count_of(&self, key: &K) -> Option<usize> {
        self.rows.iter().find(|r| &r.key == key).map(|r| r.count)
    }
}

/// Count keys, keeping them in first-seen order
fn count_first_seen<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

/// Descending count; stable, so ties stay in first-seen order
fn sorted_by_count<K>(mut counts: Vec<(K, usize)>) -> Vec<(K, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Descending count, ties ascending by key
fn sorted_by_count_then_key<K: Ord>(mut counts: Vec<(K, usize)>) -> Vec<(K, usize)> {
    counts.sort_by(|a, b| match b.1.cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    counts
}

fn into_table<K>(counts: Vec<(K, usize)>) -> AggregateTable<K> {
    AggregateTable {
        rows: counts
            .into_iter()
            .map(|(key, count)| AggregateRow {
                key,
                count,
                percentage: None,
            })
            .collect(),
        has_percentage: false,
    }
}

/// Non-empty values of a text field
fn non_empty<'a>(values: impl Iterator<Item = Option<&'a str>>) -> impl Iterator<Item = &'a str> {
    values.flatten().filter(|v| !v.is_empty())
}

/// Publications per year, records without a year excluded
pub fn yearly_counts(dataset: &CleanedDataset) -> AggregateTable<i32> {
    let years = dataset.records().iter().filter_map(|r| r.publish_year);
    into_table(sorted_by_count(count_first_seen(years)))
}

/// Publications per calendar month (1-12) across all years
pub fn monthly_counts(dataset: &CleanedDataset) -> AggregateTable<u32> {
    let months = dataset.records().iter().filter_map(|r| r.publish_month);
    into_table(sorted_by_count(count_first_seen(months)))
}

/// Three-letter English label for a month number
pub fn month_label(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_LABELS.get(index).copied()
}

/// The `n` journals with the most publications
pub fn top_journals(dataset: &CleanedDataset, n: usize) -> AggregateTable<String> {
    let journals = non_empty(dataset.records().iter().map(|r| r.journal.as_deref()));
    let mut counts = sorted_by_count_then_key(count_first_seen(journals));
    counts.truncate(n);
    into_table(
        counts
            .into_iter()
            .map(|(journal, count)| (journal.to_string(), count))
            .collect(),
    )
}

/// Lowercased alphabetic tokens of a title that pass the filter
pub fn title_tokens<'a>(title: &'a str, filter: &'a WordFilter) -> impl Iterator<Item = String> + 'a {
    let lowered = title.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect::<Vec<_>>()
        .into_iter()
        .filter(move |token| filter.accepts(token))
}

/// Most frequent title words across the dataset
pub fn title_word_frequency(dataset: &CleanedDataset, filter: &WordFilter) -> AggregateTable<String> {
    let titles = non_empty(dataset.records().iter().map(|r| r.title.as_deref()));
    let tokens = titles.flat_map(|title| title_tokens(title, filter));

    let mut counts = sorted_by_count_then_key(count_first_seen(tokens));
    debug!(distinct = counts.len(), top_n = filter.top_n, "Counted title words");
    counts.truncate(filter.top_n);
    into_table(counts)
}

/// Publications per source, with each source's share of all sourced records
pub fn source_distribution(dataset: &CleanedDataset) -> AggregateTable<String> {
    let sources = non_empty(dataset.records().iter().map(|r| r.source.as_deref()));
    let counts = sorted_by_count(count_first_seen(sources));
    let total: usize = counts.iter().map(|(_, c)| c).sum();

    AggregateTable {
        rows: counts
            .into_iter()
            .map(|(source, count)| AggregateRow {
                key: source.to_string(),
                count,
                percentage: Some(count as f64 * 100.0 / total as f64),
            })
            .collect(),
        has_percentage: true,
    }
}

/// Headline facts about the yearly publication curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationTrend {
    pub peak_year: i32,
    pub peak_count: usize,
    pub first_year: i32,
    pub last_year: i32,
    /// Percent change from the first to the last year; `None` with a single year
    pub growth_rate: Option<f64>,
}

/// Peak year and first-to-last growth, from yearly counts
pub fn publication_trend(yearly: &AggregateTable<i32>) -> Option<PublicationTrend> {
    let mut chronological: Vec<&AggregateRow<i32>> = yearly.rows().iter().collect();
    chronological.sort_by_key(|r| r.key);

    let first = *chronological.first()?;
    let last = *chronological.last()?;
    let peak = chronological
        .iter()
        .copied()
        .fold(first, |best, row| if row.count > best.count { row } else { best });

    let growth_rate = (chronological.len() > 1)
        .then(|| (last.count as f64 - first.count as f64) / first.count as f64 * 100.0);

    Some(PublicationTrend {
        peak_year: peak.key,
        peak_count: peak.count,
        first_year: first.key,
        last_year: last.key,
        growth_rate,
    })
}
