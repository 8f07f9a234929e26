//! Dataset-level statistics for reports and the dashboard overview.

use crate::dataset::CleanedDataset;
use crate::record::Column;
use serde::Serialize;
use std::collections::HashSet;

/// Share of records carrying a usable value for one surviving column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCompleteness {
    pub column: Column,
    /// 0.0 to 1.0; 0.0 for an empty dataset
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_records: usize,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    /// One entry per surviving column, in schema order
    pub completeness: Vec<ColumnCompleteness>,
    /// Surviving columns with a value in every record
    pub complete_columns: usize,
    pub unique_titles: usize,
    pub unique_journals: usize,
    /// Mean abstract word count, one decimal
    pub avg_abstract_length: Option<f64>,
}

fn distinct_non_empty<'a>(values: impl Iterator<Item = Option<&'a str>>) -> usize {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn summarize(dataset: &CleanedDataset) -> SummaryStatistics {
    let records = dataset.records();
    let total = records.len();

    let years = records.iter().filter_map(|r| r.publish_year);
    let (min_year, max_year) = years.fold((None, None), |(lo, hi): (Option<i32>, Option<i32>), y| {
        (Some(lo.map_or(y, |l| l.min(y))), Some(hi.map_or(y, |h| h.max(y))))
    });

    let completeness: Vec<ColumnCompleteness> = dataset
        .schema()
        .columns()
        .iter()
        .map(|&column| {
            let present = records.iter().filter(|r| r.has_value(column)).count();
            let ratio = if total == 0 {
                0.0
            } else {
                present as f64 / total as f64
            };
            ColumnCompleteness { column, ratio }
        })
        .collect();

    let complete_columns = if total == 0 {
        0
    } else {
        completeness.iter().filter(|c| c.ratio >= 1.0).count()
    };

    let lengths: Vec<usize> = records.iter().filter_map(|r| r.abstract_length).collect();
    let avg_abstract_length = (!lengths.is_empty()).then(|| {
        let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        (mean * 10.0).round() / 10.0
    });

    SummaryStatistics {
        total_records: total,
        min_year,
        max_year,
        completeness,
        complete_columns,
        unique_titles: distinct_non_empty(records.iter().map(|r| r.title.as_deref())),
        unique_journals: distinct_non_empty(records.iter().map(|r| r.journal.as_deref())),
        avg_abstract_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::prune::clean;
    use crate::record::RawRecord;

    #[test]
    fn test_empty_dataset() {
        let stats = summarize(&clean(&[], &PipelineConfig::default()));
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.min_year, None);
        assert_eq!(stats.max_year, None);
        assert_eq!(stats.avg_abstract_length, None);
        assert!(stats.completeness.iter().all(|c| c.ratio == 0.0));
    }

    #[test]
    fn test_summary_values() {
        let records = vec![
            RawRecord {
                title: Some("Masks".to_string()),
                abstract_text: Some("one two three".to_string()),
                journal: Some("BMJ".to_string()),
                publish_time: Some("2021-04-01".to_string()),
                ..Default::default()
            },
            RawRecord {
                title: Some("Masks".to_string()),
                abstract_text: Some("one two".to_string()),
                journal: Some("Lancet".to_string()),
                publish_time: Some("2019".to_string()),
                ..Default::default()
            },
            RawRecord {
                title: Some("Vaccines".to_string()),
                journal: Some("BMJ".to_string()),
                publish_time: Some("unknown".to_string()),
                ..Default::default()
            },
        ];
        let stats = summarize(&clean(&records, &PipelineConfig::default()));

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.min_year, Some(2019));
        assert_eq!(stats.max_year, Some(2021));
        assert_eq!(stats.unique_titles, 2);
        assert_eq!(stats.unique_journals, 2);
        assert_eq!(stats.avg_abstract_length, Some(2.5));

        let ratio_of = |column: Column| {
            stats
                .completeness
                .iter()
                .find(|c| c.column == column)
                .map(|c| c.ratio)
        };
        assert_eq!(ratio_of(Column::Title), Some(1.0));
        assert_eq!(ratio_of(Column::PublishTime), Some(2.0 / 3.0));
        assert_eq!(ratio_of(Column::Doi), None);
        // title and journal
        assert_eq!(stats.complete_columns, 2);
    }
}
