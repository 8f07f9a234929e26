//! Column pruning and missing-value policy.
//!
//! Runs in two explicit passes over the raw rows:
//!
//! 1. [`plan_schema`] measures each known column's missingness and decides which
//!    columns survive.
//! 2. [`apply_schema`] normalizes every row, blanks pruned columns and fills missing
//!    text with `""`.
//!
//! [`clean`] composes both.

use crate::config::PipelineConfig;
use crate::dataset::{CleanedDataset, Schema};
use crate::normalize::normalize_record;
use crate::record::{CleanedRecord, Column, RawRecord};
use serde::Serialize;
use tracing::{debug, info};

/// Missingness measurement for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: Column,
    /// Rows where the value is null or empty after text cleaning
    pub missing: usize,
    pub total: usize,
    /// `missing / total`, 0 when there are no rows
    pub missing_ratio: f64,
    pub dropped: bool,
}

/// Measure missingness of every known column
pub fn profile_columns(records: &[RawRecord], threshold: f64) -> Vec<ColumnProfile> {
    let total = records.len();

    Column::ALL
        .into_iter()
        .map(|column| {
            let missing = records.iter().filter(|r| r.is_missing(column)).count();
            let missing_ratio = if total == 0 {
                0.0
            } else {
                missing as f64 / total as f64
            };
            ColumnProfile {
                column,
                missing,
                total,
                missing_ratio,
                dropped: missing_ratio > threshold,
            }
        })
        .collect()
}

/// First pass: decide the surviving schema
pub fn plan_schema(records: &[RawRecord], threshold: f64) -> Schema {
    let profiles = profile_columns(records, threshold);

    for profile in &profiles {
        debug!(
            column = %profile.column,
            missing = profile.missing,
            ratio = profile.missing_ratio,
            "Column missingness"
        );
    }

    let schema = Schema::from_profiles(profiles);
    let dropped: Vec<&str> = schema.dropped().map(Column::header).collect();
    if !dropped.is_empty() {
        info!(threshold, ?dropped, "Dropping columns above missingness threshold");
    }
    schema
}

/// Blank pruned columns and fill missing text in kept ones
fn apply_to_record(mut record: CleanedRecord, schema: &Schema) -> CleanedRecord {
    for column in Column::ALL {
        if schema.contains(column) {
            if column.is_text() && record.text(column).is_none() {
                record.set_text(column, String::new());
            }
            continue;
        }

        match column {
            Column::PublishTime => {
                record.publish_year = None;
                record.publish_month = None;
            }
            Column::Authors => record.author_count = None,
            Column::Abstract => {
                record.abstract_text = None;
                record.abstract_length = None;
            }
            Column::Title => {
                record.title = None;
                record.title_word_count = None;
            }
            Column::CordUid => record.cord_uid = None,
            Column::Journal => record.journal = None,
            Column::SourceX => record.source = None,
            Column::Doi => record.doi = None,
            Column::Url => record.url = None,
            Column::License => record.license = None,
        }
    }
    record
}

/// Second pass: normalize each row and apply the schema's drop and fill decisions
pub fn apply_schema(records: &[RawRecord], schema: Schema, author_delimiter: &str) -> CleanedDataset {
    let cleaned = records
        .iter()
        .map(|raw| apply_to_record(normalize_record(raw, author_delimiter), &schema))
        .collect();

    CleanedDataset::new(schema, cleaned)
}

/// Run both passes
pub fn clean(records: &[RawRecord], config: &PipelineConfig) -> CleanedDataset {
    let schema = plan_schema(records, config.missing_threshold);
    let dataset = apply_schema(records, schema, &config.author_delimiter);
    info!(
        records = dataset.len(),
        columns = dataset.schema().columns().len(),
        "Cleaned dataset"
    );
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten rows where the first `missing` rows lack a journal
    fn rows_with_missing_journals(missing: usize) -> Vec<RawRecord> {
        (0..10)
            .map(|i| RawRecord {
                title: Some(format!("Paper {}", i)),
                journal: (i >= missing).then(|| "Virology".to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_drops_column_above_threshold() {
        let schema = plan_schema(&rows_with_missing_journals(8), 0.70);
        assert!(!schema.contains(Column::Journal));
        assert!(schema.contains(Column::Title));
    }

    #[test]
    fn test_keeps_column_below_threshold() {
        let schema = plan_schema(&rows_with_missing_journals(6), 0.70);
        assert!(schema.contains(Column::Journal));
    }

    #[test]
    fn test_threshold_is_strict() {
        let schema = plan_schema(&rows_with_missing_journals(7), 0.70);
        assert!(schema.contains(Column::Journal));
    }

    #[test]
    fn test_control_only_values_count_as_missing() {
        let records: Vec<RawRecord> = (0..10)
            .map(|i| RawRecord {
                title: Some(format!("Paper {}", i)),
                journal: Some(if i < 8 { "\u{0}".to_string() } else { "Virology".to_string() }),
                ..Default::default()
            })
            .collect();
        let schema = plan_schema(&records, 0.70);
        assert!(!schema.contains(Column::Journal));
    }

    #[test]
    fn test_schema_matches_profiles() {
        let records = rows_with_missing_journals(9);
        let profiles = profile_columns(&records, 0.70);
        let schema = plan_schema(&records, 0.70);
        for profile in profiles {
            assert_eq!(schema.contains(profile.column), profile.missing_ratio <= 0.70);
        }
    }

    #[test]
    fn test_empty_input_keeps_every_column() {
        let schema = plan_schema(&[], 0.70);
        assert_eq!(schema.columns().len(), Column::ALL.len());

        let dataset = clean(&[], &PipelineConfig::default());
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_fill_and_prune() {
        let records = rows_with_missing_journals(6);
        let dataset = clean(&records, &PipelineConfig::default());

        // every row lacks authors, so the column is gone everywhere
        assert!(dataset.records().iter().all(|r| r.author_count.is_none()));
        assert!(dataset.records().iter().all(|r| r.doi.is_none()));
        // kept journal column is filled, never null
        assert_eq!(dataset.records()[0].journal.as_deref(), Some(""));
        assert_eq!(dataset.records()[9].journal.as_deref(), Some("Virology"));
    }

    #[test]
    fn test_pruned_title_clears_derived_count() {
        let records: Vec<RawRecord> = (0..4)
            .map(|_| RawRecord {
                journal: Some("BMJ".to_string()),
                ..Default::default()
            })
            .collect();
        let dataset = clean(&records, &PipelineConfig::default());
        assert!(!dataset.schema().contains(Column::Title));
        assert!(dataset.records().iter().all(|r| r.title_word_count.is_none()));
    }

    #[test]
    fn test_clean_is_deterministic() {
        let records = rows_with_missing_journals(5);
        let config = PipelineConfig::default();
        assert_eq!(clean(&records, &config), clean(&records, &config));
    }
}
