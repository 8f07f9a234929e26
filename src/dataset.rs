//! The cleaned dataset handed to aggregation and to the dashboard.

use crate::error::{CordError, Result};
use crate::prune::ColumnProfile;
use crate::record::{CleanedRecord, Column};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Surviving columns of a cleaned dataset, with the profiles that decided them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
    profiles: Vec<ColumnProfile>,
}

impl Schema {
    pub(crate) fn from_profiles(profiles: Vec<ColumnProfile>) -> Self {
        let columns = profiles
            .iter()
            .filter(|p| !p.dropped)
            .map(|p| p.column)
            .collect();
        Self { columns, profiles }
    }

    /// Kept columns in canonical order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Columns removed by the missingness policy
    pub fn dropped(&self) -> impl Iterator<Item = Column> + '_ {
        self.profiles.iter().filter(|p| p.dropped).map(|p| p.column)
    }

    pub fn profiles(&self) -> &[ColumnProfile] {
        &self.profiles
    }
}

/// Row selection applied on top of a cleaned dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    /// Inclusive lower bound on `publish_year`
    pub year_from: Option<i32>,
    /// Inclusive upper bound on `publish_year`
    pub year_to: Option<i32>,
    /// Drop rows whose title is empty or pruned
    #[serde(default)]
    pub require_title: bool,
}

impl RecordFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(CordError::Validation(format!(
                    "year_from {} is after year_to {}",
                    from, to
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.year_from.is_none() && self.year_to.is_none() && !self.require_title
    }

    /// Rows without a year fail any year bound.
    pub fn matches(&self, record: &CleanedRecord) -> bool {
        if self.year_from.is_some() || self.year_to.is_some() {
            let Some(year) = record.publish_year else {
                return false;
            };
            if self.year_from.is_some_and(|from| year < from)
                || self.year_to.is_some_and(|to| year > to)
            {
                return false;
            }
        }
        if self.require_title && !record.has_value(Column::Title) {
            return false;
        }
        true
    }
}

/// Ordered, immutable set of cleaned records sharing one schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedDataset {
    schema: Schema,
    records: Vec<CleanedRecord>,
}

impl CleanedDataset {
    pub(crate) fn new(schema: Schema, records: Vec<CleanedRecord>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[CleanedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Only the matching rows; the schema is unchanged.
    ///
    /// An empty filter borrows `self` instead of copying the records.
    pub fn filter(&self, filter: &RecordFilter) -> Cow<'_, CleanedDataset> {
        if filter.is_empty() {
            return Cow::Borrowed(self);
        }
        let records = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Cow::Owned(CleanedDataset::new(self.schema.clone(), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prune::profile_columns;

    fn dataset(years: &[Option<i32>]) -> CleanedDataset {
        let schema = Schema::from_profiles(profile_columns(&[], 0.7));
        let records = years
            .iter()
            .enumerate()
            .map(|(i, year)| CleanedRecord {
                title: Some(if i == 0 { String::new() } else { format!("Paper {}", i) }),
                publish_year: *year,
                ..Default::default()
            })
            .collect();
        CleanedDataset::new(schema, records)
    }

    #[test]
    fn test_filter_year_range() {
        let data = dataset(&[Some(2019), Some(2020), None, Some(2022)]);
        let filter = RecordFilter {
            year_from: Some(2020),
            year_to: Some(2021),
            ..Default::default()
        };
        let filtered = data.filter(&filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records()[0].publish_year, Some(2020));
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_filter_require_title() {
        let data = dataset(&[Some(2020), None, None]);
        let filter = RecordFilter {
            require_title: true,
            ..Default::default()
        };
        assert_eq!(data.filter(&filter).len(), 2);
    }

    #[test]
    fn test_empty_filter_borrows() {
        let data = dataset(&[None, Some(2020)]);
        let view = data.filter(&RecordFilter::default());
        assert!(matches!(view, Cow::Borrowed(_)));
        assert_eq!(*view, data);
    }

    #[test]
    fn test_active_filter_owns_subset() {
        let data = dataset(&[None, Some(2020)]);
        let filter = RecordFilter {
            year_from: Some(2020),
            ..Default::default()
        };
        assert!(matches!(data.filter(&filter), Cow::Owned(_)));
    }

    #[test]
    fn test_validate_inverted_range() {
        let filter = RecordFilter {
            year_from: Some(2022),
            year_to: Some(2020),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
