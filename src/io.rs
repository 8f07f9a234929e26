//! CSV loading and report export.
//!
//! The pipeline itself never touches the filesystem; these helpers sit at its edges for
//! the CLI and the dashboard server.

use crate::aggregate::AggregateTable;
use crate::dataset::CleanedDataset;
use crate::error::Result;
use crate::record::{CleanedRecord, Column, RawRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Read `metadata.csv` rows, optionally only the first `sample` of them.
///
/// Columns outside the known set are ignored; empty cells become `None`.
pub fn load_records(path: &Path, sample: Option<usize>) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let limit = sample.unwrap_or(usize::MAX);
    let records = reader
        .deserialize::<RawRecord>()
        .take(limit)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(path = %path.display(), records = records.len(), sampled = sample.is_some(), "Loaded records");
    Ok(records)
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn derived_headers(column: Column) -> &'static [&'static str] {
    match column {
        Column::Title => &["title_word_count"],
        Column::Abstract => &["abstract_length"],
        Column::PublishTime => &["publish_year", "publish_month"],
        Column::Authors => &["author_count"],
        _ => &[],
    }
}

fn row_values(record: &CleanedRecord, column: Column) -> Vec<String> {
    match column {
        Column::Title => vec![optional(record.title.as_deref()), optional(record.title_word_count)],
        Column::Abstract => vec![
            optional(record.abstract_text.as_deref()),
            optional(record.abstract_length),
        ],
        Column::PublishTime => vec![optional(record.publish_year), optional(record.publish_month)],
        Column::Authors => vec![optional(record.author_count)],
        other => vec![optional(record.text(other))],
    }
}

/// Write the cleaned dataset with only its surviving columns.
///
/// Text columns keep their header; `publish_time` and `authors` are replaced by their
/// derived fields.
pub fn write_cleaned_csv(path: &Path, dataset: &CleanedDataset) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;

    let columns = dataset.schema().columns();
    let mut header: Vec<&str> = Vec::new();
    for &column in columns {
        if column.is_text() {
            header.push(column.header());
        }
        header.extend_from_slice(derived_headers(column));
    }
    writer.write_record(&header)?;

    for record in dataset.records() {
        let row: Vec<String> = columns.iter().flat_map(|&c| row_values(record, c)).collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), records = dataset.len(), "Saved cleaned dataset");
    Ok(())
}

/// Write one aggregate table as CSV with `key,count[,percentage]` columns.
///
/// The header is written even for an empty table.
pub fn write_table_csv<K: Serialize>(path: &Path, table: &AggregateTable<K>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;

    let mut header = vec!["key", "count"];
    if table.has_percentage() {
        header.push("percentage");
    }
    writer.write_record(&header)?;

    for row in table.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = table.len(), "Saved table");
    Ok(())
}

/// Pretty-print any serializable value to a JSON file
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    info!(path = %path.display(), "Saved JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{source_distribution, top_journals, yearly_counts};
    use crate::config::PipelineConfig;
    use crate::prune::clean;
    use tempfile::{tempdir, NamedTempFile};

    const METADATA: &str = "\
cord_uid,sha,source_x,title,doi,pmcid,license,abstract,publish_time,authors,journal,url
ug7v899j,abc,PMC,Clinical features of culture-proven pneumonia,10.1/a,PMC1,no-cc,Retrospective chart review,2001-07-04,\"Madani, Tariq A\",BMC Infect Dis,https://a
02tnwd4m,def,PMC,Nitric oxide: a pro-inflammatory mediator,,PMC2,,,2000-08-15,\"Vliet, Albert van der\",Respir Res,
ejv2xln0,,Medline,Surfactant protein-D,10.1/c,,,Surfactant protein-D is a member,2000,,Respir Res,
";

    fn metadata_file() -> Result<NamedTempFile> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(METADATA.as_bytes())?;
        Ok(temp)
    }

    #[test]
    fn test_load_records() -> Result<()> {
        let temp = metadata_file()?;
        let records = load_records(temp.path(), None)?;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source_x.as_deref(), Some("PMC"));
        assert_eq!(records[0].authors.as_deref(), Some("Madani, Tariq A"));
        assert_eq!(records[1].abstract_text, None);
        assert_eq!(records[2].publish_time.as_deref(), Some("2000"));
        Ok(())
    }

    #[test]
    fn test_load_records_sample() -> Result<()> {
        let temp = metadata_file()?;
        assert_eq!(load_records(temp.path(), Some(2))?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_records(Path::new("/nonexistent/metadata.csv"), None).is_err());
    }

    #[test]
    fn test_write_cleaned_csv_only_surviving_columns() -> Result<()> {
        let temp = metadata_file()?;
        let dataset = clean(&load_records(temp.path(), None)?, &PipelineConfig::default());

        let dir = tempdir()?;
        let out = dir.path().join("cleaned.csv");
        write_cleaned_csv(&out, &dataset)?;

        let mut reader = csv::Reader::from_path(&out)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        assert!(headers.contains(&"publish_year".to_string()));
        assert!(headers.contains(&"title_word_count".to_string()));
        assert!(!headers.contains(&"publish_time".to_string()));
        // license is missing in 2 of 3 rows and survives
        assert!(headers.contains(&"license".to_string()));
        assert_eq!(reader.records().count(), 3);
        Ok(())
    }

    #[test]
    fn test_write_table_and_json() -> Result<()> {
        let temp = metadata_file()?;
        let dataset = clean(&load_records(temp.path(), None)?, &PipelineConfig::default());
        let journals = top_journals(&dataset, 5);

        let dir = tempdir()?;
        let csv_path = dir.path().join("journals.csv");
        let json_path = dir.path().join("journals.json");
        write_table_csv(&csv_path, &journals)?;
        write_json(&json_path, &journals)?;

        let content = std::fs::read_to_string(&csv_path)?;
        assert!(content.starts_with("key,count"));
        assert!(content.contains("Respir Res,2"));

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
        assert_eq!(json[0]["key"], "Respir Res");
        assert_eq!(json[0]["count"], 2);
        Ok(())
    }

    #[test]
    fn test_write_empty_tables_keep_header() -> Result<()> {
        let dataset = clean(&[], &PipelineConfig::default());
        let dir = tempdir()?;

        let years_path = dir.path().join("years.csv");
        write_table_csv(&years_path, &yearly_counts(&dataset))?;
        assert_eq!(std::fs::read_to_string(&years_path)?, "key,count\n");

        let sources_path = dir.path().join("sources.csv");
        write_table_csv(&sources_path, &source_distribution(&dataset))?;
        assert_eq!(std::fs::read_to_string(&sources_path)?, "key,count,percentage\n");
        Ok(())
    }

    #[test]
    fn test_write_source_table_rows() -> Result<()> {
        let temp = metadata_file()?;
        let dataset = clean(&load_records(temp.path(), None)?, &PipelineConfig::default());
        let dir = tempdir()?;
        let path = dir.path().join("sources.csv");
        write_table_csv(&path, &source_distribution(&dataset))?;

        let mut reader = csv::Reader::from_path(&path)?;
        assert_eq!(reader.headers()?.len(), 3);
        let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "PMC");
        assert_eq!(&rows[0][1], "2");
        Ok(())
    }
}
