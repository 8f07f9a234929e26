//! End-to-end run: clean the raw rows, then build every table the report needs.

use crate::aggregate::{
    monthly_counts, publication_trend, source_distribution, title_word_frequency, top_journals,
    yearly_counts, AggregateTable, PublicationTrend,
};
use crate::config::PipelineConfig;
use crate::dataset::CleanedDataset;
use crate::prune::clean;
use crate::record::RawRecord;
use crate::summary::{summarize, SummaryStatistics};
use serde::Serialize;
use tracing::info;

/// Everything the report and dashboard render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub summary: SummaryStatistics,
    pub yearly: AggregateTable<i32>,
    pub monthly: AggregateTable<u32>,
    pub journals: AggregateTable<String>,
    pub words: AggregateTable<String>,
    pub sources: AggregateTable<String>,
    pub trend: Option<PublicationTrend>,
}

/// Output of one pipeline invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub dataset: CleanedDataset,
    pub report: AnalysisReport,
}

pub fn analyze(dataset: &CleanedDataset, config: &PipelineConfig) -> AnalysisReport {
    let yearly = yearly_counts(dataset);
    let trend = publication_trend(&yearly);

    let report = AnalysisReport {
        summary: summarize(dataset),
        monthly: monthly_counts(dataset),
        journals: top_journals(dataset, config.top_journals),
        words: title_word_frequency(dataset, &config.words),
        sources: source_distribution(dataset),
        yearly,
        trend,
    };

    info!(
        records = report.summary.total_records,
        years = report.yearly.len(),
        journals = report.journals.len(),
        words = report.words.len(),
        sources = report.sources.len(),
        "Analysis complete"
    );
    report
}

/// Clean the raw rows and analyze the result
pub fn run(records: &[RawRecord], config: &PipelineConfig) -> PipelineOutput {
    let dataset = clean(records, config);
    let report = analyze(&dataset, config);
    PipelineOutput { dataset, report }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RawRecord> {
        let rows = [
            ("Viral load in children", "Pediatrics", "2020-04-02", "Smith, Lee", "PMC"),
            ("Masks and viral spread", "BMJ", "2020 May", "Khan", "Medline"),
            ("Vaccine uptake survey", "BMJ", "2021-01-15", "", "PMC"),
            ("Long term outcomes", "", "not a date", "Ng, Ode, Park", "WHO"),
        ];
        rows.iter()
            .map(|(title, journal, date, authors, source)| RawRecord {
                title: Some(title.to_string()),
                journal: Some(journal.to_string()),
                publish_time: Some(date.to_string()),
                authors: Some(authors.to_string()),
                source_x: Some(source.to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_run_is_idempotent() {
        let config = PipelineConfig::default();
        assert_eq!(run(&sample(), &config), run(&sample(), &config));
    }

    #[test]
    fn test_run_sample() {
        let output = run(&sample(), &PipelineConfig::default());
        let report = &output.report;

        assert_eq!(output.dataset.len(), 4);
        assert_eq!(report.summary.total_records, 4);
        assert_eq!(report.yearly.count_of(&2020), Some(2));
        assert_eq!(report.yearly.total(), 3);
        assert_eq!(report.journals.rows()[0].key, "BMJ");
        assert_eq!(report.words.rows()[0].key, "viral");
        assert_eq!(report.sources.count_of(&"PMC".to_string()), Some(2));
        assert_eq!(output.dataset.records()[2].author_count, Some(0));
        assert_eq!(output.dataset.records()[3].author_count, Some(3));
    }

    #[test]
    fn test_run_empty_input() {
        let output = run(&[], &PipelineConfig::default());
        assert!(output.dataset.is_empty());
        assert!(output.report.yearly.is_empty());
        assert!(output.report.journals.is_empty());
        assert!(output.report.words.is_empty());
        assert!(output.report.sources.is_empty());
        assert_eq!(output.report.summary.total_records, 0);
        assert_eq!(output.report.trend, None);
    }
}
