//! # cordscope
//!
//! Cleaning and aggregation pipeline for the CORD-19 research-paper metadata export.
//!
//! ## Modules
//!
//! - [`record`] - Raw and cleaned record types, the known column set
//! - [`normalize`] - Date parsing, text cleaning, derived fields
//! - [`prune`] - Column missingness profiling and fill policy
//! - [`dataset`] - The cleaned dataset, its schema and row filters
//! - [`aggregate`] - Yearly/monthly counts, top journals, title words, sources
//! - [`summary`] - Dataset-level statistics
//! - [`pipeline`] - End-to-end run producing an [`pipeline::AnalysisReport`]
//! - [`io`] - CSV loading and report export
//! - [`config`] - Pipeline thresholds and word filters
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cordscope::{config::PipelineConfig, io, pipeline};
//! use std::path::Path;
//!
//! fn main() -> cordscope::Result<()> {
//!     let raw = io::load_records(Path::new("data/metadata.csv"), Some(10_000))?;
//!     let output = pipeline::run(&raw, &PipelineConfig::default());
//!     println!("{} papers, top journal: {:?}",
//!         output.report.summary.total_records,
//!         output.report.journals.rows().first().map(|r| &r.key));
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod prune;
pub mod record;
pub mod summary;

pub use error::{CordError, Result};
