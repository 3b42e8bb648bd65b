#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/callreport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Call Report retrieval pipeline.
//!
//! This crate ties the provider, extraction and labeling crates together
//! behind [`CallReportPipeline`]. It re-exports the core types so callers
//! only need one dependency.
//!
//! # Features
//!
//! - `ffiec` - FFIEC CDR web service provider (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use callreport::{CallReportPipeline, Credentials, ExportFormat, FfiecConfig, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() -> callreport::Result<()> {
//!     let pipeline = CallReportPipeline::ffiec(
//!         Credentials::new("username", "security-token"),
//!         FfiecConfig::default(),
//!         PipelineOptions::default(),
//!     )?;
//!
//!     let period = "2019/03/31".parse()?;
//!     let report = pipeline.run("1842065, 480228", &period).await?;
//!     for advisory in report.advisories() {
//!         eprintln!("{advisory}");
//!     }
//!
//!     let file = std::fs::File::create(ExportFormat::Csv.file_name(&period))?;
//!     report.table.write_csv(file)?;
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use callreport_core::*;

// Reference data
pub use callreport_mdrm::{DEFAULT_MDRM_PATH, MdrmMapping, UNKNOWN_METRIC, load_mapping};

// Providers
#[cfg(feature = "ffiec")]
pub use callreport_ffiec::{FfiecConfig, FfiecProvider};

mod pipeline;
mod table;

pub use pipeline::{
    Advisory, BatchReport, CallReportPipeline, IdentifierOutcome, IdentifierReport,
    MappingSource, PipelineOptions, parse_identifier_list,
};
pub use table::{ExportFormat, ResultTable, TableRow};
