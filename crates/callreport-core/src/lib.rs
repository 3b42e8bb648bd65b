#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/callreport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for Call Report retrieval.
//!
//! This crate provides the foundational abstractions shared by the provider,
//! mapping and orchestration crates:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`FacsimileProvider`](provider::FacsimileProvider) - Fetches decoded XBRL facsimiles
//! - [`extract_facts`](xbrl::extract_facts) - Flattens an XBRL document into facts
//! - [`CallReportError`](error::CallReportError) - Error taxonomy

/// Error types for retrieval operations.
pub mod error;
/// Provider traits for fetching filings.
pub mod provider;
/// Core data types (RssdId, ReportingPeriod, RawFact, etc.).
pub mod types;
/// XBRL fact extraction.
pub mod xbrl;

// Re-export commonly used items at crate root
pub use error::{CallReportError, Result};
pub use provider::{DataProvider, FacsimileProvider};
pub use types::{Credentials, RawFact, ReportingPeriod, RssdId};
pub use xbrl::extract_facts;
