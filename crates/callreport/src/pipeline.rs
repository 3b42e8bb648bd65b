//! Batch orchestration: fetch, extract, combine and label.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use callreport_core::{CallReportError, FacsimileProvider, RawFact, ReportingPeriod, Result};
use callreport_mdrm::{DEFAULT_MDRM_PATH, MdrmMapping, load_mapping};

use crate::table::ResultTable;

/// Where the pipeline gets its MDRM labels from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingSource {
    /// Load the reference table from a CSV file once per run.
    File(PathBuf),
    /// Use an already loaded mapping.
    Preloaded(MdrmMapping),
    /// Do not label rows.
    Disabled,
}

impl Default for MappingSource {
    fn default() -> Self {
        Self::File(PathBuf::from(DEFAULT_MDRM_PATH))
    }
}

/// Options for a [`CallReportPipeline`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Source of MDRM labels.
    pub mapping: MappingSource,
    /// Maximum identifiers in flight at once. `1` processes them strictly
    /// one after another; output order never depends on this value.
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mapping: MappingSource::default(),
            concurrency: 1,
        }
    }
}

impl PipelineOptions {
    /// Sets the mapping source.
    #[must_use]
    pub fn with_mapping(mut self, mapping: MappingSource) -> Self {
        self.mapping = mapping;
        self
    }

    /// Sets the concurrency level (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// What happened to one identifier.
#[derive(Debug)]
pub enum IdentifierOutcome {
    /// The facsimile was retrieved and yielded this many rows.
    Retrieved {
        /// Number of facts extracted.
        rows: usize,
    },
    /// The service had no facsimile for the identifier.
    NoData,
    /// A stage failed; the identifier contributed no rows.
    Failed(CallReportError),
}

/// Outcome of one identifier in a batch.
#[derive(Debug)]
pub struct IdentifierReport {
    /// Identifier as submitted.
    pub identifier: String,
    /// What happened.
    pub outcome: IdentifierOutcome,
}

impl IdentifierReport {
    /// Number of rows this identifier contributed.
    #[must_use]
    pub const fn rows(&self) -> usize {
        match self.outcome {
            IdentifierOutcome::Retrieved { rows } => rows,
            _ => 0,
        }
    }
}

/// A non-fatal condition the presentation layer should surface.
#[derive(Debug)]
pub enum Advisory<'a> {
    /// The service returned no facsimile for an identifier.
    NoData {
        /// Identifier as submitted.
        identifier: &'a str,
    },
    /// An identifier failed and was skipped.
    IdentifierFailed {
        /// Identifier as submitted.
        identifier: &'a str,
        /// Why it failed.
        error: &'a CallReportError,
    },
    /// The MDRM mapping could not be loaded; the table is unlabeled.
    MappingUnavailable(&'a CallReportError),
}

impl fmt::Display for Advisory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData { identifier } => write!(f, "No data found for RSSD ID: {identifier}"),
            Self::IdentifierFailed { identifier, error } => {
                write!(f, "Error processing RSSD ID {identifier}: {error}")
            }
            Self::MappingUnavailable(error) => {
                write!(f, "{error}. Mapped data will not be available.")
            }
        }
    }
}

/// Result of a completed batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Combined rows, labeled when the mapping was available.
    pub table: ResultTable,
    /// One entry per submitted identifier, in submission order.
    pub identifiers: Vec<IdentifierReport>,
    /// Why labeling was skipped, if it was attempted and failed.
    pub mapping_error: Option<CallReportError>,
}

impl BatchReport {
    /// Identifiers that failed at some stage.
    pub fn failures(&self) -> impl Iterator<Item = &IdentifierReport> {
        self.identifiers
            .iter()
            .filter(|r| matches!(r.outcome, IdentifierOutcome::Failed(_)))
    }

    /// All non-fatal conditions, per-identifier ones first.
    #[must_use]
    pub fn advisories(&self) -> Vec<Advisory<'_>> {
        let mut advisories: Vec<Advisory<'_>> = self
            .identifiers
            .iter()
            .filter_map(|report| match &report.outcome {
                IdentifierOutcome::Retrieved { .. } => None,
                IdentifierOutcome::NoData => Some(Advisory::NoData {
                    identifier: &report.identifier,
                }),
                IdentifierOutcome::Failed(error) => Some(Advisory::IdentifierFailed {
                    identifier: &report.identifier,
                    error,
                }),
            })
            .collect();

        if let Some(error) = &self.mapping_error {
            advisories.push(Advisory::MappingUnavailable(error));
        }
        advisories
    }
}

/// Splits a comma-separated identifier list, trimming entries and dropping
/// empty ones.
///
/// # Errors
///
/// [`CallReportError::InvalidInput`] if no identifier remains.
///
/// # Example
///
/// ```
/// use callreport::parse_identifier_list;
///
/// let ids = parse_identifier_list(" 1842065, ,480228,").unwrap();
/// assert_eq!(ids, vec!["1842065", "480228"]);
/// assert!(parse_identifier_list(" , ").is_err());
/// ```
pub fn parse_identifier_list(input: &str) -> Result<Vec<String>> {
    let identifiers: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if identifiers.is_empty() {
        return Err(CallReportError::InvalidInput(
            "Please enter at least one RSSD ID".to_string(),
        ));
    }
    Ok(identifiers)
}

/// Runs batches of identifiers through a [`FacsimileProvider`].
///
/// Each identifier is fetched, decoded and flattened independently; a
/// failure is recorded against that identifier and the batch continues.
pub struct CallReportPipeline {
    provider: Arc<dyn FacsimileProvider>,
    options: PipelineOptions,
}

impl fmt::Debug for CallReportPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallReportPipeline")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish()
    }
}

impl CallReportPipeline {
    /// Create a pipeline over any facsimile provider.
    #[must_use]
    pub fn new(provider: Arc<dyn FacsimileProvider>, options: PipelineOptions) -> Self {
        debug!(provider = provider.name(), "Creating pipeline");
        Self { provider, options }
    }

    /// Create a pipeline backed by the FFIEC CDR web service.
    #[cfg(feature = "ffiec")]
    pub fn ffiec(
        credentials: callreport_core::Credentials,
        config: callreport_ffiec::FfiecConfig,
        options: PipelineOptions,
    ) -> Result<Self> {
        let provider = callreport_ffiec::FfiecProvider::new(credentials, config)?;
        Ok(Self::new(Arc::new(provider), options))
    }

    /// Returns the pipeline options.
    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs a batch from a comma-separated identifier list.
    ///
    /// # Errors
    ///
    /// - [`CallReportError::InvalidInput`] if the list is empty; nothing is fetched
    /// - [`CallReportError::BatchEmpty`] if no identifier produced any rows
    pub async fn run(&self, identifiers: &str, period: &ReportingPeriod) -> Result<BatchReport> {
        let identifiers = parse_identifier_list(identifiers)?;
        self.run_identifiers(&identifiers, period).await
    }

    /// Runs a batch over already split identifiers.
    ///
    /// Identifiers are processed in order with at most
    /// [`PipelineOptions::concurrency`] in flight; results are combined in
    /// submission order either way.
    pub async fn run_identifiers(
        &self,
        identifiers: &[String],
        period: &ReportingPeriod,
    ) -> Result<BatchReport> {
        if identifiers.is_empty() {
            return Err(CallReportError::InvalidInput(
                "Please enter at least one RSSD ID".to_string(),
            ));
        }

        let total = identifiers.len();
        info!(
            provider = self.provider.name(),
            identifiers = total,
            period = %period,
            "Starting batch"
        );

        let results: Vec<(IdentifierReport, Vec<RawFact>)> =
            stream::iter(identifiers.iter().enumerate())
                .map(|(index, identifier)| {
                    self.process_identifier(index, total, identifier, period)
                })
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;

        let mut reports = Vec::with_capacity(results.len());
        let mut facts = Vec::new();
        for (report, rows) in results {
            facts.extend(rows);
            reports.push(report);
        }

        if facts.is_empty() {
            warn!("No data was retrieved for any RSSD ID");
            return Err(CallReportError::BatchEmpty);
        }

        let table = ResultTable::new(facts);
        let (table, mapping_error) = self.apply_labels(table);

        info!(
            rows = table.len(),
            labeled = table.is_labeled(),
            failed = reports
                .iter()
                .filter(|r| matches!(r.outcome, IdentifierOutcome::Failed(_)))
                .count(),
            "Batch complete"
        );

        Ok(BatchReport {
            table,
            identifiers: reports,
            mapping_error,
        })
    }

    async fn process_identifier(
        &self,
        index: usize,
        total: usize,
        identifier: &str,
        period: &ReportingPeriod,
    ) -> (IdentifierReport, Vec<RawFact>) {
        info!(rssd_id = identifier, "Processing RSSD ID ({}/{})", index + 1, total);

        let (outcome, facts) = match self.provider.fetch_facts(identifier, period).await {
            Ok(Some(facts)) => (IdentifierOutcome::Retrieved { rows: facts.len() }, facts),
            Ok(None) => {
                warn!(rssd_id = identifier, "No data found");
                (IdentifierOutcome::NoData, Vec::new())
            }
            Err(e) => {
                warn!(
                    rssd_id = identifier,
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Failed to process RSSD ID"
                );
                (IdentifierOutcome::Failed(e), Vec::new())
            }
        };

        let report = IdentifierReport {
            identifier: identifier.to_string(),
            outcome,
        };
        (report, facts)
    }

    fn apply_labels(&self, table: ResultTable) -> (ResultTable, Option<CallReportError>) {
        match &self.options.mapping {
            MappingSource::Disabled => (table, None),
            MappingSource::Preloaded(mapping) => (table.with_labels(mapping), None),
            MappingSource::File(path) => match load_mapping(path) {
                Ok(mapping) => (table.with_labels(&mapping), None),
                Err(e) => {
                    warn!(error = %e, "MDRM mapping unavailable, continuing without labels");
                    (table, Some(e))
                }
            },
        }
    }
}
