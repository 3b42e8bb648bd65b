//! Combined result table and its exports.

use std::fmt;
use std::io::Write;

use callreport_core::{CallReportError, RawFact, ReportingPeriod, Result};
use callreport_mdrm::MdrmMapping;
use polars::prelude::*;
use serde::Serialize;

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// A JSON array of row objects.
    Json,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Export file name for a period, e.g. `call_reports_2019_03_31.csv`.
    #[must_use]
    pub fn file_name(&self, period: &ReportingPeriod) -> String {
        format!("call_reports_{}.{}", period.as_file_stem(), self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One output row, borrowed from a [`ResultTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow<'a> {
    /// Identifier the fact was requested for.
    pub rssd_id: &'a str,
    /// Fact id (MDRM key for Call Report concepts).
    pub id: &'a str,
    /// Fact value.
    pub value: &'a str,
    /// Raw `decimals` attribute.
    pub decimal: &'a str,
    /// MDRM label, present only on labeled tables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
}

/// Ordered facts from one batch, optionally with a label column.
///
/// Rows keep identifier submission order, then document order within each
/// identifier. Labels are stored beside the facts and never change them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultTable {
    facts: Vec<RawFact>,
    labels: Option<Vec<String>>,
}

impl ResultTable {
    /// Creates an unlabeled table.
    #[must_use]
    pub const fn new(facts: Vec<RawFact>) -> Self {
        Self {
            facts,
            labels: None,
        }
    }

    /// Adds a `label` column looked up by fact id.
    ///
    /// Facts with no MDRM entry get [`UNKNOWN_METRIC`](callreport_mdrm::UNKNOWN_METRIC).
    #[must_use]
    pub fn with_labels(mut self, mapping: &MdrmMapping) -> Self {
        let labels = self
            .facts
            .iter()
            .map(|fact| mapping.label_or_default(&fact.id).to_string())
            .collect();
        self.labels = Some(labels);
        self
    }

    /// The facts, in table order.
    #[must_use]
    pub fn facts(&self) -> &[RawFact] {
        &self.facts
    }

    /// The label column, if the table was labeled.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Returns true if a label column is present.
    #[must_use]
    pub const fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.facts.iter().enumerate().map(|(i, fact)| TableRow {
            rssd_id: &fact.rssd_id,
            id: &fact.id,
            value: &fact.value,
            decimal: &fact.decimals,
            label: self
                .labels
                .as_ref()
                .and_then(|labels| labels.get(i))
                .map(String::as_str),
        })
    }

    /// Converts the table into a DataFrame.
    ///
    /// Columns: `rssd_id`, `id`, `value`, `decimal`, and `label` when labeled.
    /// All columns are strings.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        self.frame(false)
    }

    fn frame(&self, empty_as_null: bool) -> Result<DataFrame> {
        let column = |name: &str, values: Vec<&str>| {
            if empty_as_null {
                let values: Vec<Option<&str>> =
                    values.into_iter().map(|v| (!v.is_empty()).then_some(v)).collect();
                Column::new(name.into(), values)
            } else {
                Column::new(name.into(), values)
            }
        };

        let mut columns = vec![
            column("rssd_id", self.facts.iter().map(|f| f.rssd_id.as_str()).collect()),
            column("id", self.facts.iter().map(|f| f.id.as_str()).collect()),
            column("value", self.facts.iter().map(|f| f.value.as_str()).collect()),
            column("decimal", self.facts.iter().map(|f| f.decimals.as_str()).collect()),
        ];
        if let Some(labels) = &self.labels {
            columns.push(column("label", labels.iter().map(String::as_str).collect()));
        }

        DataFrame::new(columns).map_err(|e| CallReportError::Export(e.to_string()))
    }

    /// Writes the table as CSV with a header row and flushes the writer.
    ///
    /// Empty values are written as empty fields.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut df = self.frame(true)?;
        CsvWriter::new(&mut writer)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| CallReportError::Export(format!("Failed to write CSV: {e}")))?;
        writer.flush()?;
        Ok(())
    }

    /// Serializes the table as a pretty-printed JSON array of rows.
    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<TableRow<'_>> = self.rows().collect();
        serde_json::to_string_pretty(&rows)
            .map_err(|e| CallReportError::Export(format!("Failed to serialize JSON: {e}")))
    }

    /// Writes the table in the given format and flushes the writer.
    pub fn write<W: Write>(&self, format: ExportFormat, mut writer: W) -> Result<()> {
        match format {
            ExportFormat::Csv => self.write_csv(writer),
            ExportFormat::Json => {
                writer.write_all(self.to_json()?.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()?;
                Ok(())
            }
        }
    }
}
