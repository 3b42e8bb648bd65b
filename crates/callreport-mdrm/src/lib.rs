#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/callreport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! MDRM mapping loader.
//!
//! The MDRM export starts with a one-line banner, followed by a header row
//! and one row per item. Only three columns are used:
//!
//! - `Mnemonic` - four-letter series code, e.g. `RCON`
//! - `Item Code` - numeric code, read as text to keep leading zeros
//! - `Item Name` - the label
//!
//! # Example
//!
//! ```no_run
//! use callreport_mdrm::{DEFAULT_MDRM_PATH, load_mapping};
//!
//! let mapping = load_mapping(DEFAULT_MDRM_PATH)?;
//! println!("{}", mapping.label_or_default("RCON2170"));
//! # Ok::<(), callreport_core::CallReportError>(())
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use callreport_core::{CallReportError, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

/// Default location of the MDRM export, relative to the working directory.
pub const DEFAULT_MDRM_PATH: &str = "downloads/taxonomy/MDRM/MDRM_CSV.csv";

/// Label used for facts with no MDRM entry.
pub const UNKNOWN_METRIC: &str = "Unknown metric";

/// Width item codes are zero-padded to.
const ITEM_CODE_WIDTH: usize = 4;

const MNEMONIC_COLUMN: &str = "Mnemonic";
const ITEM_CODE_COLUMN: &str = "Item Code";
const ITEM_NAME_COLUMN: &str = "Item Name";

/// Left-pads `code` with zeros to `width` characters.
///
/// Codes already at least `width` characters long are returned unchanged.
#[must_use]
pub fn zfill(code: &str, width: usize) -> String {
    format!("{code:0>width$}")
}

/// Builds the composite MDRM key: trimmed mnemonic followed by the
/// four-digit item code.
///
/// # Example
///
/// ```
/// use callreport_mdrm::composite_key;
///
/// assert_eq!(composite_key(" RCON ", "2170"), "RCON2170");
/// assert_eq!(composite_key("RIAD", "7"), "RIAD0007");
/// ```
#[must_use]
pub fn composite_key(mnemonic: &str, item_code: &str) -> String {
    format!("{}{}", mnemonic.trim(), zfill(item_code, ITEM_CODE_WIDTH))
}

/// Lookup from composite MDRM key to item name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MdrmMapping {
    labels: HashMap<String, String>,
}

impl MdrmMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label, replacing any previous one. Returns true on replace.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) -> bool {
        self.labels.insert(key.into(), label.into()).is_some()
    }

    /// Returns the label for a fact id, if the reference table has a
    /// non-empty one.
    #[must_use]
    pub fn get(&self, fact_id: &str) -> Option<&str> {
        self.labels
            .get(fact_id)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    /// Returns the label for a fact id, or [`UNKNOWN_METRIC`].
    #[must_use]
    pub fn label_or_default(&self, fact_id: &str) -> &str {
        self.get(fact_id).unwrap_or(UNKNOWN_METRIC)
    }

    /// Number of keys in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the mapping has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MdrmMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, label) in iter {
            mapping.insert(key, label);
        }
        mapping
    }
}

/// Loads the MDRM mapping from a CSV file.
///
/// # Errors
///
/// - [`CallReportError::MappingUnavailable`] if the file does not exist
/// - [`CallReportError::Mapping`] if it cannot be read as CSV or lacks a
///   required column
pub fn load_mapping(path: impl AsRef<Path>) -> Result<MdrmMapping> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CallReportError::MappingUnavailable(path.to_path_buf()),
        _ => CallReportError::Io(e),
    })?;

    let mapping = read_mapping(file)?;
    info!(path = %path.display(), entries = mapping.len(), "Loaded MDRM mapping");
    Ok(mapping)
}

/// Reads an MDRM mapping from any reader (banner row first).
pub fn read_mapping<R: Read>(reader: R) -> Result<MdrmMapping> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();

    // Banner row
    records
        .next()
        .transpose()
        .map_err(csv_error)?
        .ok_or_else(|| CallReportError::Mapping("MDRM file is empty".to_string()))?;

    let header = records
        .next()
        .transpose()
        .map_err(csv_error)?
        .ok_or_else(|| CallReportError::Mapping("MDRM file has no header row".to_string()))?;

    let mnemonic_idx = column_index(&header, MNEMONIC_COLUMN)?;
    let code_idx = column_index(&header, ITEM_CODE_COLUMN)?;
    let name_idx = column_index(&header, ITEM_NAME_COLUMN)?;

    let mut mapping = MdrmMapping::new();
    let mut replaced = 0usize;
    let mut skipped = 0usize;

    for record in records {
        let record = record.map_err(csv_error)?;

        let (Some(mnemonic), Some(code)) = (record.get(mnemonic_idx), record.get(code_idx)) else {
            skipped += 1;
            continue;
        };
        if mnemonic.trim().is_empty() || code.is_empty() {
            skipped += 1;
            continue;
        }

        let label = record.get(name_idx).unwrap_or_default();
        if mapping.insert(composite_key(mnemonic, code), label) {
            replaced += 1;
        }
    }

    debug!(
        entries = mapping.len(),
        replaced, skipped, "Built MDRM lookup"
    );
    Ok(mapping)
}

fn column_index(header: &StringRecord, name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| CallReportError::Mapping(format!("MDRM file has no {name:?} column")))
}

fn csv_error(e: csv::Error) -> CallReportError {
    CallReportError::Mapping(format!("Invalid MDRM CSV: {e}"))
}
