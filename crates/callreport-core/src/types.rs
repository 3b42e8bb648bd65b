//! Core data types for Call Report retrieval.
//!
//! This module defines the fundamental data structures:
//!
//! - [`RssdId`] - Identifier of a regulated institution
//! - [`ReportingPeriod`] - Period-end date of a filing
//! - [`Credentials`] - Username/passphrase pair for the web service
//! - [`RawFact`] - One tagged value extracted from an XBRL facsimile

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CallReportError;

/// Format used in service requests and for display.
const REQUEST_DATE_FORMAT: &str = "%Y/%m/%d";

/// Formats accepted when parsing a period from text.
const ACCEPTED_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

/// RSSD identifier of a regulated financial institution.
///
/// Always a positive integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RssdId(u64);

impl RssdId {
    /// Creates an identifier, rejecting zero.
    pub fn new(id: u64) -> Result<Self, CallReportError> {
        if id == 0 {
            return Err(CallReportError::InvalidIdentifier(id.to_string()));
        }
        Ok(Self(id))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RssdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RssdId {
    type Err = CallReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id = trimmed
            .parse::<u64>()
            .map_err(|_| CallReportError::InvalidIdentifier(s.to_string()))?;
        Self::new(id).map_err(|_| CallReportError::InvalidIdentifier(s.to_string()))
    }
}

/// Period-end date of a Call Report filing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportingPeriod(NaiveDate);

impl ReportingPeriod {
    /// Creates a reporting period from a date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the period as `YYYY/MM/DD`, the form the service expects.
    #[must_use]
    pub fn as_request_str(&self) -> String {
        self.0.format(REQUEST_DATE_FORMAT).to_string()
    }

    /// Returns the period as `YYYY_MM_DD`, safe for use in file names.
    #[must_use]
    pub fn as_file_stem(&self) -> String {
        self.as_request_str().replace('/', "_")
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(REQUEST_DATE_FORMAT))
    }
}

impl FromStr for ReportingPeriod {
    type Err = CallReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ACCEPTED_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .map(Self)
            .ok_or_else(|| {
                CallReportError::InvalidInput(format!(
                    "Invalid period end date {s:?}, expected YYYY-MM-DD or YYYY/MM/DD"
                ))
            })
    }
}

impl From<NaiveDate> for ReportingPeriod {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Username/passphrase pair embedded in each service request.
///
/// The passphrase is never printed by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    passphrase: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the passphrase (security token).
    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// A single tagged value extracted from an XBRL facsimile.
///
/// `value` and `decimals` are kept exactly as they appear in the document;
/// no numeric interpretation is applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFact {
    /// Identifier the fact was requested for.
    pub rssd_id: String,
    /// Local tag name with any namespace prefix removed (e.g. `RCON2170`).
    pub id: String,
    /// Trimmed text content of the element.
    pub value: String,
    /// Raw `decimals` attribute.
    pub decimals: String,
}

impl RawFact {
    /// Creates a new fact.
    #[must_use]
    pub fn new(
        rssd_id: impl Into<String>,
        id: impl Into<String>,
        value: impl Into<String>,
        decimals: impl Into<String>,
    ) -> Self {
        Self {
            rssd_id: rssd_id.into(),
            id: id.into(),
            value: value.into(),
            decimals: decimals.into(),
        }
    }
}
