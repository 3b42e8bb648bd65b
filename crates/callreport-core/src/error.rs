//! Error types for retrieval operations.
//!
//! This module defines [`CallReportError`] which covers every failure that can
//! occur while requesting, decoding, extracting, labeling or exporting Call
//! Report data.
//!
//! Errors fall into three groups:
//!
//! - per-identifier failures, which the orchestrator records and skips
//!   (see [`CallReportError::is_recoverable`]);
//! - batch-level failures ([`CallReportError::InvalidInput`],
//!   [`CallReportError::BatchEmpty`]) that abort a run before output;
//! - mapping failures, which only degrade the output to an unlabeled table.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during Call Report retrieval.
#[derive(Error, Debug)]
pub enum CallReportError {
    /// The identifier list was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An identifier could not be converted to a positive integer.
    #[error("Invalid RSSD ID: {0:?}")]
    InvalidIdentifier(String),

    /// The request envelope could not be built.
    #[error("Request error: {0}")]
    Request(String),

    /// Connection-level failure (DNS, TLS, timeout, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from service: {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// A response or document could not be parsed as XML.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The facsimile payload was not valid base64 or UTF-8.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The decoded document has no `xbrl` element.
    #[error("No <xbrl> element found in the document")]
    MissingRoot,

    /// No identifier in the batch produced any rows.
    #[error("No data was retrieved for any RSSD ID")]
    BatchEmpty,

    /// The MDRM reference file does not exist.
    #[error("MDRM mapping file not found: {}", .0.display())]
    MappingUnavailable(PathBuf),

    /// The MDRM reference file exists but could not be read.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Building or serializing an export failed.
    #[error("Export error: {0}")]
    Export(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CallReportError {
    /// Returns true if this error is confined to a single identifier.
    ///
    /// Any error raised while processing one identifier is recorded against
    /// it and the batch continues; this flag only tells the expected
    /// per-identifier failures apart from unexpected ones in logs.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier(_)
                | Self::Request(_)
                | Self::Network(_)
                | Self::Transport { .. }
                | Self::Parse(_)
                | Self::Decode(_)
                | Self::MissingRoot
        )
    }
}

/// Result type alias using [`CallReportError`].
pub type Result<T> = std::result::Result<T, CallReportError>;
