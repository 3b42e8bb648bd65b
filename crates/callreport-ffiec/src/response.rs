//! SOAP response unwrapping.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use callreport_core::{CallReportError, Result};

use crate::envelope::SERVICE_NS;

/// Element carrying the base64 facsimile.
const RESULT_ELEMENT: &str = "RetrieveFacsimileResult";

/// Extracts and decodes the facsimile from a `RetrieveFacsimile` response.
///
/// Returns `Ok(None)` if the result element is absent or empty, which is how
/// the service reports that it has nothing for the institution and period.
///
/// # Errors
///
/// - [`CallReportError::Parse`] if the response is not XML
/// - [`CallReportError::Decode`] if the payload is not base64-encoded UTF-8
pub fn unwrap_facsimile(response: &str) -> Result<Option<String>> {
    let doc = roxmltree::Document::parse(response)
        .map_err(|e| CallReportError::Parse(format!("Invalid SOAP response: {e}")))?;

    let payload = doc
        .descendants()
        .find(|n| n.has_tag_name((SERVICE_NS, RESULT_ELEMENT)))
        .and_then(|n| n.text())
        .map(str::trim)
        .unwrap_or_default();

    if payload.is_empty() {
        return Ok(None);
    }

    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let bytes = BASE64
        .decode(&compact)
        .map_err(|e| CallReportError::Decode(format!("Invalid base64 payload: {e}")))?;

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| CallReportError::Decode(format!("Facsimile is not UTF-8: {e}")))
}
