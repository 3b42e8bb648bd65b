//! SOAP request construction.
//!
//! The envelope follows the CDR service's WS-Addressing / WS-Security
//! convention: the action and target in the header, a plain-text
//! `UsernameToken`, and a `RetrieveFacsimile` body. All values are written
//! through an XML writer, so credentials and identifiers are escaped.

use std::fmt::Display;
use std::io::Cursor;

use callreport_core::{CallReportError, Credentials, ReportingPeriod, Result, RssdId};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::FfiecConfig;

pub(crate) const SOAP12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub(crate) const SERVICE_NS: &str = "http://cdr.ffiec.gov/public/services";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";
const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// Data series requested from the service.
const DATA_SERIES: &str = "Call";
/// Identifier type discriminator for RSSD IDs.
const FI_ID_TYPE: &str = "ID_RSSD";
/// Facsimile format requested from the service.
const FACSIMILE_FORMAT: &str = "XBRL";

/// Builds the `RetrieveFacsimile` SOAP 1.2 envelope for one institution.
pub fn build_request(
    rssd_id: RssdId,
    period: &ReportingPeriod,
    credentials: &Credentials,
    config: &FfiecConfig,
) -> Result<String> {
    let mut wr = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml)?;

    start(
        &mut wr,
        BytesStart::new("soap12:Envelope").with_attributes([
            ("xmlns:xsi", XSI_NS),
            ("xmlns:xsd", XSD_NS),
            ("xmlns:soap12", SOAP12_NS),
            ("xmlns:wsa", WSA_NS),
        ]),
    )?;

    start(&mut wr, BytesStart::new("soap12:Header"))?;
    text_element(&mut wr, "wsa:Action", &config.soap_action)?;
    text_element(&mut wr, "wsa:To", &config.endpoint)?;
    start(
        &mut wr,
        BytesStart::new("wsse:Security").with_attributes([("xmlns:wsse", WSSE_NS)]),
    )?;
    start(&mut wr, BytesStart::new("wsse:UsernameToken"))?;
    text_element(&mut wr, "wsse:Username", credentials.username())?;
    text_element(&mut wr, "wsse:Password", credentials.passphrase())?;
    end(&mut wr, "wsse:UsernameToken")?;
    end(&mut wr, "wsse:Security")?;
    end(&mut wr, "soap12:Header")?;

    start(&mut wr, BytesStart::new("soap12:Body"))?;
    start(
        &mut wr,
        BytesStart::new("RetrieveFacsimile").with_attributes([("xmlns", SERVICE_NS)]),
    )?;
    text_element(&mut wr, "dataSeries", DATA_SERIES)?;
    text_element(&mut wr, "reportingPeriodEndDate", &period.as_request_str())?;
    text_element(&mut wr, "fiIDType", FI_ID_TYPE)?;
    text_element(&mut wr, "fiID", &rssd_id.to_string())?;
    text_element(&mut wr, "facsimileFormat", FACSIMILE_FORMAT)?;
    end(&mut wr, "RetrieveFacsimile")?;
    end(&mut wr, "soap12:Body")?;

    end(&mut wr, "soap12:Envelope")?;

    String::from_utf8(wr.into_inner().into_inner())
        .map_err(|e| CallReportError::Request(format!("Envelope is not UTF-8: {e}")))
}

fn xml<E: Display>(e: E) -> CallReportError {
    CallReportError::Request(format!("Failed to write envelope: {e}"))
}

fn start(wr: &mut Writer<Cursor<Vec<u8>>>, element: BytesStart<'_>) -> Result<()> {
    wr.write_event(Event::Start(element)).map_err(xml)
}

fn end(wr: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<()> {
    wr.write_event(Event::End(BytesEnd::new(name))).map_err(xml)
}

fn text_element(wr: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    start(wr, BytesStart::new(name))?;
    wr.write_event(Event::Text(BytesText::new(text))).map_err(xml)?;
    end(wr, name)
}
