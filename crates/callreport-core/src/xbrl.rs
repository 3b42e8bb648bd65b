//! XBRL fact extraction.
//!
//! Call Report facsimiles are XBRL instance documents. Numeric facts are the
//! elements carrying a `decimals` attribute; contexts, units and other
//! structural elements never do. [`extract_facts`] walks the document once
//! and emits one [`RawFact`] per such element, in document order.
//!
//! The reader is namespace-agnostic: prefixes are matched textually and never
//! resolved, so documents with unknown default namespaces or undeclared
//! prefixes are accepted.

use std::borrow::Cow;

use html_escape::decode_html_entities;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use crate::{
    error::{CallReportError, Result},
    types::RawFact,
};

/// Local name of the XBRL instance root element.
const XBRL_ROOT: &str = "xbrl";

/// Attribute that marks an element as a numeric fact.
const DECIMALS_ATTR: &[u8] = b"decimals";

/// Extracts every numeric fact from an XBRL document.
///
/// Entities are unescaped once before parsing, since the service sometimes
/// double-escapes the facsimile. Only descendants of the first `xbrl`
/// element are considered.
///
/// # Errors
///
/// - [`CallReportError::MissingRoot`] if no `xbrl` element exists
/// - [`CallReportError::Parse`] if the document is not well-formed enough to read
pub fn extract_facts(document: &str, rssd_id: &str) -> Result<Vec<RawFact>> {
    let content = decode_html_entities(document);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().check_end_names = false;

    let mut facts: Vec<RawFact> = Vec::new();
    // (depth, index into `facts`) for fact elements that are still open
    let mut open: Vec<(usize, usize)> = Vec::new();
    // Depth below the root element, `None` outside of it
    let mut depth: Option<usize> = None;
    let mut found_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            CallReportError::Parse(format!(
                "Invalid XBRL document at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(element) => match depth {
                None => {
                    if is_root(&element) {
                        found_root = true;
                        depth = Some(0);
                    }
                }
                Some(d) => {
                    let d = d + 1;
                    depth = Some(d);
                    if let Some(fact) = fact_from_element(&element, rssd_id) {
                        facts.push(fact);
                        open.push((d, facts.len() - 1));
                    }
                }
            },
            Event::Empty(element) => match depth {
                None => {
                    if is_root(&element) {
                        found_root = true;
                        break;
                    }
                }
                Some(_) => {
                    if let Some(fact) = fact_from_element(&element, rssd_id) {
                        facts.push(fact);
                    }
                }
            },
            Event::Text(text) => {
                append_text(&mut facts, &open, &String::from_utf8_lossy(&text));
            }
            Event::CData(data) => {
                append_text(&mut facts, &open, &String::from_utf8_lossy(&data));
            }
            Event::End(_) => match depth {
                Some(0) => break,
                Some(d) => {
                    while open.last().is_some_and(|&(open_depth, _)| open_depth == d) {
                        open.pop();
                    }
                    depth = Some(d - 1);
                }
                None => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_root {
        return Err(CallReportError::MissingRoot);
    }

    trace!(rssd_id, facts = facts.len(), "Walked XBRL document");
    Ok(facts)
}

/// Strips a namespace prefix from a qualified tag name.
///
/// `us-gaap:Assets` becomes `Assets`; names without a colon are returned
/// unchanged.
#[must_use]
pub fn fact_id(qualified_name: &str) -> &str {
    qualified_name.rsplit(':').next().unwrap_or(qualified_name)
}

fn qualified_name<'a>(element: &'a BytesStart<'_>) -> Cow<'a, str> {
    String::from_utf8_lossy(element.name().into_inner())
}

fn is_root(element: &BytesStart<'_>) -> bool {
    fact_id(&qualified_name(element)) == XBRL_ROOT
}

fn fact_from_element(element: &BytesStart<'_>, rssd_id: &str) -> Option<RawFact> {
    let decimals = element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == DECIMALS_ATTR)?;

    let decimals = decode_html_entities(&String::from_utf8_lossy(&decimals.value)).into_owned();
    let name = qualified_name(element);

    Some(RawFact::new(rssd_id, fact_id(&name), String::new(), decimals))
}

/// Appends a trimmed text node to every open fact, mirroring how nested text
/// is concatenated into the enclosing element's value.
fn append_text(facts: &mut [RawFact], open: &[(usize, usize)], raw: &str) {
    if open.is_empty() {
        return;
    }
    let text = decode_html_entities(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    for &(_, index) in open {
        facts[index].value.push_str(trimmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrl xmlns="http://www.xbrl.org/2003/instance"
      xmlns:cc="http://www.ffiec.gov/xbrl/call/concepts"
      xmlns:xbrli="http://www.xbrl.org/2003/instance">
  <context id="CI_1842065_2019-03-31">
    <entity><identifier scheme="http://www.ffiec.gov/cdr">1842065</identifier></entity>
    <period><instant>2019-03-31</instant></period>
  </context>
  <unit id="USD"><measure>iso4217:USD</measure></unit>
  <cc:RCON2170 contextRef="CI_1842065_2019-03-31" unitRef="USD" decimals="0">  2150000 </cc:RCON2170>
  <cc:RIAD4340 contextRef="CI_1842065_2019-03-31" unitRef="USD" decimals="0">31000</cc:RIAD4340>
  <cc:RCON9999 contextRef="CI_1842065_2019-03-31">2019-03-31</cc:RCON9999>
  <cc:RCONA345 contextRef="CI_1842065_2019-03-31" unitRef="PURE" decimals="INF"></cc:RCONA345>
</xbrl>"#;

    #[test]
    fn test_extracts_facts_in_document_order() {
        let facts = extract_facts(INSTANCE, "1842065").unwrap();

        assert_eq!(
            facts,
            vec![
                RawFact::new("1842065", "RCON2170", "2150000", "0"),
                RawFact::new("1842065", "RIAD4340", "31000", "0"),
                RawFact::new("1842065", "RCONA345", "", "INF"),
            ]
        );
    }

    #[test]
    fn test_elements_without_decimals_are_ignored() {
        let facts = extract_facts(INSTANCE, "1842065").unwrap();
        assert!(facts.iter().all(|f| f.id != "RCON9999"));
        assert!(facts.iter().all(|f| f.id != "identifier" && f.id != "instant"));
    }

    #[test]
    fn test_fact_id_strips_prefix() {
        assert_eq!(fact_id("us-gaap:Assets"), "Assets");
        assert_eq!(fact_id("Assets"), "Assets");
        assert_eq!(fact_id("cc:RCON2170"), "RCON2170");
    }

    #[test]
    fn test_missing_root() {
        let err = extract_facts("<report><a decimals=\"0\">1</a></report>", "1").unwrap_err();
        assert!(matches!(err, CallReportError::MissingRoot));
    }

    #[test]
    fn test_empty_root() {
        assert!(extract_facts("<xbrl/>", "1").unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let doc = r#"<xbrl>
            <cc:RCON2170 contextRef="a" decimals="0">1</cc:RCON2170>
            <cc:RCON2170 contextRef="b" decimals="-3">2</cc:RCON2170>
        </xbrl>"#;
        let facts = extract_facts(doc, "7").unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].value, "1");
        assert_eq!(facts[1].value, "2");
        assert_eq!(facts[1].decimals, "-3");
    }

    #[test]
    fn test_self_closing_fact_has_empty_value() {
        let facts = extract_facts(r#"<xbrl><cc:RCFD0010 decimals="0"/></xbrl>"#, "7").unwrap();
        assert_eq!(facts, vec![RawFact::new("7", "RCFD0010", "", "0")]);
    }

    #[test]
    fn test_double_escaped_document() {
        let doc = "&lt;xbrl&gt;&lt;cc:RCON2170 decimals=&quot;0&quot;&gt;42&lt;/cc:RCON2170&gt;&lt;/xbrl&gt;";
        let facts = extract_facts(doc, "7").unwrap();
        assert_eq!(facts, vec![RawFact::new("7", "RCON2170", "42", "0")]);
    }

    #[test]
    fn test_prefixed_root_and_wrapper() {
        let doc = r#"<envelope><xbrli:xbrl><cc:RCON2170 decimals="0">5</cc:RCON2170></xbrli:xbrl>
            <cc:RCON3210 decimals="0">9</cc:RCON3210></envelope>"#;
        let facts = extract_facts(doc, "7").unwrap();
        assert_eq!(facts, vec![RawFact::new("7", "RCON2170", "5", "0")]);
    }

    #[test]
    fn test_nested_text_is_concatenated() {
        let doc = r#"<xbrl><cc:TEXT1234 decimals="0"> a <b> b </b> c </cc:TEXT1234></xbrl>"#;
        let facts = extract_facts(doc, "7").unwrap();
        assert_eq!(facts[0].value, "abc");
    }
}
