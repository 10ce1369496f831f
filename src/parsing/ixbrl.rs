//! Inline XBRL (iXBRL) extraction.
//!
//! Inline XBRL embeds facts in HTML through the `ix:` tagging namespace. Two
//! streaming passes recover the same shape as a standalone instance document:
//! pass one collects `context` and `unit` elements from the hidden
//! `<resources>` header section, pass two collects every `nonFraction` /
//! `nonNumeric` element, whose `name` attribute is the namespace-qualified
//! concept verbatim. The document is never materialized as a DOM.
//!
//! Charset declarations (`ASCII` and friends) are ignored; bytes are decoded
//! as UTF-8.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{EdgarError, Result};
use crate::parsing::xbrl::{
    attr_value, extract_resources, parse_decimals, resolve_facts, unescape_text, Fact, Xbrl,
};

/// The detected flavor of an XBRL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XbrlKind {
    Inline,
    Standalone,
    Unknown,
}

/// Byte-level probe for XBRL content.
///
/// Inline markers win over standalone markers because an inline document is
/// also well-formed XML.
pub fn detect_xbrl_type(data: &[u8]) -> XbrlKind {
    let content = String::from_utf8_lossy(data);

    if content.contains("xmlns:ix=") || content.contains("<ix:") || content.contains("inlineXBRL") {
        return XbrlKind::Inline;
    }

    if content.contains("<xbrl") || content.contains("xmlns:xbrli=") {
        return XbrlKind::Standalone;
    }

    XbrlKind::Unknown
}

/// Parses an inline XBRL document from HTML/XHTML bytes.
pub fn parse_inline_xbrl(data: &[u8]) -> Result<Xbrl> {
    let text = String::from_utf8_lossy(data);

    let (contexts, units) = extract_resources(&text, true)?;
    let facts = extract_inline_facts(&text)?;

    let mut xbrl = Xbrl {
        contexts,
        units,
        facts,
    };
    resolve_facts(&mut xbrl);
    Ok(xbrl)
}

/// Auto-detects inline vs standalone XBRL and parses accordingly.
pub fn parse_xbrl_auto(data: &[u8]) -> Result<Xbrl> {
    match detect_xbrl_type(data) {
        XbrlKind::Inline => parse_inline_xbrl(data),
        XbrlKind::Standalone => super::xbrl::parse_xbrl(data),
        XbrlKind::Unknown => Err(EdgarError::InvalidFormat(
            "unable to detect XBRL type".to_string(),
        )),
    }
}

/// Facts are elements with local name `nonFraction` or `nonNumeric`; the
/// concept comes verbatim from the `name` attribute.
fn extract_inline_facts(text: &str) -> Result<Vec<Fact>> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;

    let mut buf = Vec::new();
    let mut facts = Vec::new();

    loop {
        buf.clear();
        let pending = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => fact_header(e).map(|h| (h, true)),
            Ok(Event::Empty(ref e)) => fact_header(e).map(|h| (h, false)),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EdgarError::Parse {
                    offset: reader.buffer_position() as u64,
                    context: e.to_string(),
                })
            }
            _ => None,
        };

        if let Some(((concept, context_ref, unit_ref, decimals), has_body)) = pending {
            let value = if has_body {
                read_element_text(&mut reader)?
            } else {
                String::new()
            };

            facts.push(Fact {
                concept,
                value: value.trim().to_string(),
                context_ref,
                unit_ref,
                decimals,
                ..Default::default()
            });
        }
    }

    Ok(facts)
}

type FactHeader = (String, String, String, i32);

fn fact_header(e: &quick_xml::events::BytesStart) -> Option<FactHeader> {
    let local = e.local_name();
    if local.as_ref() != b"nonFraction" && local.as_ref() != b"nonNumeric" {
        return None;
    }

    let context_ref = attr_value(e, b"contextRef");
    if context_ref.is_empty() {
        return None;
    }

    let concept = attr_value(e, b"name");
    if concept.is_empty() {
        return None;
    }

    let unit_ref = attr_value(e, b"unitRef");
    let decimals = parse_decimals(&attr_value(e, b"decimals"));

    Some((concept, context_ref, unit_ref, decimals))
}

/// Concatenated text of the current element; inline facts may wrap their
/// value in nested presentation markup.
fn read_element_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut depth = 1u32;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::Text(ref t)) => out.push_str(&unescape_text(t.as_ref())),
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EdgarError::Parse {
                    offset: reader.buffer_position() as u64,
                    context: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::xbrl::Period;

    const INLINE_XBRL: &str = r#"<?xml version="1.0" encoding="ASCII"?>
<html xmlns="http://www.w3.org/1999/xhtml"
      xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:xbrli="http://www.xbrl.org/2003/instance"
      xmlns:us-gaap="http://fasb.org/us-gaap/2023"
      xmlns:dei="http://xbrl.sec.gov/dei/2023">
<head><title>10-K</title></head>
<body>
<div style="display:none">
  <ix:header>
    <ix:resources>
      <xbrli:context id="AsOf2024">
        <xbrli:entity>
          <xbrli:identifier scheme="http://www.sec.gov/CIK">0001682852</xbrli:identifier>
        </xbrli:entity>
        <xbrli:period><xbrli:instant>2024-12-31</xbrli:instant></xbrli:period>
      </xbrli:context>
      <xbrli:context id="FY2024">
        <xbrli:entity>
          <xbrli:identifier scheme="http://www.sec.gov/CIK">0001682852</xbrli:identifier>
        </xbrli:entity>
        <xbrli:period>
          <xbrli:startDate>2024-01-01</xbrli:startDate>
          <xbrli:endDate>2024-12-31</xbrli:endDate>
        </xbrli:period>
      </xbrli:context>
      <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
    </ix:resources>
  </ix:header>
</div>
<p>Cash and cash equivalents were
<ix:nonFraction name="us-gaap:CashAndCashEquivalentsAtCarryingValue" contextRef="AsOf2024" unitRef="usd" decimals="-6"><span>1,234</span></ix:nonFraction>
as of year end.</p>
<p>Registrant: <ix:nonNumeric name="dei:EntityRegistrantName" contextRef="FY2024">Test Corp</ix:nonNumeric></p>
</body>
</html>"#;

    #[test]
    fn test_detect_xbrl_type() {
        assert_eq!(detect_xbrl_type(INLINE_XBRL.as_bytes()), XbrlKind::Inline);
        assert_eq!(
            detect_xbrl_type(b"<xbrl xmlns=\"http://www.xbrl.org/2003/instance\"></xbrl>"),
            XbrlKind::Standalone
        );
        assert_eq!(
            detect_xbrl_type(b"<ownershipDocument></ownershipDocument>"),
            XbrlKind::Unknown
        );
    }

    #[test]
    fn test_parse_inline() {
        let xbrl = parse_inline_xbrl(INLINE_XBRL.as_bytes()).unwrap();

        // Resources are localized to the hidden header section
        assert_eq!(xbrl.contexts.len(), 2);
        assert_eq!(xbrl.contexts[0].entity, "0001682852");
        assert_eq!(xbrl.units.len(), 1);

        assert_eq!(xbrl.facts.len(), 2);

        let cash = &xbrl.facts[0];
        assert_eq!(cash.concept, "us-gaap:CashAndCashEquivalentsAtCarryingValue");
        assert_eq!(cash.value, "1,234");
        // 1,234 with decimals -6 scales to 1,234,000,000
        assert_eq!(cash.numeric_value, Some(1_234_000_000.0));
        assert_eq!(
            cash.period,
            Some(Period::Instant {
                instant: "2024-12-31".to_string()
            })
        );
        assert_eq!(cash.standard_label, "Cash and Cash Equivalents");

        let name = &xbrl.facts[1];
        assert_eq!(name.concept, "dei:EntityRegistrantName");
        assert_eq!(name.value, "Test Corp");
        assert!(name.is_duration());
        assert_eq!(name.numeric_value, None);
    }

    #[test]
    fn test_inline_inf_decimals() {
        let doc = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">
<body>
<ix:header><ix:resources>
<context id="c1"><entity><identifier>1</identifier></entity>
<period><instant>2024-12-31</instant></period></context>
</ix:resources></ix:header>
<ix:nonFraction name="us-gaap:EarningsPerShareDiluted" contextRef="c1" decimals="INF">0.42</ix:nonFraction>
</body></html>"#;

        let xbrl = parse_inline_xbrl(doc.as_bytes()).unwrap();
        assert_eq!(xbrl.facts.len(), 1);
        // INF decimals take the raw value exactly
        assert_eq!(xbrl.facts[0].numeric_value, Some(0.42));
    }

    #[test]
    fn test_auto_routes_both_kinds() {
        assert!(parse_xbrl_auto(INLINE_XBRL.as_bytes()).is_ok());
        assert!(matches!(
            parse_xbrl_auto(b"plain text"),
            Err(EdgarError::InvalidFormat(_))
        ));
    }
}
