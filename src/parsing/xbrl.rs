//! XBRL instance document parser (standalone XML path) and the shared
//! fact/context/unit model.
//!
//! XBRL facts are dynamic elements (`us-gaap:Cash`, `dei:DocumentType`, ...)
//! so the extraction is streaming: one pass collects contexts and units, a
//! namespace-aware pass collects every element carrying a `contextRef`
//! attribute. Nothing else of the document is retained, which keeps memory
//! sub-linear in document size for multi-megabyte reports.

use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Reader};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EdgarError, Result};
use crate::parsing::concepts;

/// A parsed XBRL instance document (10-K, 10-Q, ...).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Xbrl {
    pub contexts: Vec<Context>,
    pub units: Vec<Unit>,
    pub facts: Vec<Fact>,
}

/// The dimensional envelope of a fact: entity and period.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Context {
    pub id: String,
    /// Entity identifier (typically the CIK)
    pub entity: String,
    pub period: Option<Period>,
}

/// A reporting period: a point in time (balance sheet) or a span (income and
/// cash-flow statements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Period {
    Instant {
        instant: String,
    },
    Duration {
        #[serde(rename = "startDate")]
        start_date: String,
        #[serde(rename = "endDate")]
        end_date: String,
    },
}

impl Period {
    /// The period's end: the instant itself, or the duration's end date.
    pub fn end_date_str(&self) -> &str {
        match self {
            Period::Instant { instant } => instant,
            Period::Duration { end_date, .. } => end_date,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Period::Instant { .. })
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Period::Duration { .. })
    }
}

/// A measurement unit: a simple measure (`iso4217:USD`, `shares`) or a ratio.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Unit {
    pub id: String,
    pub measure: Option<String>,
    pub divide: Option<Divide>,
}

/// A ratio unit such as USD / shares.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Divide {
    pub numerator: String,
    pub denominator: String,
}

/// A single XBRL fact.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    /// Fully-qualified concept name, e.g. `us-gaap:Cash`
    pub concept: String,
    /// Raw on-wire value
    pub value: String,
    pub context_ref: String,
    pub unit_ref: String,
    /// Reported precision; negative means the value is pre-scaled by a power
    /// of ten, `INF` is recorded as 0 (exact)
    pub decimals: i32,
    /// Standardized label from the concept mappings; empty when unmapped
    pub standard_label: String,
    /// Resolved from the context after extraction
    pub period: Option<Period>,
    /// Cached numeric value; `None` for non-numeric facts
    pub numeric_value: Option<f64>,
}

impl Fact {
    /// The cached numeric value, or an error for non-numeric facts.
    pub fn as_number(&self) -> Result<f64> {
        self.numeric_value.ok_or_else(|| {
            EdgarError::InvalidFormat(format!("fact {} has no numeric value", self.concept))
        })
    }

    pub fn is_instant(&self) -> bool {
        self.period.as_ref().map(Period::is_instant).unwrap_or(false)
    }

    pub fn is_duration(&self) -> bool {
        self.period.as_ref().map(Period::is_duration).unwrap_or(false)
    }

    /// The period end as a date, when the fact has one and it parses.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.period
            .as_ref()
            .and_then(|p| NaiveDate::parse_from_str(p.end_date_str(), "%Y-%m-%d").ok())
    }

    /// Human-readable period label.
    pub fn period_label(&self) -> String {
        match &self.period {
            Some(Period::Instant { instant }) => instant.clone(),
            Some(Period::Duration {
                start_date,
                end_date,
            }) => format!("{} to {}", start_date, end_date),
            None => "Unknown".to_string(),
        }
    }
}

/// Parses a standalone XBRL instance document.
pub fn parse_xbrl(data: &[u8]) -> Result<Xbrl> {
    let text = String::from_utf8_lossy(data);

    let (contexts, units) = extract_resources(&text, false)?;
    let facts = extract_standalone_facts(&text)?;

    let mut xbrl = Xbrl {
        contexts,
        units,
        facts,
    };
    resolve_facts(&mut xbrl);
    Ok(xbrl)
}

/// Extracts `context` and `unit` elements.
///
/// With `only_under_resources` set, elements are collected only inside a
/// `<resources>` ancestor, since inline XBRL localizes them to a hidden header
/// section. Element names are matched by local name so prefixed
/// (`xbrli:context`) and default-namespace spellings both work.
pub(crate) fn extract_resources(
    text: &str,
    only_under_resources: bool,
) -> Result<(Vec<Context>, Vec<Unit>)> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;

    let mut buf = Vec::new();
    let mut contexts = Vec::new();
    let mut units = Vec::new();
    let mut in_resources = !only_under_resources;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"resources" => {
                    if only_under_resources {
                        in_resources = true;
                    }
                }
                b"context" if in_resources => {
                    let id = attr_value(e, b"id");
                    contexts.push(read_context(&mut reader, id)?);
                }
                b"unit" if in_resources => {
                    let id = attr_value(e, b"id");
                    units.push(read_unit(&mut reader, id)?);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if only_under_resources && e.local_name().as_ref() == b"resources" {
                    in_resources = false;
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

    Ok((contexts, units))
}

/// Reads one `<context>` subtree, capturing the entity identifier and period.
fn read_context(reader: &mut Reader<&[u8]>, id: String) -> Result<Context> {
    let mut buf = Vec::new();
    let mut entity = String::new();
    let mut instant: Option<String> = None;
    let mut start_date: Option<String> = None;
    let mut end_date: Option<String> = None;
    let mut current: Vec<u8> = Vec::new();
    let mut depth = 1u32;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                current = e.local_name().as_ref().to_vec();
            }
            Ok(Event::Text(ref t)) => {
                let text = unescape_text(t.as_ref());
                let text = text.trim();
                if !text.is_empty() {
                    match current.as_slice() {
                        b"identifier" => entity = text.to_string(),
                        b"instant" => instant = Some(text.to_string()),
                        b"startDate" => start_date = Some(text.to_string()),
                        b"endDate" => end_date = Some(text.to_string()),
                        _ => {}
                    }
                }
            }
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

    let period = match (instant, start_date, end_date) {
        (Some(i), _, _) => Some(Period::Instant { instant: i }),
        (None, Some(s), Some(e)) => Some(Period::Duration {
            start_date: s,
            end_date: e,
        }),
        _ => None,
    };

    Ok(Context { id, entity, period })
}

/// Reads one `<unit>` subtree: a bare measure or a numerator/denominator pair.
fn read_unit(reader: &mut Reader<&[u8]>, id: String) -> Result<Unit> {
    let mut buf = Vec::new();
    let mut measure: Option<String> = None;
    let mut numerator = String::new();
    let mut denominator = String::new();
    let mut in_numerator = false;
    let mut in_denominator = false;
    let mut current: Vec<u8> = Vec::new();
    let mut depth = 1u32;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"unitNumerator" => in_numerator = true,
                    b"unitDenominator" => in_denominator = true,
                    _ => {}
                }
                current = local;
            }
            Ok(Event::Text(ref t)) => {
                let text = unescape_text(t.as_ref());
                let text = text.trim();
                if !text.is_empty() && current.as_slice() == b"measure" {
                    if in_numerator {
                        numerator = text.to_string();
                    } else if in_denominator {
                        denominator = text.to_string();
                    } else {
                        measure = Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                match e.local_name().as_ref() {
                    b"unitNumerator" => in_numerator = false,
                    b"unitDenominator" => in_denominator = false,
                    _ => {}
                }
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

    let divide = if !numerator.is_empty() || !denominator.is_empty() {
        Some(Divide {
            numerator,
            denominator,
        })
    } else {
        None
    };

    Ok(Unit {
        id,
        measure,
        divide,
    })
}

/// A fact is any element carrying a `contextRef` attribute. The concept is
/// `<prefix>:<local-name>` with the prefix derived from the namespace URI.
fn extract_standalone_facts(text: &str) -> Result<Vec<Fact>> {
    let mut reader = NsReader::from_reader(text.as_bytes());
    let mut buf = Vec::new();
    let mut facts = Vec::new();

    loop {
        buf.clear();
        // The resolved namespace borrows the reader, so the fact header is
        // captured as owned data before the value subtree is consumed.
        let header = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(ref e))) => {
                let context_ref = attr_value(e, b"contextRef");
                if context_ref.is_empty() {
                    None
                } else {
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let concept = match ns {
                        ResolveResult::Bound(Namespace(uri)) => {
                            let uri = String::from_utf8_lossy(uri);
                            format!("{}:{}", namespace_prefix(&uri), local)
                        }
                        _ => local,
                    };
                    let unit_ref = attr_value(e, b"unitRef");
                    let decimals = parse_decimals(&attr_value(e, b"decimals"));
                    Some((concept, context_ref, unit_ref, decimals))
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(e.into()),
            _ => None,
        };

        if let Some((concept, context_ref, unit_ref, decimals)) = header {
            let value = read_element_text_ns(&mut reader)?;
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

/// Concatenated text content of the current element, nested markup included.
fn read_element_text_ns(reader: &mut NsReader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut depth = 1u32;

    loop {
        buf.clear();
        match reader.read_resolved_event_into(&mut buf) {
            Ok((_, Event::Start(_))) => depth += 1,
            Ok((_, Event::Text(ref t))) => out.push_str(&unescape_text(t.as_ref())),
            Ok((_, Event::End(_))) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(out)
}

/// Enriches facts with their resolved context period, standardized label and
/// cached numeric value.
pub(crate) fn resolve_facts(xbrl: &mut Xbrl) {
    let context_map: HashMap<&str, &Context> = xbrl
        .contexts
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();

    let mut periods: Vec<Option<Period>> = Vec::with_capacity(xbrl.facts.len());
    for fact in &xbrl.facts {
        periods.push(
            context_map
                .get(fact.context_ref.as_str())
                .and_then(|c| c.period.clone()),
        );
    }

    let mut mapped = 0usize;
    for (fact, period) in xbrl.facts.iter_mut().zip(periods) {
        fact.period = period;
        fact.standard_label = concepts::standardized_label(&fact.concept)
            .unwrap_or_default()
            .to_string();
        if !fact.standard_label.is_empty() {
            mapped += 1;
        }
        fact.numeric_value = parse_numeric_value(&fact.value, fact.decimals);
    }

    tracing::debug!(
        mapped,
        total = xbrl.facts.len(),
        "resolved facts against concept mappings"
    );
}

/// Converts a raw fact value to a number, applying decimal scaling.
///
/// A negative `decimals` means the reported value is pre-scaled: `1234` with
/// decimals -6 represents 1,234,000,000. Commas and em-dashes are stripped;
/// empty and dash sentinels are non-numeric.
pub(crate) fn parse_numeric_value(value: &str, decimals: i32) -> Option<f64> {
    let cleaned = value.replace(',', "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "-" || cleaned == "\u{2014}" {
        return None;
    }

    let mut val: f64 = cleaned.parse().ok()?;

    if decimals < 0 {
        val *= 10f64.powi(-decimals);
    }

    Some(val)
}

/// Parses the `decimals` attribute; `INF` and absent both record as 0 (exact).
pub(crate) fn parse_decimals(s: &str) -> i32 {
    if s.is_empty() || s == "INF" {
        return 0;
    }
    s.parse().unwrap_or(0)
}

/// Derives a namespace prefix from a namespace URI.
///
/// `http://fasb.org/us-gaap/2023` → `us-gaap`; unknown URIs fall back to the
/// final path segment.
pub(crate) fn namespace_prefix(namespace: &str) -> String {
    if namespace.contains("us-gaap") {
        return "us-gaap".to_string();
    }
    if namespace.contains("/dei/") {
        return "dei".to_string();
    }
    if namespace.contains("xbrli") {
        return "xbrli".to_string();
    }

    namespace
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Attribute lookup by qualified name bytes; empty string when absent.
pub(crate) fn attr_value(e: &BytesStart, name: &[u8]) -> String {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
        .unwrap_or_default()
}

/// Text-node unescape tolerant of stray HTML entities.
pub(crate) fn unescape_text(raw: &[u8]) -> String {
    let raw_str = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&raw_str) {
        Ok(s) => s.into_owned(),
        Err(_) => raw_str.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDALONE_XBRL: &str = r#"<?xml version="1.0" encoding="ASCII"?>
<xbrl xmlns="http://www.xbrl.org/2003/instance"
      xmlns:us-gaap="http://fasb.org/us-gaap/2023"
      xmlns:dei="http://xbrl.sec.gov/dei/2023">
  <context id="AsOf2024">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0001682852</identifier>
    </entity>
    <period>
      <instant>2024-12-31</instant>
    </period>
  </context>
  <context id="FY2024">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0001682852</identifier>
    </entity>
    <period>
      <startDate>2024-01-01</startDate>
      <endDate>2024-12-31</endDate>
    </period>
  </context>
  <unit id="usd">
    <measure>iso4217:USD</measure>
  </unit>
  <unit id="usdPerShare">
    <divide>
      <unitNumerator><measure>iso4217:USD</measure></unitNumerator>
      <unitDenominator><measure>xbrli:shares</measure></unitDenominator>
    </divide>
  </unit>
  <us-gaap:CashAndCashEquivalentsAtCarryingValue contextRef="AsOf2024" unitRef="usd" decimals="-3">1,234</us-gaap:CashAndCashEquivalentsAtCarryingValue>
  <us-gaap:EarningsPerShareDiluted contextRef="FY2024" unitRef="usdPerShare" decimals="INF">0.42</us-gaap:EarningsPerShareDiluted>
  <dei:EntityRegistrantName contextRef="FY2024">Test Corp</dei:EntityRegistrantName>
</xbrl>"#;

    #[test]
    fn test_parse_standalone() {
        let xbrl = parse_xbrl(STANDALONE_XBRL.as_bytes()).unwrap();

        assert_eq!(xbrl.contexts.len(), 2);
        assert_eq!(xbrl.contexts[0].id, "AsOf2024");
        assert_eq!(xbrl.contexts[0].entity, "0001682852");
        assert_eq!(
            xbrl.contexts[0].period,
            Some(Period::Instant {
                instant: "2024-12-31".to_string()
            })
        );
        assert_eq!(
            xbrl.contexts[1].period,
            Some(Period::Duration {
                start_date: "2024-01-01".to_string(),
                end_date: "2024-12-31".to_string()
            })
        );

        assert_eq!(xbrl.units.len(), 2);
        assert_eq!(xbrl.units[0].measure.as_deref(), Some("iso4217:USD"));
        let divide = xbrl.units[1].divide.as_ref().unwrap();
        assert_eq!(divide.numerator, "iso4217:USD");
        assert_eq!(divide.denominator, "xbrli:shares");

        assert_eq!(xbrl.facts.len(), 3);

        let cash = &xbrl.facts[0];
        assert_eq!(cash.concept, "us-gaap:CashAndCashEquivalentsAtCarryingValue");
        assert_eq!(cash.value, "1,234");
        assert_eq!(cash.decimals, -3);
        // 1,234 with decimals -3 is 1,234,000
        assert_eq!(cash.numeric_value, Some(1_234_000.0));
        assert_eq!(cash.standard_label, "Cash and Cash Equivalents");
        assert!(cash.is_instant());

        let eps = &xbrl.facts[1];
        assert_eq!(eps.decimals, 0);
        assert_eq!(eps.numeric_value, Some(0.42));
        assert!(eps.is_duration());

        let name = &xbrl.facts[2];
        assert_eq!(name.concept, "dei:EntityRegistrantName");
        assert_eq!(name.value, "Test Corp");
        assert_eq!(name.numeric_value, None);
    }

    #[test]
    fn test_decimal_scaling() {
        assert_eq!(parse_numeric_value("1234", -6), Some(1_234_000_000.0));
        assert_eq!(parse_numeric_value("1234", -3), Some(1_234_000.0));
        assert_eq!(parse_numeric_value("1234", 0), Some(1234.0));
        assert_eq!(parse_numeric_value("12.5", 2), Some(12.5));
    }

    #[test]
    fn test_numeric_sentinels() {
        assert_eq!(parse_numeric_value("", 0), None);
        assert_eq!(parse_numeric_value("-", 0), None);
        assert_eq!(parse_numeric_value("\u{2014}", 0), None);
        assert_eq!(parse_numeric_value("not a number", 0), None);
        assert_eq!(parse_numeric_value("1,234,567", 0), Some(1_234_567.0));
    }

    #[test]
    fn test_parse_decimals() {
        assert_eq!(parse_decimals("INF"), 0);
        assert_eq!(parse_decimals(""), 0);
        assert_eq!(parse_decimals("-6"), -6);
        assert_eq!(parse_decimals("2"), 2);
        assert_eq!(parse_decimals("garbage"), 0);
    }

    #[test]
    fn test_namespace_prefix() {
        assert_eq!(namespace_prefix("http://fasb.org/us-gaap/2023"), "us-gaap");
        assert_eq!(namespace_prefix("http://xbrl.sec.gov/dei/2023"), "dei");
        assert_eq!(namespace_prefix("http://www.xbrl.org/2003/instance"), "instance");
        assert_eq!(namespace_prefix("http://example.org/custom/abc"), "abc");
    }

    #[test]
    fn test_fact_end_date() {
        let fact = Fact {
            period: Some(Period::Duration {
                start_date: "2024-01-01".to_string(),
                end_date: "2024-12-31".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            fact.end_date(),
            Some(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
        );
        assert_eq!(fact.period_label(), "2024-01-01 to 2024-12-31");
    }
}
