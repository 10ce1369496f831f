//! Form-type auto-detection and parser routing.
//!
//! Detection order is significant because HTML containers can embed either
//! inline XBRL or a rendered Schedule 13: the XBRL probe runs first, then the
//! ownership/edgarSubmission XML probe, then the HTML fallback scan. The full
//! text normalizer runs only in front of the Schedule 13 parsers, because inline
//! XBRL character entities are semantically significant to XML decoding and
//! must reach the extractor untouched.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{EdgarError, Result};
use crate::parsing::financials::FinancialSnapshot;
use crate::parsing::form4;
use crate::parsing::form4_output::Form4Output;
use crate::parsing::ixbrl::{self, XbrlKind};
use crate::parsing::normalize;
use crate::parsing::schedule13::Schedule13Filing;
use crate::parsing::schedule13_html;
use crate::parsing::xbrl::attr_value;

/// Discriminant of a parsed filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormType {
    Form4,
    Schedule13D,
    Schedule13DAmendment,
    Schedule13G,
    Schedule13GAmendment,
    Xbrl,
}

impl FormType {
    /// The canonical SEC tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Form4 => "4",
            FormType::Schedule13D => "SC 13D",
            FormType::Schedule13DAmendment => "SC 13D/A",
            FormType::Schedule13G => "SC 13G",
            FormType::Schedule13GAmendment => "SC 13G/A",
            FormType::Xbrl => "XBRL",
        }
    }

    /// Normalizes a detected label (canonical or `SCHEDULE`-spelled) into a
    /// form tag; anything else is unsupported.
    pub fn from_detected(label: &str) -> Result<FormType> {
        match label {
            "4" => Ok(FormType::Form4),
            "SC 13D" | "SCHEDULE 13D" => Ok(FormType::Schedule13D),
            "SC 13D/A" | "SCHEDULE 13D/A" => Ok(FormType::Schedule13DAmendment),
            "SC 13G" | "SCHEDULE 13G" => Ok(FormType::Schedule13G),
            "SC 13G/A" | "SCHEDULE 13G/A" => Ok(FormType::Schedule13GAmendment),
            "XBRL" => Ok(FormType::Xbrl),
            other => Err(EdgarError::Unsupported(other.to_string())),
        }
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FormType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        FormType::from_detected(&label).map_err(serde::de::Error::custom)
    }
}

/// Where a filing came from, stamped by the batch layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilingSource {
    pub url: String,
    pub accession_number: String,
    pub filing_date: String,
    pub report_date: String,
}

/// A parsed filing: discriminated tag plus the typed payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFiling {
    pub form_type: FormType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<FilingSource>,
    pub data: FilingData,
}

/// The payload variants, one per form family.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FilingData {
    Form4(Form4Output),
    Schedule13(Schedule13Filing),
    Xbrl(FinancialSnapshot),
}

/// Auto-detects the form type of arbitrary filing bytes and parses.
///
/// XBRL (10-K/10-Q) is probed before anything else and before any
/// normalization. Schedule 13 bytes are run through the full normalizer
/// (entities, nbsp, zero-width chars) because landmark headings in rendered
/// filings carry `&nbsp;` noise.
pub fn parse_any(data: &[u8]) -> Result<ParsedFiling> {
    match ixbrl::detect_xbrl_type(data) {
        XbrlKind::Inline | XbrlKind::Standalone => {
            let xbrl = ixbrl::parse_xbrl_auto(data)?;
            let snapshot = xbrl.snapshot();
            return Ok(ParsedFiling {
                form_type: FormType::Xbrl,
                source: None,
                data: FilingData::Xbrl(snapshot),
            });
        }
        XbrlKind::Unknown => {}
    }

    let label = detect_form_type(data)?;
    let form_type = FormType::from_detected(&label)?;

    match form_type {
        FormType::Form4 => {
            let form = form4::parse(data)?;
            Ok(ParsedFiling {
                form_type,
                source: None,
                data: FilingData::Form4(form.to_output()),
            })
        }
        FormType::Schedule13D
        | FormType::Schedule13DAmendment
        | FormType::Schedule13G
        | FormType::Schedule13GAmendment => {
            let normalized = normalize::normalize_text(data);
            let mut filing = schedule13_html::parse_schedule13_auto(&normalized)?;
            filing.form_type = form_type.as_str().to_string();
            Ok(ParsedFiling {
                form_type,
                source: None,
                data: FilingData::Schedule13(filing),
            })
        }
        FormType::Xbrl => {
            let xbrl = ixbrl::parse_xbrl_auto(data)?;
            Ok(ParsedFiling {
                form_type,
                source: None,
                data: FilingData::Xbrl(xbrl.snapshot()),
            })
        }
    }
}

#[derive(Default)]
struct XmlProbe {
    root: String,
    xmlns: String,
    document_type: String,
    submission_type: String,
}

/// Examines the bytes to determine the form family label.
fn detect_form_type(data: &[u8]) -> Result<String> {
    let text = String::from_utf8_lossy(data);
    let trimmed = text.trim_start();

    if trimmed.starts_with("<!DOCTYPE html") || trimmed.starts_with("<html") {
        return html_schedule13_label(&text);
    }

    let probe = match xml_probe(&text) {
        Ok(p) => p,
        Err(_) => {
            // Not well-formed XML; a rendered Schedule 13 is still salvageable
            let upper = text.to_uppercase();
            if upper.contains("SCHEDULE 13") || upper.contains("SCHEDULE13") {
                if upper.contains("13D") {
                    return Ok("SC 13D".to_string());
                }
                return Ok("SC 13G".to_string());
            }
            return Err(EdgarError::InvalidFormat(
                "unrecognized document content".to_string(),
            ));
        }
    };

    match probe.root.as_str() {
        // Forms 3, 4, 5 all use ownershipDocument; documentType disambiguates
        "ownershipDocument" => {
            if probe.document_type.is_empty() {
                Ok("4".to_string())
            } else {
                Ok(probe.document_type)
            }
        }
        "informationTable" => Ok("13F".to_string()),
        "edgarSubmission" => {
            if probe.xmlns.contains("schedule13D") {
                if probe.submission_type.is_empty() {
                    Ok("SCHEDULE 13D".to_string())
                } else {
                    Ok(probe.submission_type)
                }
            } else if probe.xmlns.contains("schedule13g") {
                if probe.submission_type.is_empty() {
                    Ok("SCHEDULE 13G".to_string())
                } else {
                    Ok(probe.submission_type)
                }
            } else {
                Err(EdgarError::Unsupported(format!(
                    "edgarSubmission with namespace '{}'",
                    probe.xmlns
                )))
            }
        }
        "html" => html_schedule13_label(&text),
        other => Err(EdgarError::Unsupported(format!(
            "unknown root element: {}",
            other
        ))),
    }
}

/// Streaming probe for the root element, its default namespace, and the
/// `documentType` / `submissionType` child values.
fn xml_probe(text: &str) -> Result<XmlProbe> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.trim_text(true);

    let mut buf = Vec::new();
    let mut probe = XmlProbe::default();
    let mut current: Vec<u8> = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if probe.root.is_empty() {
                    probe.root = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    probe.xmlns = attr_value(e, b"xmlns");
                }
                current = e.local_name().as_ref().to_vec();
            }
            Ok(Event::Text(ref t)) => {
                let value = t.unescape().map(|c| c.trim().to_string()).unwrap_or_default();
                if !value.is_empty() {
                    match current.as_slice() {
                        b"documentType" if probe.document_type.is_empty() => {
                            probe.document_type = value
                        }
                        b"submissionType" if probe.submission_type.is_empty() => {
                            probe.submission_type = value
                        }
                        _ => {}
                    }
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

        // Root plus the discriminating child is all the probe needs
        if !probe.root.is_empty()
            && (!probe.document_type.is_empty() || !probe.submission_type.is_empty())
        {
            break;
        }
    }

    if probe.root.is_empty() {
        return Err(EdgarError::InvalidFormat("no XML root element".to_string()));
    }

    Ok(probe)
}

/// Classifies rendered HTML content as one of the Schedule 13 tags.
fn html_schedule13_label(text: &str) -> Result<String> {
    let upper = text.to_uppercase();
    let amendment = upper.contains("AMENDMENT");

    if upper.contains("SCHEDULE 13D") || upper.contains("SCHEDULE13D") {
        return Ok(if amendment { "SC 13D/A" } else { "SC 13D" }.to_string());
    }
    if upper.contains("SCHEDULE 13G") || upper.contains("SCHEDULE13G") {
        return Ok(if amendment { "SC 13G/A" } else { "SC 13G" }.to_string());
    }

    Err(EdgarError::Unsupported(
        "HTML form type not recognized".to_string(),
    ))
}
