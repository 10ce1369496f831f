//! Text normalization for SEC filings.
//!
//! Rendered filings carry a mix of HTML entities, Unicode whitespace variants,
//! zero-width characters and Windows line endings that break landmark-substring
//! matching downstream. [`normalize_text`] flattens all of them before the
//! HTML-path Schedule 13 parser runs. [`normalize_xml_text`] is a conservative
//! variant for well-formed XML, where character entities are semantically
//! significant to the XML decoder and must be left alone.

use once_cell::sync::Lazy;
use regex::Regex;

/// Named HTML entities commonly found in SEC filings, in replacement order.
const ENTITY_REPLACEMENTS: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&ldquo;", "\u{201c}"),
    ("&rdquo;", "\u{201d}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&hellip;", "..."),
    ("&bull;", "\u{2022}"),
    ("&trade;", "\u{2122}"),
    ("&reg;", "\u{00ae}"),
    ("&copy;", "\u{00a9}"),
    ("&sect;", "\u{00a7}"),
    ("&para;", "\u{00b6}"),
    // Ampersand last so it cannot manufacture new entities out of the
    // replacements above.
    ("&amp;", "&"),
];

static NUMERIC_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(\d+);").unwrap());
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page \d+ of \d+").unwrap());

/// Normalizes Unicode and HTML-entity noise that appears in SEC filings.
///
/// Called early in the parsing pipeline (for HTML-path documents) so landmark
/// substrings match regardless of how the filing was rendered. Idempotent:
/// applying it twice yields the same bytes as applying it once.
///
/// Normalizations performed:
/// - Named and numeric HTML entities → their character equivalents
/// - Unicode whitespace variants (NBSP, en/em spaces, ideographic space) → ASCII space
/// - Zero-width and format-category characters → removed
/// - CRLF / CR line endings → LF
pub fn normalize_text(data: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(data);

    let text = normalize_html_entities(&text);
    let text = normalize_whitespace_chars(&text);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    text.into_bytes()
}

/// A lighter normalization for well-formed XML content.
///
/// Only the subset that cannot corrupt CDATA or XML character references:
/// `&nbsp;` expansion, NBSP conversion, zero-width/BOM removal and line-ending
/// normalization. Everything else is left to the XML decoder.
pub fn normalize_xml_text(data: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(data);

    let text = text
        .replace("&nbsp;", " ")
        .replace('\u{00A0}', " ")
        .replace('\u{200B}', "")
        .replace('\u{FEFF}', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    text.into_bytes()
}

/// Cleans text AFTER extraction from a parsed document.
///
/// More aggressive than input normalization: collapses whitespace runs to a
/// single space, strips `Page N of M` templates, trims.
pub fn clean_extracted_text(text: &str) -> String {
    let text = PAGE_MARKER_RE.replace_all(text, "");
    let text = WS_RUN_RE.replace_all(&text, " ");
    text.trim().to_string()
}

fn normalize_html_entities(text: &str) -> String {
    let mut text = text.to_string();
    for (entity, replacement) in ENTITY_REPLACEMENTS {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    // Numeric entities (&#NNN;). Quote-like codes collapse to ASCII.
    NUMERIC_ENTITY_RE
        .replace_all(&text, |caps: &regex::Captures| {
            let code: u32 = match caps[1].parse() {
                Ok(c) => c,
                Err(_) => return caps[0].to_string(),
            };
            match code {
                160 => " ".to_string(),
                8211 => "\u{2013}".to_string(),
                8212 => "\u{2014}".to_string(),
                8220 | 8221 => "\"".to_string(),
                8217 => "'".to_string(),
                _ => char::from_u32(code)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string()),
            }
        })
        .into_owned()
}

fn normalize_whitespace_chars(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            // Unicode whitespace variants → ASCII space
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                result.push(' ')
            }
            // Zero-width characters and BOM
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{180E}' => {}
            '\t' | '\n' | '\r' => result.push(c),
            c if is_format_char(c) => {}
            c => result.push(c),
        }
    }

    result
}

/// Unicode general-category Cf ranges seen in filings (soft hyphen,
/// directional marks, invisible operators, interlinear annotations).
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}
