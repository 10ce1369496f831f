//! Rule 10b5-1 trading plan detection.
//!
//! A Form 4 signals a 10b5-1 plan either through the XML-level `aff10b5One`
//! flag or through free text in footnotes and remarks. The classifier here
//! requires both a 10b5-1 mention and positive plan-usage language, so
//! cancellation or termination notices do not count as plan activity. The
//! adoption date is legally significant and is extracted when the text states
//! it near adoption language.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Synthetic map key used when the remarks field (rather than a footnote)
/// carries the 10b5-1 signal.
pub const REMARKS_KEY: &str = "__REMARKS__";

// Detects 10b5-1 plan references in their various spellings:
// 10b5-1, 10b5–1, 10b51, Rule 10b5-1, rule10b5-1.
static RE_10B51: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(rule\s*)?10b5[-–]?1\b").unwrap());

// Positive language indicating active plan usage (not cancellation/termination).
static RE_POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(pursuant\s+to|adopted|in\s+accordance\s+with|under|effected\s+pursuant\s+to)\b")
        .unwrap()
});

// Date extraction near adoption language. Captures dates like
// "on March 13, 2025" or "in September 2025".
static RE_ADOPTION_DATE: Lazy<Regex> = Lazy::new(|| {
    const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October\
|November|December|Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec";
    Regex::new(&format!(
        r"(?i)\b(adopted|established|entered\s+into).*?\b(on|in)\s+((?:{m})\s+\d{{1,2}},\s+\d{{4}}|(?:{m})\s+\d{{4}})",
        m = MONTHS
    ))
    .unwrap()
});

/// Result of analyzing a block of text for 10b5-1 plan information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenB51Result {
    pub is_10b51_plan: bool,
    /// ISO-8601 adoption date (`YYYY-MM-DD`); `None` when not stated.
    pub adoption_date: Option<String>,
}

/// Returns true if the text merely mentions Rule 10b5-1, without requiring
/// positive plan-usage language. Used for the document-level summary flag.
pub fn mentions_10b51(text: &str) -> bool {
    RE_10B51.is_match(text)
}

/// Analyzes text (typically a footnote) for 10b5-1 plan information.
///
/// Signal-positive only when the text both references 10b5-1 and carries
/// positive usage language; the adoption date is extracted opportunistically.
pub fn extract_10b51(text: &str) -> TenB51Result {
    let mut result = TenB51Result::default();

    if !RE_10B51.is_match(text) {
        return result;
    }

    // No positive language means a cancellation/termination notice; do not
    // treat as a plan transaction.
    if !RE_POSITIVE.is_match(text) {
        return result;
    }

    result.is_10b51_plan = true;

    if let Some(caps) = RE_ADOPTION_DATE.captures(text) {
        if let Some(m) = caps.get(3) {
            result.adoption_date = parse_date(m.as_str());
        }
    }

    result
}

/// Builds the footnote-ID → adoption-date map for a document.
///
/// Scans every footnote and the remarks field; only text indicating active
/// 10b5-1 plan usage is included. Map values are the ISO adoption date, or an
/// empty string when the plan is signaled without a date. When remarks carry
/// the signal the map includes the synthetic [`REMARKS_KEY`] entry, applied by
/// the projection layer only under the remarks-globalization gate.
pub fn scan_10b51_signals<'a, I>(footnotes: I, remarks: &str) -> HashMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut result = HashMap::new();

    for (id, text) in footnotes {
        let analysis = extract_10b51(text);
        if analysis.is_10b51_plan {
            result.insert(id.to_string(), analysis.adoption_date.unwrap_or_default());
        }
    }

    if !remarks.is_empty() {
        let analysis = extract_10b51(remarks);
        if analysis.is_10b51_plan {
            result.insert(
                REMARKS_KEY.to_string(),
                analysis.adoption_date.unwrap_or_default(),
            );
        }
    }

    result
}

/// Tries the date layouts seen in adoption language and returns ISO-8601.
///
/// Month-only dates take the first of the month.
fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    for fmt in ["%B %d, %Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }

    // Month-and-year only ("September 2025", "Jan, 2026")
    let padded = format!("1 {}", raw);
    for fmt in ["%d %B, %Y", "%d %b, %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_with_full_date() {
        let text =
            "This transaction was effected pursuant to a Rule 10b5-1 trading plan adopted by the \
             Reporting Person on March 13, 2025.";
        let result = extract_10b51(text);
        assert!(result.is_10b51_plan);
        assert_eq!(result.adoption_date.as_deref(), Some("2025-03-13"));
    }

    #[test]
    fn test_positive_month_only_date() {
        let text = "Shares sold pursuant to a 10b5-1 plan adopted in September 2025.";
        let result = extract_10b51(text);
        assert!(result.is_10b51_plan);
        assert_eq!(result.adoption_date.as_deref(), Some("2025-09-01"));
    }

    #[test]
    fn test_positive_abbreviated_month() {
        let text = "Sale made pursuant to a trading plan under Rule 10b5-1 entered into on Mar 3, 2025.";
        let result = extract_10b51(text);
        assert!(result.is_10b51_plan);
        assert_eq!(result.adoption_date.as_deref(), Some("2025-03-03"));
    }

    #[test]
    fn test_positive_without_date() {
        let text = "Transaction made pursuant to the issuer's Rule 10b5-1 trading plan.";
        let result = extract_10b51(text);
        assert!(result.is_10b51_plan);
        assert_eq!(result.adoption_date, None);
    }

    #[test]
    fn test_cancellation_not_positive() {
        let text = "Cancellation of the Reporting Person's 10b5-1 trading plan.";
        let result = extract_10b51(text);
        assert!(!result.is_10b51_plan);
    }

    #[test]
    fn test_no_mention() {
        let text = "Represents shares withheld to satisfy tax obligations.";
        let result = extract_10b51(text);
        assert!(!result.is_10b51_plan);
        assert!(!mentions_10b51(text));
    }

    #[test]
    fn test_mention_variants() {
        assert!(mentions_10b51("per Rule 10b5-1"));
        assert!(mentions_10b51("a 10b5\u{2013}1 plan"));
        assert!(mentions_10b51("a 10b51 arrangement"));
        assert!(!mentions_10b51("rule 10b-5 liability"));
    }

    #[test]
    fn test_scan_builds_map_with_remarks_key() {
        let footnotes = vec![
            ("F1", "Sold pursuant to a 10b5-1 plan adopted on March 13, 2025."),
            ("F2", "Includes shares held by a family trust."),
        ];
        let remarks = "All sales effected pursuant to a Rule 10b5-1 trading plan.";

        let map = scan_10b51_signals(footnotes, remarks);
        assert_eq!(map.get("F1").map(String::as_str), Some("2025-03-13"));
        assert!(!map.contains_key("F2"));
        assert_eq!(map.get(REMARKS_KEY).map(String::as_str), Some(""));
    }

    #[test]
    fn test_unparseable_month_spelling() {
        // "Sept" is matched by the regex but not by any date layout
        let text = "Sold pursuant to a 10b5-1 plan adopted on Sept 13, 2025.";
        let result = extract_10b51(text);
        assert!(result.is_10b51_plan);
        assert_eq!(result.adoption_date, None);
    }
}
