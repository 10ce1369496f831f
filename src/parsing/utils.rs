//! Numeric coercion helpers for messy filing strings.
//!
//! Schedule 13 share counts and percentages arrive with commas, row numbers,
//! footnote markers and the occasional `-0-` sentinel. Coercion is late and
//! tokenizing: extract the first digit run, strip separators, parse.

use once_cell::sync::Lazy;
use regex::Regex;

static INT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9,]+").unwrap());
static FLOAT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9,]+\.?[0-9]*").unwrap());

/// Parses an integer share count from a messy string.
///
/// Ignores leading/trailing non-digits, treats the literal `-0-` as zero,
/// extracts the first `[0-9,]+` run, strips commas and parses as `i64`
/// (falling through to float-then-truncate). Unparseable input yields 0.
///
/// Handles inputs like `"1,874,978 6"` (trailing row number) or
/// `"text 123,456 more text"`.
pub fn parse_int64(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    if s.contains("-0-") {
        return 0;
    }

    let run = match INT_RUN_RE.find(s) {
        Some(m) => m.as_str().replace(',', ""),
        None => return 0,
    };

    if let Ok(val) = run.parse::<i64>() {
        return val;
    }

    if let Ok(f) = run.parse::<f64>() {
        return f as i64;
    }

    0
}

/// Parses a percentage or decimal value from a messy string.
///
/// Same tokenizing approach as [`parse_int64`] but the extracted run may carry
/// a decimal point, e.g. `"5.1% (1)"` or `"text 12.34 more text"`.
pub fn parse_float64(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    if s.contains("-0-") {
        return 0.0;
    }

    let run = match FLOAT_RUN_RE.find(s) {
        Some(m) => m.as_str().replace(',', ""),
        None => return 0.0,
    };

    run.parse::<f64>().unwrap_or(0.0)
}
