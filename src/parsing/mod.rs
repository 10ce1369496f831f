//! Format parsers for the three filing families: ownership forms (Form 4),
//! Schedule 13D/G beneficial-ownership reports, and XBRL financial reports.
//!
//! Everything here is pure in-memory computation over owned byte buffers:
//! parsers take bytes, return owned records, and hold no global state beyond
//! the immutable embedded concept mappings.

pub mod concepts;
pub mod financials;
pub mod form4;
pub mod form4_output;
pub mod ixbrl;
pub mod normalize;
pub mod schedule13;
pub mod schedule13_html;
pub mod tenb51;
pub mod utils;
pub mod xbrl;
