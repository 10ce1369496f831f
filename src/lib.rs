//! # filingkit - SEC disclosure filings, parsed into typed records
//!
//! filingkit ingests SEC public disclosure filings and transforms them into
//! analysis-ready records. Three heterogeneous document families run through
//! one pipeline:
//!
//! - **Ownership forms (Form 4)** - insider-transaction XML, with derived
//!   Rule 10b5-1 plan detection and footnote cross-reference resolution
//! - **Schedule 13D / 13G** - beneficial-ownership reports, parsed from
//!   strict XML or reconstructed from rendered HTML via DOM heuristics
//! - **XBRL financial reports (10-K / 10-Q)** - inline or standalone XBRL,
//!   reduced to a fixed Financial Snapshot through an embedded concept
//!   taxonomy and a fluent fact-query engine
//!
//! ## Requirements
//!
//! The acquisition side is async-first and expects a [tokio](https://tokio.rs)
//! runtime. SEC fair-access rules require an identifying contact email; the
//! client validates it before any network call and paces requests to at most
//! one per 100 ms process-wide.
//!
//! ## Basic usage
//!
//! Parse a document you already have:
//!
//! ```ignore
//! let parsed = filingkit::parse_any(&bytes)?;
//! println!("{}", filingkit::metadata::format_json(&parsed)?);
//! ```
//!
//! Batch-fetch a CIK's Form 4 filings for a date range:
//!
//! ```ignore
//! use filingkit::{BatchOperations, BatchOptions, Edgar};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let edgar = Edgar::new("analyst@fund.com")?;
//!     let opts = BatchOptions::new("1631574", "4")
//!         .with_date_range("2025-01-01", "2025-06-30");
//!
//!     let result = edgar.fetch_and_parse_batch(opts).await?;
//!     println!("parsed {}/{} filings", result.fetched, result.total_found);
//!     Ok(())
//! }
//! ```

mod batch;
mod config;
mod core;
mod dispatch;
mod error;
pub mod metadata;
mod options;
pub mod parsing;
mod submissions;
mod traits;

pub use crate::batch::{BatchError, BatchResult};
pub use crate::config::{EdgarConfig, EdgarUrls};
pub use crate::core::{build_user_agent, validate_email, Edgar};
pub use crate::dispatch::{parse_any, FilingData, FilingSource, FormType, ParsedFiling};
pub use crate::error::{EdgarError, Result};
pub use crate::options::BatchOptions;
pub use crate::submissions::{
    filter_by_date_range, filter_by_form, Filing, FilingColumns, FilingFile, FilingsData,
    Submissions,
};
pub use crate::traits::{BatchOperations, SubmissionOperations};

// Re-export the record types callers match on
pub use parsing::financials::FinancialSnapshot;
pub use parsing::form4_output::Form4Output;
pub use parsing::schedule13::{ReportingPerson13, Schedule13Filing};
pub use parsing::xbrl::{Fact, Period, Xbrl};

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
