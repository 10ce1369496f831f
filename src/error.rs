//! Error types for the filingkit library.
//!
//! All fallible operations return `Result<T, EdgarError>` where `EdgarError` is an
//! enum covering the failure modes of the pipeline: configuration mistakes, remote
//! HTTP statuses, network/filesystem I/O, malformed documents, empty query results,
//! unsupported form families, and cooperative cancellation.
//!
//! Errors carry enough context to diagnose a failure without re-fetching the
//! document: remote errors carry the HTTP status, parse errors carry the byte
//! offset where the reader gave up (when the underlying parser reports one).

use std::string::FromUtf8Error;
use thiserror::Error;

/// Comprehensive error type for all filingkit operations.
///
/// Variants are categorized by their source: configuration, the remote SEC
/// endpoints, parsing, or the query layer. Per-filing failures inside a batch are
/// collected rather than propagated (see [`crate::BatchResult::errors`]); errors
/// returned from top-level entry points are cardinal failures.
///
/// # Examples
///
/// Handling specific error types:
/// ```ignore
/// match edgar.submissions("1631574").await {
///     Ok(subs) => println!("{} filings", subs.recent_filings().len()),
///     Err(EdgarError::Remote { status }) => println!("SEC returned {}", status),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SEC returned status {status}")]
    Remote { status: u16 },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML deserialization error: {0}")]
    XmlDe(#[from] quick_xml::DeError),

    #[error("Parse error at offset {offset}: {context}")]
    Parse { offset: u64, context: String },

    #[error("No matching facts or filings found")]
    NotFound,

    #[error("Unsupported form type: {0}")]
    Unsupported(String),

    #[error("Operation canceled")]
    Canceled,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, EdgarError>;
