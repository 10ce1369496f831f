//! Batch acquisition: drive the submissions index, filters, and the form
//! dispatcher over one CIK.
//!
//! The batch layer is single-threaded-cooperative: one outstanding fetch at a
//! time, paced by a 100 ms cadence ticker on top of the client's own rate
//! gate. Per-filing failures are captured with their accession number and the
//! run continues; cardinal failures (bad options, unreachable index) abort.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::core::Edgar;
use crate::dispatch::{parse_any, FilingData, FilingSource};
use crate::error::{EdgarError, Result};
use crate::options::BatchOptions;
use crate::submissions::{filter_by_date_range, filter_by_form, Filing};
use crate::traits::{BatchOperations, SubmissionOperations};
use crate::ParsedFiling;

const DEFAULT_DATE_FROM: &str = "1900-01-01";
const DEFAULT_DATE_TO: &str = "2099-12-31";

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Successfully fetched and parsed filings, in index order
    pub filings: Vec<ParsedFiling>,
    /// The filtered index rows (the full payload of a list-only run)
    pub filing_list: Vec<Filing>,
    /// Filings matching the filters
    pub total_found: usize,
    /// Filings actually downloaded and parsed
    pub fetched: usize,
    /// Per-filing failures, in encounter order
    pub errors: Vec<BatchError>,
    /// True when the run was canceled before the list was exhausted; the
    /// filings collected so far are still present
    pub canceled: bool,
}

/// A captured per-filing failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    pub accession_number: String,
    pub message: String,
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.accession_number, self.message)
    }
}

/// Implementation of batch operations for the Edgar client.
///
/// # Examples
///
/// ```ignore
/// let edgar = Edgar::new("analyst@fund.com")?;
/// let opts = BatchOptions::new("1631574", "4")
///     .with_date_range("2025-01-01", "2025-06-30");
///
/// let result = edgar.fetch_and_parse_batch(opts).await?;
/// for err in &result.errors {
///     eprintln!("skipped {}", err);
/// }
/// ```
#[async_trait]
impl BatchOperations for Edgar {
    /// Fetches all filings for a CIK matching the criteria and parses them.
    ///
    /// # Flow
    ///
    /// 1. Validate options and fetch the submissions index.
    /// 2. Gather candidates (recent, or recent plus paginated history).
    /// 3. Apply the form filter, then the date filter when either bound is
    ///    set (unspecified bounds default to `1900-01-01` / `2099-12-31`).
    /// 4. In list-only mode, return the filtered index rows without fetching.
    /// 5. Otherwise fetch and dispatch each filing sequentially on a 100 ms
    ///    cadence, recording per-filing failures and stamping successes with
    ///    their index-row identity.
    ///
    /// # Returns
    ///
    /// * `Result<BatchResult>` - Successes, the filtered index, counts, and
    ///   captured per-filing errors. Output preserves the order of the
    ///   filtered index.
    ///
    /// # Errors
    ///
    /// Cardinal failures only: missing options (`Config`) or an unreachable
    /// submissions index. Per-filing fetch/parse failures are captured in
    /// [`BatchResult::errors`] and never abort the run.
    ///
    /// # Cancellation
    ///
    /// When a cancellation token was supplied, the pacing step is responsive
    /// to it: on cancellation the run stops, `canceled` is set, and the
    /// filings collected so far are returned.
    async fn fetch_and_parse_batch(&self, opts: BatchOptions) -> Result<BatchResult> {
        if opts.cik.is_empty() {
            return Err(EdgarError::Config("cik is required".to_string()));
        }
        if opts.form_type.is_empty() {
            return Err(EdgarError::Config("form type is required".to_string()));
        }

        let mut result = BatchResult::default();

        tracing::info!(cik = %opts.cik, "fetching submissions index");
        let subs = self.submissions(&opts.cik).await?;

        let candidates = if opts.include_paginated {
            tracing::info!("fetching paginated filing history (this may take a while)");
            self.all_filings(&subs).await?
        } else {
            subs.recent_filings()
        };

        let mut filings = filter_by_form(&candidates, &opts.form_type);
        tracing::info!(
            count = filings.len(),
            form = %opts.form_type,
            "matched filings by form type"
        );

        if opts.date_from.is_some() || opts.date_to.is_some() {
            let from = opts.date_from.as_deref().unwrap_or(DEFAULT_DATE_FROM);
            let to = opts.date_to.as_deref().unwrap_or(DEFAULT_DATE_TO);
            filings = filter_by_date_range(&filings, from, to);
            tracing::info!(
                count = filings.len(),
                from,
                to,
                "filtered filings by date range"
            );
        }

        result.total_found = filings.len();
        result.filing_list = filings.clone();

        if opts.list_only {
            return Ok(result);
        }

        let mut ticker = tokio::time::interval(Duration::from_millis(100));

        for (i, filing) in filings.iter().enumerate() {
            // Pacing step; responsive to cancellation
            if let Some(cancel) = &opts.cancel {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::warn!(
                            fetched = result.fetched,
                            remaining = filings.len() - i,
                            "batch canceled"
                        );
                        result.canceled = true;
                        break;
                    }
                    _ = ticker.tick() => {}
                }
            } else {
                ticker.tick().await;
            }

            if (i + 1) % 10 == 0 || i == 0 {
                tracing::debug!("progress: {}/{}", i + 1, filings.len());
            }

            let bytes = match self
                .get_bytes_with_timeout(&filing.url, opts.request_timeout)
                .await
            {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(accession = %filing.accession_number, error = %e, "fetch failed");
                    result.errors.push(BatchError {
                        accession_number: filing.accession_number.clone(),
                        message: format!("failed to fetch: {}", e),
                    });
                    continue;
                }
            };

            let mut parsed = match parse_any(&bytes) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(accession = %filing.accession_number, error = %e, "parse failed");
                    result.errors.push(BatchError {
                        accession_number: filing.accession_number.clone(),
                        message: format!("failed to parse: {}", e),
                    });
                    continue;
                }
            };

            stamp_source(&mut parsed, filing);
            result.filings.push(parsed);
            result.fetched += 1;
        }

        tracing::info!(
            fetched = result.fetched,
            total = result.total_found,
            errors = result.errors.len(),
            "batch complete"
        );

        Ok(result)
    }
}

/// Stamps the index-row identity onto the envelope and, where the record
/// models them, onto the payload.
fn stamp_source(parsed: &mut ParsedFiling, filing: &Filing) {
    parsed.source = Some(FilingSource {
        url: filing.url.clone(),
        accession_number: filing.accession_number.clone(),
        filing_date: filing.filing_date.clone(),
        report_date: filing.report_date.clone(),
    });

    match &mut parsed.data {
        FilingData::Form4(form4) => {
            form4.set_source(&filing.url);
            form4.set_filing_metadata(
                &filing.accession_number,
                &filing.filing_date,
                &filing.report_date,
            );
        }
        FilingData::Schedule13(schedule13) => {
            schedule13.filing_date = filing.filing_date.clone();
        }
        FilingData::Xbrl(snapshot) => {
            snapshot.filing_date = filing.filing_date.clone();
        }
    }
}
