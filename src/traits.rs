//! Trait definitions organizing the acquisition operations by area.
//!
//! The `Edgar` client implements each trait; the split keeps the submissions
//! index surface separate from the batch orchestration surface and gives
//! tests a seam for alternative implementations.

use async_trait::async_trait;

use crate::batch::BatchResult;
use crate::error::Result;
use crate::options::BatchOptions;
use crate::submissions::{Filing, Submissions};

/// Operations over the per-CIK submissions index.
#[async_trait]
pub trait SubmissionOperations {
    /// Fetches and parses the submissions catalog for a CIK.
    async fn submissions(&self, cik: &str) -> Result<Submissions>;
    /// Recent filings for a CIK (one index fetch).
    async fn recent_filings(&self, cik: &str) -> Result<Vec<Filing>>;
    /// Recent plus paginated history, pacing 100 ms between file fetches.
    async fn all_filings(&self, subs: &Submissions) -> Result<Vec<Filing>>;
}

/// Batch acquisition driving index fetch, filtering, and per-filing parse.
#[async_trait]
pub trait BatchOperations {
    /// Fetches all filings for a CIK matching the criteria and parses them,
    /// capturing per-filing failures instead of aborting.
    async fn fetch_and_parse_batch(&self, opts: BatchOptions) -> Result<BatchResult>;
}
