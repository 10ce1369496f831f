//! The per-CIK submissions index: model, filters, and URL construction.
//!
//! The SEC publishes each filer's catalog as JSON at
//! `https://data.sec.gov/submissions/CIK{10-digit}.json`, with the most recent
//! filings as parallel column arrays and the older history split into
//! paginated files. Rows are reassembled index-by-index, tolerating columns of
//! unequal length (shorter columns imply missing optional fields).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::core::Edgar;
use crate::error::Result;
use crate::traits::SubmissionOperations;

const ARCHIVES_BASE: &str = "https://www.sec.gov/Archives/edgar/data";

/// The complete submissions record for one CIK.
#[derive(Debug, Clone, Deserialize)]
pub struct Submissions {
    pub cik: String,
    #[serde(rename = "entityType", default)]
    pub entity_type: String,
    #[serde(default)]
    pub sic: String,
    #[serde(rename = "sicDescription", default)]
    pub sic_description: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub exchanges: Vec<String>,
    #[serde(rename = "fiscalYearEnd", default)]
    pub fiscal_year_end: Option<String>,
    pub filings: FilingsData,
}

/// Recent filings plus descriptors of the paginated history files.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingsData {
    pub recent: FilingColumns,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// Descriptor of one paginated batch of older filings.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingFile {
    pub name: String,
    #[serde(rename = "filingCount", default)]
    pub filing_count: u64,
    #[serde(rename = "filingFrom", default)]
    pub filing_from: String,
    #[serde(rename = "filingTo", default)]
    pub filing_to: String,
}

/// Parallel column arrays; each index is one filing. Optional columns may be
/// absent entirely or shorter than the accession-number column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilingColumns {
    #[serde(rename = "accessionNumber", default)]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate", default)]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate", default)]
    pub report_date: Option<Vec<String>>,
    #[serde(rename = "acceptanceDateTime", default)]
    pub acceptance_date_time: Option<Vec<String>>,
    #[serde(default)]
    pub act: Option<Vec<String>>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(rename = "fileNumber", default)]
    pub file_number: Option<Vec<String>>,
    #[serde(rename = "filmNumber", default)]
    pub film_number: Option<Vec<String>>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub size: Option<Vec<i64>>,
    #[serde(rename = "isXBRL", default)]
    pub is_xbrl: Option<Vec<i32>>,
    #[serde(rename = "isInlineXBRL", default)]
    pub is_inline_xbrl: Option<Vec<i32>>,
    #[serde(rename = "primaryDocument", default)]
    pub primary_document: Option<Vec<String>>,
    #[serde(rename = "primaryDocDescription", default)]
    pub primary_doc_description: Option<Vec<String>>,
}

/// One filing row reassembled from the column arrays, with its canonical
/// archives URL precomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filing {
    pub cik: String,
    pub accession_number: String,
    pub filing_date: String,
    pub report_date: String,
    pub acceptance_date_time: String,
    pub act: String,
    pub form: String,
    pub file_number: String,
    pub film_number: String,
    pub items: String,
    pub size: i64,
    pub is_xbrl: bool,
    pub is_inline_xbrl: bool,
    pub primary_document: String,
    pub primary_doc_description: String,
    pub url: String,
}

impl FilingColumns {
    fn get_str(&self, column: &Option<Vec<String>>, idx: usize) -> String {
        column
            .as_ref()
            .and_then(|v| v.get(idx).cloned())
            .unwrap_or_default()
    }

    fn get_bool(&self, column: &Option<Vec<i32>>, idx: usize) -> bool {
        column
            .as_ref()
            .and_then(|v| v.get(idx).copied())
            .map(|x| x != 0)
            .unwrap_or(false)
    }

    /// Reassembles the rows for a given CIK, zipping columns index-by-index.
    pub fn filings(&self, cik: &str) -> Vec<Filing> {
        let count = self.accession_number.len();
        let mut filings = Vec::with_capacity(count);

        for idx in 0..count {
            let mut filing = Filing {
                cik: cik.to_string(),
                accession_number: self.accession_number[idx].clone(),
                filing_date: self.filing_date.get(idx).cloned().unwrap_or_default(),
                form: self.form.get(idx).cloned().unwrap_or_default(),
                report_date: self.get_str(&self.report_date, idx),
                acceptance_date_time: self.get_str(&self.acceptance_date_time, idx),
                act: self.get_str(&self.act, idx),
                file_number: self.get_str(&self.file_number, idx),
                film_number: self.get_str(&self.film_number, idx),
                items: self.get_str(&self.items, idx),
                size: self
                    .size
                    .as_ref()
                    .and_then(|v| v.get(idx).copied())
                    .unwrap_or(0),
                is_xbrl: self.get_bool(&self.is_xbrl, idx),
                is_inline_xbrl: self.get_bool(&self.is_inline_xbrl, idx),
                primary_document: self.get_str(&self.primary_document, idx),
                primary_doc_description: self.get_str(&self.primary_doc_description, idx),
                url: String::new(),
            };

            filing.url = filing.build_url();
            filings.push(filing);
        }

        filings
    }
}

impl Filing {
    /// Canonical SEC archives URL for this filing:
    /// `{archives}/{cik-no-leading-zeros}/{accession-without-dashes}/{doc}`.
    ///
    /// The primary document sometimes points through an XSL rendering path
    /// (`xslF345X05/doc4.xml`); only the basename addresses the raw document.
    pub fn build_url(&self) -> String {
        let accession_path = self.accession_number.replace('-', "");

        let doc = self
            .primary_document
            .rsplit('/')
            .next()
            .unwrap_or(self.primary_document.as_str());

        format!(
            "{}/{}/{}/{}",
            ARCHIVES_BASE,
            self.cik.trim_start_matches('0'),
            accession_path,
            doc
        )
    }
}

impl Submissions {
    /// All recent filings as reassembled rows.
    pub fn recent_filings(&self) -> Vec<Filing> {
        self.filings.recent.filings(&self.cik)
    }
}

/// Filters filings by requested form type.
///
/// Matching rules, in order:
/// - `"13"` is a wildcard matching every Schedule 13 form and amendment
/// - a bare `13D`/`13G` (and `/A` variants) is normalized with the `SC ` prefix
/// - exact match always matches
/// - Schedule 13 requests additionally fold in amendments (`SC 13D` matches
///   `SC 13D/A`); Form 4/3/5 do NOT. Request `4/A` explicitly for amendments
pub fn filter_by_form(filings: &[Filing], form_type: &str) -> Vec<Filing> {
    filings
        .iter()
        .filter(|f| matches_form_type(&f.form, form_type))
        .cloned()
        .collect()
}

fn matches_form_type(filing_form: &str, requested_form: &str) -> bool {
    let normalized = normalize_form_type(requested_form);

    if requested_form == "13" {
        return filing_form.starts_with("SC 13D") || filing_form.starts_with("SC 13G");
    }

    if filing_form == normalized {
        return true;
    }

    // Amendment folding applies to Schedule 13 requests only
    if normalized.starts_with("SC 13") {
        let amended_prefix = format!("{}/", normalized);
        if filing_form.starts_with(&amended_prefix) {
            return true;
        }
    }

    false
}

/// Normalizes user-friendly form names to SEC form names: `13D` → `SC 13D`,
/// `13G/A` → `SC 13G/A`; everything else passes through unchanged.
fn normalize_form_type(form_type: &str) -> String {
    let form_type = form_type.trim();

    if form_type.starts_with("SC ") {
        return form_type.to_string();
    }

    if form_type == "13D"
        || form_type == "13G"
        || form_type.starts_with("13D/")
        || form_type.starts_with("13G/")
    {
        return format!("SC {}", form_type);
    }

    form_type.to_string()
}

/// Filters by filing date, inclusive on both endpoints (`YYYY-MM-DD` compares
/// lexicographically).
pub fn filter_by_date_range(filings: &[Filing], from: &str, to: &str) -> Vec<Filing> {
    filings
        .iter()
        .filter(|f| f.filing_date.as_str() >= from && f.filing_date.as_str() <= to)
        .cloned()
        .collect()
}

/// Implementation of submissions-index operations for the Edgar client.
///
/// # Examples
///
/// ```ignore
/// let edgar = Edgar::new("analyst@fund.com")?;
///
/// // Recent filings for a company
/// let filings = edgar.recent_filings("1631574").await?;
///
/// // Full history including paginated files
/// let subs = edgar.submissions("1631574").await?;
/// let all = edgar.all_filings(&subs).await?;
/// ```
#[async_trait]
impl SubmissionOperations for Edgar {
    /// Fetches and parses the submissions catalog for a CIK.
    ///
    /// The CIK is zero-padded to ten digits for the index URL
    /// (`{data}/submissions/CIK{10-digit-cik}.json`).
    ///
    /// # Parameters
    ///
    /// * `cik` - The Central Index Key of the filer, with or without leading
    ///   zeros.
    ///
    /// # Returns
    ///
    /// * `Result<Submissions>` - The parsed catalog including entity metadata,
    ///   the recent-filings column arrays and the paginated file descriptors.
    ///
    /// # Errors
    ///
    /// * `EdgarError::Remote` - Non-success HTTP status from the index
    ///   endpoint (an unknown CIK yields 404).
    /// * `EdgarError::Json` - Malformed index JSON.
    async fn submissions(&self, cik: &str) -> Result<Submissions> {
        let url = format!("{}/submissions/CIK{:0>10}.json", self.data_url(), cik);
        let response = self.get(&url).await?;
        Ok(serde_json::from_str::<Submissions>(&response)?)
    }

    /// Fetches the index and returns the recent filings as reassembled rows.
    ///
    /// # Parameters
    ///
    /// * `cik` - The Central Index Key of the filer.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<Filing>>` - Recent filings in index order, each with its
    ///   canonical archives URL precomputed.
    async fn recent_filings(&self, cik: &str) -> Result<Vec<Filing>> {
        let subs = self.submissions(cik).await?;
        Ok(subs.recent_filings())
    }

    /// Returns all filings including the paginated history.
    ///
    /// Each paginated file listed in the catalog is fetched through the
    /// rate-limited client with an additional 100 ms pause between file
    /// fetches; results are concatenated after the recent filings in index
    /// order.
    ///
    /// # Parameters
    ///
    /// * `subs` - A catalog previously fetched with
    ///   [`SubmissionOperations::submissions`].
    ///
    /// # Returns
    ///
    /// * `Result<Vec<Filing>>` - Recent filings followed by the paginated
    ///   history.
    ///
    /// # Errors
    ///
    /// A failed paginated fetch aborts the whole call; partial-failure
    /// accounting happens at the batch layer, not here.
    async fn all_filings(&self, subs: &Submissions) -> Result<Vec<Filing>> {
        let mut all = subs.recent_filings();

        for file_info in &subs.filings.files {
            let url = format!("{}/submissions/{}", self.data_url(), file_info.name);
            tracing::debug!("fetching paginated filings file {}", file_info.name);

            let response = self.get(&url).await?;
            let columns: FilingColumns = serde_json::from_str(&response)?;
            all.extend(columns.filings(&subs.cik));

            sleep(Duration::from_millis(100)).await;
        }

        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSIONS_JSON: &str = r#"{
        "cik": "1631574",
        "entityType": "operating",
        "sic": "2836",
        "sicDescription": "Biological Products",
        "name": "Example Therapeutics, Inc.",
        "tickers": ["EXTX"],
        "exchanges": ["Nasdaq"],
        "fiscalYearEnd": "1231",
        "filings": {
            "recent": {
                "accessionNumber": ["0001193125-25-314736", "0001193125-25-200001", "0001193125-24-100000"],
                "filingDate": ["2025-06-15", "2025-03-01", "2024-11-20"],
                "reportDate": ["2025-06-13", "2025-02-27"],
                "form": ["4", "SC 13D/A", "10-K"],
                "primaryDocument": ["xslF345X05/doc4.xml", "sched13da.htm", "form10k.htm"],
                "isXBRL": [0, 0, 1],
                "isInlineXBRL": [0, 0, 1],
                "size": [12345, 54321, 2600000]
            },
            "files": [
                {"name": "CIK0001631574-submissions-001.json", "filingCount": 500, "filingFrom": "2015-01-02", "filingTo": "2020-12-31"}
            ]
        }
    }"#;

    fn fixture() -> Submissions {
        serde_json::from_str(SUBMISSIONS_JSON).unwrap()
    }

    #[test]
    fn test_parse_submissions() {
        let subs = fixture();
        assert_eq!(subs.cik, "1631574");
        assert_eq!(subs.name, "Example Therapeutics, Inc.");
        assert_eq!(subs.tickers, vec!["EXTX"]);
        assert_eq!(subs.filings.files.len(), 1);
    }

    #[test]
    fn test_recent_filings_zip_tolerates_short_columns() {
        let filings = fixture().recent_filings();
        assert_eq!(filings.len(), 3);

        assert_eq!(filings[0].form, "4");
        assert_eq!(filings[0].report_date, "2025-06-13");
        // reportDate column is shorter than accessionNumber; the missing
        // entry reads as empty
        assert_eq!(filings[2].report_date, "");
        assert!(filings[2].is_xbrl);
        assert!(filings[2].is_inline_xbrl);
    }

    #[test]
    fn test_build_url_strips_xsl_path() {
        let filings = fixture().recent_filings();
        // Leading directory of the primary document is dropped, CIK loses
        // leading zeros, accession loses dashes
        assert_eq!(
            filings[0].url,
            "https://www.sec.gov/Archives/edgar/data/1631574/000119312525314736/doc4.xml"
        );
        assert_eq!(
            filings[1].url,
            "https://www.sec.gov/Archives/edgar/data/1631574/000119312525200001/sched13da.htm"
        );
    }

    #[test]
    fn test_url_last_segment_matches_stripped_doc() {
        for filing in fixture().recent_filings() {
            let expected = filing
                .primary_document
                .rsplit('/')
                .next()
                .unwrap()
                .to_string();
            assert!(filing.url.ends_with(&format!("/{}", expected)));
        }
    }

    fn filing_with_form(form: &str) -> Filing {
        Filing {
            form: form.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_form_filter_exact_match() {
        let filings = vec![
            filing_with_form("4"),
            filing_with_form("4/A"),
            filing_with_form("3"),
        ];

        // Form 4 amendments are NOT implicitly included
        let matched = filter_by_form(&filings, "4");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].form, "4");

        let matched = filter_by_form(&filings, "4/A");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].form, "4/A");
    }

    #[test]
    fn test_form_filter_schedule13_normalization() {
        let filings = vec![
            filing_with_form("SC 13D"),
            filing_with_form("SC 13D/A"),
            filing_with_form("SC 13G"),
            filing_with_form("SC 13G/A"),
            filing_with_form("4"),
        ];

        // Bare 13D normalizes and folds amendments in
        let matched = filter_by_form(&filings, "13D");
        assert_eq!(matched.len(), 2);

        let matched = filter_by_form(&filings, "SC 13G");
        assert_eq!(matched.len(), 2);

        // Explicit amendment request matches exactly
        let matched = filter_by_form(&filings, "13D/A");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].form, "SC 13D/A");
    }

    #[test]
    fn test_form_filter_13_wildcard() {
        let filings = vec![
            filing_with_form("SC 13D"),
            filing_with_form("SC 13D/A"),
            filing_with_form("SC 13G"),
            filing_with_form("SC 13G/A"),
            filing_with_form("13F-HR"),
            filing_with_form("4"),
        ];

        let matched = filter_by_form(&filings, "13");
        assert_eq!(matched.len(), 4);
        assert!(matched.iter().all(|f| f.form.starts_with("SC 13")));
    }

    #[test]
    fn test_form_filter_no_match_is_empty() {
        let filings = vec![filing_with_form("8-K")];
        assert!(filter_by_form(&filings, "13").is_empty());
    }

    fn filing_with_date(date: &str) -> Filing {
        Filing {
            form: "4".to_string(),
            filing_date: date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_filter_inclusive() {
        let filings = vec![
            filing_with_date("2025-01-01"),
            filing_with_date("2025-03-15"),
            filing_with_date("2025-06-30"),
            filing_with_date("2025-07-01"),
        ];

        let matched = filter_by_date_range(&filings, "2025-01-01", "2025-06-30");
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_filters_commute() {
        let filings = vec![
            filing_with_date("2025-01-05"),
            filing_with_date("2025-09-01"),
            Filing {
                form: "SC 13D".to_string(),
                filing_date: "2025-02-01".to_string(),
                ..Default::default()
            },
        ];

        let form_then_date = filter_by_date_range(
            &filter_by_form(&filings, "4"),
            "2025-01-01",
            "2025-06-30",
        );
        let date_then_form = filter_by_form(
            &filter_by_date_range(&filings, "2025-01-01", "2025-06-30"),
            "4",
        );

        assert_eq!(form_then_date.len(), date_then_form.len());
        assert_eq!(form_then_date[0].filing_date, date_then_form[0].filing_date);
    }
}
