//! Filing identity helpers and on-disk output: URL metadata extraction,
//! file naming, and JSON persistence.
//!
//! The CLI that drives these lives outside the crate; everything here is the
//! library side of saving parsed output: naming conventions, directory
//! creation, and pretty JSON formatting.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::ParsedFiling;
use crate::error::{EdgarError, Result};
use crate::submissions::Filing;

static URL_META_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/edgar/data/(\d+)/(\d+)/").unwrap());

/// Filing identity extracted from an SEC URL or from a parsed record.
#[derive(Debug, Clone, Default)]
pub struct FilingMetadata {
    pub cik: String,
    pub accession: String,
    pub form_type: String,
}

/// Parses an SEC archives URL for CIK and accession number.
///
/// Example: `https://www.sec.gov/Archives/edgar/data/1631574/000119312525314736/ownership.xml`
/// yields CIK `1631574` and accession `0001193125-25-314736` (dashes
/// re-inserted).
pub fn extract_metadata_from_url(url: &str) -> Result<FilingMetadata> {
    let caps = URL_META_RE.captures(url).ok_or_else(|| {
        EdgarError::InvalidFormat("could not extract CIK and accession from URL".to_string())
    })?;

    let mut accession = caps[2].to_string();
    if accession.len() == 18 {
        accession = format!(
            "{}-{}-{}",
            &accession[..10],
            &accession[10..12],
            &accession[12..]
        );
    }

    Ok(FilingMetadata {
        cik: caps[1].to_string(),
        accession,
        form_type: String::new(),
    })
}

/// Builds the single-filing output name: `{cik}-{accession}_{stem}.{ext}`,
/// degrading gracefully when identity is incomplete.
pub fn generate_filename(meta: &FilingMetadata, stem: &str, ext: &str) -> String {
    if !meta.cik.is_empty() && !meta.accession.is_empty() {
        return format!("{}-{}_{}.{}", meta.cik, meta.accession, stem, ext);
    }
    if !meta.cik.is_empty() {
        return format!("{}_{}.{}", meta.cik, stem, ext);
    }
    format!("{}.{}", stem, ext)
}

/// Builds the batch output name from the request parameters:
/// `{from}_{to}_form{form}_{cik}.json`, with `onwards`/`until` degradations
/// when only one bound was supplied and `form{form}_{cik}.json` when neither
/// was.
pub fn generate_batch_filename(
    date_from: Option<&str>,
    date_to: Option<&str>,
    form_type: &str,
    cik: &str,
) -> String {
    match (date_from, date_to) {
        (Some(from), Some(to)) => format!("{}_{}_form{}_{}.json", from, to, form_type, cik),
        (Some(from), None) => format!("{}_onwards_form{}_{}.json", from, form_type, cik),
        (None, Some(to)) => format!("until_{}_form{}_{}.json", to, form_type, cik),
        (None, None) => format!("form{}_{}.json", form_type, cik),
    }
}

/// How parsed filings should be persisted.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Also persist the raw fetched bytes alongside the JSON
    pub save_original: bool,
    /// Override for the raw-bytes path; smart naming when empty
    pub original_path: Option<PathBuf>,
    /// Override for the JSON path; smart naming when empty
    pub output_path: Option<PathBuf>,
    /// Output directory, created if missing
    pub output_dir: Option<PathBuf>,
}

/// Paths actually written by [`save_files`].
#[derive(Debug, Clone, Default)]
pub struct SaveResult {
    pub original_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

/// Persists the raw document and/or the JSON projection per the options.
pub fn save_files(
    raw: &[u8],
    parsed: &ParsedFiling,
    meta: &FilingMetadata,
    opts: &SaveOptions,
) -> Result<SaveResult> {
    let mut result = SaveResult::default();

    if let Some(dir) = &opts.output_dir {
        fs::create_dir_all(dir)?;
    }

    if opts.save_original {
        let path = opts
            .original_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(generate_filename(meta, "filing", "xml")));
        let path = join_output_dir(opts.output_dir.as_deref(), path);

        fs::write(&path, raw)?;
        result.original_path = Some(path);
    }

    if let Some(output_path) = &opts.output_path {
        let path = join_output_dir(opts.output_dir.as_deref(), output_path.clone());

        let json = format_json(parsed)?;
        fs::write(&path, json)?;
        result.output_path = Some(path);
    }

    Ok(result)
}

fn join_output_dir(dir: Option<&Path>, path: PathBuf) -> PathBuf {
    match dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

/// Pretty-printed JSON (two-space indent) for a parsed filing.
pub fn format_json(parsed: &ParsedFiling) -> Result<String> {
    Ok(serde_json::to_string_pretty(parsed)?)
}

/// Pretty-printed JSON array of the payloads of a batch run.
pub fn format_json_batch(filings: &[ParsedFiling]) -> Result<String> {
    let data: Vec<&crate::dispatch::FilingData> = filings.iter().map(|f| &f.data).collect();
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Pretty-printed JSON for a list-only batch run (index metadata only).
pub fn format_filing_list_json(filings: &[Filing]) -> Result<String> {
    Ok(serde_json::to_string_pretty(filings)?)
}
