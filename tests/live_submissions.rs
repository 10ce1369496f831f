//! Live tests against the real SEC endpoints. Ignored by default; run with
//! `cargo test --test live_submissions -- --ignored` and a real contact email
//! in `SEC_EMAIL`.

use filingkit::{BatchOperations, BatchOptions, Edgar, SubmissionOperations};

fn live_edgar() -> Option<Edgar> {
    let email = std::env::var("SEC_EMAIL").ok()?;
    Edgar::new(&email).ok()
}

#[tokio::test]
#[ignore]
async fn live_submissions_index() {
    let edgar = match live_edgar() {
        Some(e) => e,
        None => return,
    };

    let subs = edgar.submissions("320193").await.unwrap();
    assert_eq!(subs.name, "Apple Inc.");
    assert!(!subs.recent_filings().is_empty());
}

#[tokio::test]
#[ignore]
async fn live_list_only_batch() {
    let edgar = match live_edgar() {
        Some(e) => e,
        None => return,
    };

    let opts = BatchOptions::new("320193", "4").list_only();
    let result = edgar.fetch_and_parse_batch(opts).await.unwrap();

    assert_eq!(result.fetched, 0);
    assert_eq!(result.filing_list.len(), result.total_found);
    assert!(result.filing_list.iter().all(|f| f.form == "4"));
}
