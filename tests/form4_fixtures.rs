mod common;

use common::read_fixture;
use filingkit::{parse_any, FilingData, FormType};

#[test]
fn parse_plan_sale_end_to_end() {
    let data = read_fixture("form4/plan_sale.xml");
    let parsed = parse_any(&data).unwrap();

    assert_eq!(parsed.form_type, FormType::Form4);

    let form4 = match &parsed.data {
        FilingData::Form4(f) => f,
        other => panic!("expected Form4 payload, got {:?}", other),
    };

    assert_eq!(form4.form_type, "4");
    assert_eq!(form4.period_of_report, "2025-03-14");
    assert!(form4.has_10b51_plan);

    assert_eq!(form4.issuer.cik, "0000320193");
    assert_eq!(form4.issuer.ticker, "AAPL");

    assert_eq!(form4.reporting_owners.len(), 1);
    let owner = &form4.reporting_owners[0];
    assert_eq!(owner.name, "DOE JANE");
    assert!(owner.relationship.is_officer);
    assert_eq!(owner.relationship.officer_title, "Senior Vice President");

    assert_eq!(form4.transactions.len(), 1);
    let txn = &form4.transactions[0];
    assert_eq!(txn.transaction_code, "S");
    assert_eq!(txn.shares, Some(60_000.0));
    assert_eq!(txn.price_per_share, Some(13.20));
    assert_eq!(txn.acquired_disposed, "D");
    assert_eq!(txn.shares_owned_following, Some(140_000.0));
    assert_eq!(txn.direct_indirect, "D");
    assert!(txn.is_10b51_plan);
    assert_eq!(txn.plan_10b51_adoption_date.as_deref(), Some("2025-03-13"));
    assert_eq!(txn.footnotes, vec!["F1"]);

    assert_eq!(form4.footnotes.len(), 1);
    assert_eq!(form4.footnotes[0].id, "F1");

    assert_eq!(form4.signatures.len(), 1);
    assert_eq!(form4.signatures[0].date, "2025-03-17");
}

#[test]
fn json_output_is_stable_and_nullable() {
    let data = read_fixture("form4/plan_sale.xml");
    let parsed = parse_any(&data).unwrap();

    let json = filingkit::metadata::format_json(&parsed).unwrap();

    // Two-space pretty printing with explicit nulls for unparseable numbers
    assert!(json.contains("\"formType\": \"4\""));
    assert!(json.contains("\"shares\": 60000.0"));
    assert!(json.contains("\"is10b51Plan\": true"));

    // Round-trips structurally
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["formType"], "4");
    assert_eq!(value["data"]["transactions"][0]["footnotes"][0], "F1");
}
