mod common;

use common::read_fixture;
use filingkit::{parse_any, FilingData, FormType};

#[test]
fn parse_joint_13g_xml_end_to_end() {
    let data = read_fixture("schedule13/joint_13g.xml");
    let parsed = parse_any(&data).unwrap();

    assert_eq!(parsed.form_type, FormType::Schedule13G);

    let filing = match &parsed.data {
        FilingData::Schedule13(f) => f,
        other => panic!("expected Schedule13 payload, got {:?}", other),
    };

    assert_eq!(filing.form_type, "SC 13G");
    assert!(!filing.is_amendment);
    assert!(filing.is_passive());
    assert_eq!(filing.issuer_name, "Target Pharma Inc");
    assert_eq!(filing.issuer_cusip, "171779309");
    assert_eq!(filing.event_date, "2025-06-30");
    assert_eq!(filing.rule_designations, vec!["Rule 13d-1(b)"]);

    assert_eq!(filing.reporting_persons.len(), 2);
    // 13G person records carry no CIK; the header filer CIK is the fallback
    assert_eq!(filing.reporting_persons[0].cik, "0001263508");
    assert_eq!(filing.reporting_persons[0].member_of_group, "a");
    assert_eq!(filing.reporting_persons[1].name, "Felix J. Baker");

    // Joint filers all report the same position: total is max, not sum
    assert_eq!(filing.total_shares(), 10_000_000);
    assert_eq!(filing.total_percent(), 5.1);

    let items = filing.items_13g.as_ref().unwrap();
    assert!(items.item3_not_applicable);
    assert!(items.item10_certification.contains("ordinary course"));
    assert!(filing.items_13d.is_none());
}

#[test]
fn parse_legacy_13d_html_end_to_end() {
    let data = read_fixture("schedule13/legacy_13d.html");
    let parsed = parse_any(&data).unwrap();

    assert_eq!(parsed.form_type, FormType::Schedule13DAmendment);

    let filing = match &parsed.data {
        FilingData::Schedule13(f) => f,
        other => panic!("expected Schedule13 payload, got {:?}", other),
    };

    assert_eq!(filing.form_type, "SC 13D/A");
    assert!(filing.is_amendment);
    assert_eq!(filing.amendment_number, Some(3));
    assert!(filing.is_activist());

    // Cover-page extraction, including the nbsp-spelled title label and the
    // footnote-marked CUSIP
    assert_eq!(filing.issuer_name, "Acme Industries, Inc.");
    assert_eq!(filing.security_title, "Common Stock, $0.01 par value");
    assert_eq!(filing.issuer_cusip, "004321108");

    assert_eq!(filing.reporting_persons.len(), 1);
    let person = &filing.reporting_persons[0];
    assert_eq!(person.name, "Icahn Capital LP");
    assert_eq!(person.citizenship, "Delaware");
    assert_eq!(person.sole_voting_power, 1_500_000);
    assert_eq!(person.aggregate_amount_owned, 1_500_000);
    assert_eq!(person.percent_of_class, 6.3);
    assert_eq!(person.type_of_reporting_person, "PN");

    let items = filing.items_13d.as_ref().unwrap();
    assert!(items.item4_purpose_of_transaction.len() > 100);
    assert!(items
        .item4_purpose_of_transaction
        .contains("may seek board representation"));
}
