//! Schedule 13D / 13G beneficial-ownership parser (strict XML path).
//!
//! SC 13D is the activist report, SC 13G the passive one. The two XML schemas
//! are close cousins with subtly different element names (`percentOfClass` vs
//! `classPercent`, `memberOfGroup` vs `memberGroup`, voting powers nested in
//! 13G but flat in 13D); both shapes are encoded here explicitly rather than
//! papered over with a shared schema that matches neither.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parsing::utils::{parse_float64, parse_int64};

static AMENDMENT_NO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Amendment\s+No\.\s+(\d+)").unwrap());
static AMENDMENT_SLASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/A\s*#?(\d+)").unwrap());

/// A parsed SC 13D or SC 13G filing.
///
/// Exactly one of `items_13d` / `items_13g` is populated, per form family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule13Filing {
    /// "SC 13D", "SC 13D/A", "SC 13G", "SC 13G/A"
    pub form_type: String,
    pub is_amendment: bool,
    /// `None` for originals and unnumbered amendments
    pub amendment_number: Option<i32>,
    /// From the filing index, not the document body
    pub filing_date: String,

    pub issuer_cik: String,
    pub issuer_name: String,
    pub issuer_cusip: String,
    pub security_title: String,

    pub reporting_persons: Vec<ReportingPerson13>,

    /// Narrative items; polymorphic between the two form families
    pub items_13d: Option<Schedule13DItems>,
    pub items_13g: Option<Schedule13GItems>,

    /// Event triggering the filing (13D only)
    pub date_of_event: String,
    /// Indicates prior filing on this subject (13D only)
    pub previously_filed: bool,

    /// Event date requiring the filing (13G only)
    pub event_date: String,
    /// Rule 13d-1(b)/(c)/(d) designations (13G only)
    pub rule_designations: Vec<String>,

    /// Filer CIK from the header; fallback when a person carries no CIK
    pub filer_cik: String,
}

/// An individual or entity reporting beneficial ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportingPerson13 {
    /// May be empty for foreign entities or when only present in the header
    pub cik: String,
    pub name: String,
    /// True for foreign entities filing without a CIK
    pub no_cik: bool,

    pub aggregate_amount_owned: i64,
    pub percent_of_class: f64,

    pub sole_voting_power: i64,
    pub shared_voting_power: i64,
    pub sole_dispositive_power: i64,
    pub shared_dispositive_power: i64,

    /// "a" = joint filer group (positions are the same shares), "b" = separate
    pub member_of_group: String,
    pub is_aggregate_exclude: bool,

    /// "IN", "CO", "PN", "IA", "HC", "OO", ...
    pub type_of_reporting_person: String,
    pub fund_type: String,
    pub citizenship: String,
    pub comment: String,
}

/// Items 1-7 of Schedule 13D. Item 4 carries the activist intent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule13DItems {
    pub item1_security_title: String,
    pub item1_issuer_name: String,
    pub item1_issuer_address: String,

    pub item2_filing_persons: String,
    pub item2_business_address: String,
    pub item2_principal_occupation: String,
    pub item2_convictions: String,
    pub item2_citizenship: String,

    pub item3_source_of_funds: String,

    /// Purpose of Transaction: board letters, future plans, activist intent.
    /// Often very long free text.
    pub item4_purpose_of_transaction: String,

    pub item5_percentage_of_class: String,
    pub item5_number_of_shares: String,
    pub item5_transactions: String,
    pub item5_shareholders: String,
    pub item5_date_5pct_ownership: String,

    pub item6_contracts: String,
    pub item7_exhibits: String,
}

/// Items 1-10 of Schedule 13G. Item 10 certifies passive-investor status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule13GItems {
    pub item1_issuer_name: String,
    pub item1_issuer_address: String,

    pub item2_filer_names: String,
    pub item2_filer_addresses: String,
    pub item2_citizenship: String,

    pub item3_not_applicable: bool,

    pub item4_amount_beneficially_owned: String,
    pub item4_percent_of_class: String,
    pub item4_sole_voting: String,
    pub item4_shared_voting: String,
    pub item4_sole_dispositive: String,
    pub item4_shared_dispositive: String,

    pub item5_not_applicable: bool,
    pub item5_ownership_5pct_or_less: String,

    pub item6_not_applicable: bool,
    pub item7_not_applicable: bool,
    pub item8_not_applicable: bool,
    pub item9_not_applicable: bool,

    pub item10_certification: String,
}

impl ReportingPerson13 {
    /// Total voting power (sole + shared).
    pub fn total_voting_power(&self) -> i64 {
        self.sole_voting_power + self.shared_voting_power
    }

    /// Total dispositive power (sole + shared).
    pub fn total_dispositive_power(&self) -> i64 {
        self.sole_dispositive_power + self.shared_dispositive_power
    }
}

impl Schedule13Filing {
    /// Aggregates shares across reporting persons without double-counting
    /// joint filers.
    ///
    /// Persons flagged aggregate-exclude are skipped. When any included person
    /// reports `member_of_group = "a"`, all group members describe the same
    /// position and the total is the maximum across them; otherwise positions
    /// are independent and the total is the sum.
    pub fn total_shares(&self) -> i64 {
        let included: Vec<&ReportingPerson13> = self
            .reporting_persons
            .iter()
            .filter(|p| !p.is_aggregate_exclude)
            .collect();

        let group_members: Vec<&&ReportingPerson13> = included
            .iter()
            .filter(|p| p.member_of_group == "a")
            .collect();

        if !group_members.is_empty() {
            return group_members
                .iter()
                .map(|p| p.aggregate_amount_owned)
                .max()
                .unwrap_or(0);
        }

        included.iter().map(|p| p.aggregate_amount_owned).sum()
    }

    /// Maximum ownership percentage across reporting persons.
    pub fn total_percent(&self) -> f64 {
        self.reporting_persons
            .iter()
            .map(|p| p.percent_of_class)
            .fold(0.0, f64::max)
    }

    /// True for Schedule 13D (active/activist investor).
    pub fn is_activist(&self) -> bool {
        self.form_type.contains("13D")
    }

    /// True for Schedule 13G (passive investor).
    pub fn is_passive(&self) -> bool {
        self.form_type.contains("13G")
    }
}

/// Parses a form-type string for amendment status and number.
///
/// Recognizes `Amendment No. 9` and `/A 9` / `/A#9`; a bare `/A` yields the
/// amendment flag with no number.
pub fn extract_amendment_info(form_type: &str) -> (bool, Option<i32>) {
    if !form_type.contains("/A") {
        return (false, None);
    }

    if let Some(caps) = AMENDMENT_NO_RE.captures(form_type) {
        if let Ok(num) = caps[1].parse::<i32>() {
            return (true, Some(num));
        }
    }

    if let Some(caps) = AMENDMENT_SLASH_RE.captures(form_type) {
        if let Ok(num) = caps[1].parse::<i32>() {
            return (true, Some(num));
        }
    }

    (true, None)
}

/// Extracts `Amendment No. N` from free text (cover pages of rendered
/// filings state the number outside the form-type label).
pub fn amendment_number_from_text(text: &str) -> Option<i32> {
    AMENDMENT_NO_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<i32>().ok())
}

// ---------------------------------------------------------------------------
// Schedule 13D XML schema (xmlns http://www.sec.gov/edgar/schedule13D)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DXml {
    header_data: Schedule13Header,
    form_data: Schedule13DFormData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13Header {
    submission_type: String,
    filer_info: FilerInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilerInfo {
    filer: Filer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Filer {
    filer_credentials: FilerCredentials,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilerCredentials {
    cik: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DFormData {
    cover_page_header: Schedule13DCover,
    reporting_persons: Schedule13DReportingPersons,
    #[serde(rename = "items1To7")]
    items_1_to_7: Schedule13DItems1To7,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DCover {
    securities_class_title: String,
    date_of_event: String,
    previously_filed_flag: String,
    issuer_info: Schedule13DIssuerInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DIssuerInfo {
    #[serde(rename = "issuerCIK")]
    issuer_cik: String,
    #[serde(rename = "issuerCUSIP")]
    issuer_cusip: String,
    issuer_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DReportingPersons {
    reporting_person_info: Vec<Schedule13DReportingPerson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13DReportingPerson {
    #[serde(rename = "reportingPersonCIK")]
    reporting_person_cik: String,
    reporting_person_name: String,
    #[serde(rename = "reportingPersonNoCIK")]
    reporting_person_no_cik: String,
    fund_type: String,
    citizenship_or_organization: String,
    sole_voting_power: String,
    shared_voting_power: String,
    sole_dispositive_power: String,
    shared_dispositive_power: String,
    aggregate_amount_owned: String,
    is_aggregate_exclude_shares: String,
    percent_of_class: String,
    type_of_reporting_person: String,
    member_of_group: String,
    comment_content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Schedule13DItems1To7 {
    item1: D13Item1,
    item2: D13Item2,
    item3: D13Item3,
    item4: D13Item4,
    item5: D13Item5,
    item6: D13Item6,
    item7: D13Item7,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item1 {
    security_title: String,
    issuer_name: String,
    issuer_principal_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item2 {
    filing_person_name: String,
    principal_business_address: String,
    principal_job: String,
    has_been_convicted: String,
    citizenship: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item3 {
    funds_source: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item4 {
    transaction_purpose: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item5 {
    percentage_of_class_securities: String,
    number_of_shares: String,
    transaction_desc: String,
    list_of_shareholders: String,
    #[serde(rename = "date5PercentOwnership")]
    date_5_percent_ownership: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item6 {
    contract_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct D13Item7 {
    filed_exhibits: String,
}

/// Parses a Schedule 13D XML filing.
pub fn parse_schedule13d(data: &[u8]) -> Result<Schedule13Filing> {
    let text = String::from_utf8_lossy(data);
    let doc: Schedule13DXml = quick_xml::de::from_str(&text)?;

    let mut filing = Schedule13Filing {
        form_type: doc.header_data.submission_type.clone(),
        filer_cik: doc.header_data.filer_info.filer.filer_credentials.cik.clone(),
        issuer_cik: doc.form_data.cover_page_header.issuer_info.issuer_cik.clone(),
        issuer_name: doc.form_data.cover_page_header.issuer_info.issuer_name.clone(),
        issuer_cusip: doc.form_data.cover_page_header.issuer_info.issuer_cusip.clone(),
        security_title: doc.form_data.cover_page_header.securities_class_title.clone(),
        date_of_event: doc.form_data.cover_page_header.date_of_event.clone(),
        previously_filed: doc
            .form_data
            .cover_page_header
            .previously_filed_flag
            .eq_ignore_ascii_case("true"),
        ..Default::default()
    };

    let (is_amendment, amendment_number) = extract_amendment_info(&filing.form_type);
    filing.is_amendment = is_amendment;
    filing.amendment_number = amendment_number;

    for person_xml in &doc.form_data.reporting_persons.reporting_person_info {
        let no_cik = person_xml.reporting_person_no_cik.eq_ignore_ascii_case("y");
        let mut person = ReportingPerson13 {
            cik: person_xml.reporting_person_cik.clone(),
            name: person_xml.reporting_person_name.clone(),
            no_cik,
            fund_type: person_xml.fund_type.clone(),
            citizenship: person_xml.citizenship_or_organization.clone(),
            type_of_reporting_person: person_xml.type_of_reporting_person.clone(),
            member_of_group: person_xml.member_of_group.clone(),
            is_aggregate_exclude: person_xml
                .is_aggregate_exclude_shares
                .eq_ignore_ascii_case("y"),
            comment: person_xml.comment_content.clone(),
            sole_voting_power: parse_int64(&person_xml.sole_voting_power),
            shared_voting_power: parse_int64(&person_xml.shared_voting_power),
            sole_dispositive_power: parse_int64(&person_xml.sole_dispositive_power),
            shared_dispositive_power: parse_int64(&person_xml.shared_dispositive_power),
            aggregate_amount_owned: parse_int64(&person_xml.aggregate_amount_owned),
            percent_of_class: parse_float64(&person_xml.percent_of_class),
        };

        if person.cik.is_empty() && !person.no_cik {
            person.cik = filing.filer_cik.clone();
        }

        filing.reporting_persons.push(person);
    }

    let items = &doc.form_data.items_1_to_7;
    filing.items_13d = Some(Schedule13DItems {
        item1_security_title: items.item1.security_title.clone(),
        item1_issuer_name: items.item1.issuer_name.clone(),
        item1_issuer_address: items.item1.issuer_principal_address.clone(),
        item2_filing_persons: items.item2.filing_person_name.clone(),
        item2_business_address: items.item2.principal_business_address.clone(),
        item2_principal_occupation: items.item2.principal_job.clone(),
        item2_convictions: items.item2.has_been_convicted.clone(),
        item2_citizenship: items.item2.citizenship.clone(),
        item3_source_of_funds: items.item3.funds_source.clone(),
        item4_purpose_of_transaction: items.item4.transaction_purpose.clone(),
        item5_percentage_of_class: items.item5.percentage_of_class_securities.clone(),
        item5_number_of_shares: items.item5.number_of_shares.clone(),
        item5_transactions: items.item5.transaction_desc.clone(),
        item5_shareholders: items.item5.list_of_shareholders.clone(),
        item5_date_5pct_ownership: items.item5.date_5_percent_ownership.clone(),
        item6_contracts: items.item6.contract_description.clone(),
        item7_exhibits: items.item7.filed_exhibits.clone(),
    });

    Ok(filing)
}

// ---------------------------------------------------------------------------
// Schedule 13G XML schema (xmlns http://www.sec.gov/edgar/schedule13g)
// Element names differ from 13D: issuerCik/issuerCusip casing, classPercent,
// memberGroup, and voting powers nested under
// reportingPersonBeneficiallyOwnedNumberOfShares.
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13GXml {
    header_data: Schedule13Header,
    form_data: Schedule13GFormData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13GFormData {
    cover_page_header: Schedule13GCover,
    cover_page_header_reporting_person_details: Vec<Schedule13GReportingPerson>,
    items: Schedule13GItemsXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13GCover {
    securities_class_title: String,
    event_date_requires_filing_this_statement: String,
    issuer_info: Schedule13GIssuerInfo,
    designate_rules_pursuant_this_schedule_filed: RuleDesignations,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13GIssuerInfo {
    issuer_cik: String,
    issuer_name: String,
    issuer_cusip: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RuleDesignations {
    designate_rule_pursuant_this_schedule_filed: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Schedule13GReportingPerson {
    reporting_person_name: String,
    #[serde(rename = "reportingPersonNoCIK")]
    reporting_person_no_cik: String,
    citizenship_or_organization: String,
    reporting_person_beneficially_owned_number_of_shares: G13Powers,
    reporting_person_beneficially_owned_aggregate_number_of_shares: String,
    class_percent: String,
    member_group: String,
    type_of_reporting_person: String,
    is_aggregate_exclude_shares: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Powers {
    sole_voting_power: String,
    shared_voting_power: String,
    sole_dispositive_power: String,
    shared_dispositive_power: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Schedule13GItemsXml {
    item1: G13Item1,
    item2: G13Item2,
    item3: NotApplicableItem,
    item4: G13Item4,
    item5: G13Item5,
    item6: NotApplicableItem,
    item7: NotApplicableItem,
    item8: NotApplicableItem,
    item9: NotApplicableItem,
    item10: G13Item10,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Item1 {
    issuer_name: String,
    issuer_principal_executive_office_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Item2 {
    filing_person_name: String,
    principal_business_office_or_residence_address: String,
    citizenship: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NotApplicableItem {
    not_applicable_flag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Item4 {
    amount_beneficially_owned: String,
    class_percent: String,
    number_of_shares_person_has: G13Item4Powers,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Item4Powers {
    sole_power_or_direct_to_vote: String,
    shared_power_or_direct_to_vote: String,
    sole_power_or_direct_to_dispose: String,
    shared_power_or_direct_to_dispose: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct G13Item5 {
    not_applicable_flag: String,
    #[serde(rename = "ownership5PctOrLess")]
    ownership_5pct_or_less: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct G13Item10 {
    certifications: String,
}

/// Parses a Schedule 13G XML filing.
pub fn parse_schedule13g(data: &[u8]) -> Result<Schedule13Filing> {
    let text = String::from_utf8_lossy(data);
    let doc: Schedule13GXml = quick_xml::de::from_str(&text)?;

    let mut filing = Schedule13Filing {
        form_type: doc.header_data.submission_type.clone(),
        filer_cik: doc.header_data.filer_info.filer.filer_credentials.cik.clone(),
        issuer_cik: doc.form_data.cover_page_header.issuer_info.issuer_cik.clone(),
        issuer_name: doc.form_data.cover_page_header.issuer_info.issuer_name.clone(),
        issuer_cusip: doc.form_data.cover_page_header.issuer_info.issuer_cusip.clone(),
        security_title: doc.form_data.cover_page_header.securities_class_title.clone(),
        event_date: doc
            .form_data
            .cover_page_header
            .event_date_requires_filing_this_statement
            .clone(),
        rule_designations: doc
            .form_data
            .cover_page_header
            .designate_rules_pursuant_this_schedule_filed
            .designate_rule_pursuant_this_schedule_filed
            .clone(),
        ..Default::default()
    };

    let (is_amendment, amendment_number) = extract_amendment_info(&filing.form_type);
    filing.is_amendment = is_amendment;
    filing.amendment_number = amendment_number;

    for person_xml in &doc.form_data.cover_page_header_reporting_person_details {
        let no_cik = person_xml.reporting_person_no_cik.eq_ignore_ascii_case("y");
        let powers = &person_xml.reporting_person_beneficially_owned_number_of_shares;
        let mut person = ReportingPerson13 {
            name: person_xml.reporting_person_name.clone(),
            no_cik,
            citizenship: person_xml.citizenship_or_organization.clone(),
            type_of_reporting_person: person_xml.type_of_reporting_person.clone(),
            member_of_group: person_xml.member_group.clone(),
            is_aggregate_exclude: person_xml
                .is_aggregate_exclude_shares
                .eq_ignore_ascii_case("y"),
            sole_voting_power: parse_int64(&powers.sole_voting_power),
            shared_voting_power: parse_int64(&powers.shared_voting_power),
            sole_dispositive_power: parse_int64(&powers.sole_dispositive_power),
            shared_dispositive_power: parse_int64(&powers.shared_dispositive_power),
            aggregate_amount_owned: parse_int64(
                &person_xml.reporting_person_beneficially_owned_aggregate_number_of_shares,
            ),
            percent_of_class: parse_float64(&person_xml.class_percent),
            ..Default::default()
        };

        // 13G person details rarely carry a CIK; the header filer is the
        // reporting entity unless the person is flagged as having none.
        if person.cik.is_empty() && !person.no_cik {
            person.cik = filing.filer_cik.clone();
        }

        filing.reporting_persons.push(person);
    }

    let items = &doc.form_data.items;
    filing.items_13g = Some(Schedule13GItems {
        item1_issuer_name: items.item1.issuer_name.clone(),
        item1_issuer_address: items.item1.issuer_principal_executive_office_address.clone(),
        item2_filer_names: items.item2.filing_person_name.clone(),
        item2_filer_addresses: items
            .item2
            .principal_business_office_or_residence_address
            .clone(),
        item2_citizenship: items.item2.citizenship.clone(),
        item3_not_applicable: items.item3.not_applicable_flag.eq_ignore_ascii_case("y"),
        item4_amount_beneficially_owned: items.item4.amount_beneficially_owned.clone(),
        item4_percent_of_class: items.item4.class_percent.clone(),
        item4_sole_voting: items.item4.number_of_shares_person_has.sole_power_or_direct_to_vote.clone(),
        item4_shared_voting: items
            .item4
            .number_of_shares_person_has
            .shared_power_or_direct_to_vote
            .clone(),
        item4_sole_dispositive: items
            .item4
            .number_of_shares_person_has
            .sole_power_or_direct_to_dispose
            .clone(),
        item4_shared_dispositive: items
            .item4
            .number_of_shares_person_has
            .shared_power_or_direct_to_dispose
            .clone(),
        item5_not_applicable: items.item5.not_applicable_flag.eq_ignore_ascii_case("y"),
        item5_ownership_5pct_or_less: items.item5.ownership_5pct_or_less.clone(),
        item6_not_applicable: items.item6.not_applicable_flag.eq_ignore_ascii_case("y"),
        item7_not_applicable: items.item7.not_applicable_flag.eq_ignore_ascii_case("y"),
        item8_not_applicable: items.item8.not_applicable_flag.eq_ignore_ascii_case("y"),
        item9_not_applicable: items.item9.not_applicable_flag.eq_ignore_ascii_case("y"),
        item10_certification: items.item10.certifications.clone(),
    });

    Ok(filing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amendment_extraction() {
        assert_eq!(extract_amendment_info("SC 13D"), (false, None));
        assert_eq!(extract_amendment_info("SC 13D/A"), (true, None));
        assert_eq!(extract_amendment_info("SC 13D/A 3"), (true, Some(3)));
        assert_eq!(extract_amendment_info("SC 13G/A#2"), (true, Some(2)));
        assert_eq!(
            extract_amendment_info("SCHEDULE 13D/A Amendment No. 9"),
            (true, Some(9))
        );
    }

    #[test]
    fn test_amendment_number_from_text() {
        assert_eq!(amendment_number_from_text("(Amendment No. 4)"), Some(4));
        assert_eq!(amendment_number_from_text("no amendment here"), None);
    }

    const SC13D_XML: &str = r#"<?xml version="1.0"?>
<edgarSubmission xmlns="http://www.sec.gov/edgar/schedule13D">
  <headerData>
    <submissionType>SCHEDULE 13D/A</submissionType>
    <filerInfo>
      <filer>
        <filerCredentials><cik>0001496099</cik></filerCredentials>
      </filer>
    </filerInfo>
  </headerData>
  <formData>
    <coverPageHeader>
      <securitiesClassTitle>Common Stock, par value $0.001</securitiesClassTitle>
      <dateOfEvent>2025-05-12</dateOfEvent>
      <previouslyFiledFlag>true</previouslyFiledFlag>
      <issuerInfo>
        <issuerCIK>0001000229</issuerCIK>
        <issuerCUSIP>171779309</issuerCUSIP>
        <issuerName>Target Pharma Inc</issuerName>
      </issuerInfo>
    </coverPageHeader>
    <reportingPersons>
      <reportingPersonInfo>
        <reportingPersonCIK>0001496099</reportingPersonCIK>
        <reportingPersonName>Starboard Value LP</reportingPersonName>
        <citizenshipOrOrganization>Delaware</citizenshipOrOrganization>
        <soleVotingPower>1,874,978</soleVotingPower>
        <sharedVotingPower>0</sharedVotingPower>
        <soleDispositivePower>1,874,978</soleDispositivePower>
        <sharedDispositivePower>0</sharedDispositivePower>
        <aggregateAmountOwned>1,874,978</aggregateAmountOwned>
        <isAggregateExcludeShares>N</isAggregateExcludeShares>
        <percentOfClass>8.2</percentOfClass>
        <typeOfReportingPerson>PN</typeOfReportingPerson>
        <memberOfGroup>b</memberOfGroup>
      </reportingPersonInfo>
    </reportingPersons>
    <items1To7>
      <item4>
        <transactionPurpose>The Reporting Persons acquired the Shares based on their belief that the Shares are undervalued and represent an attractive investment opportunity. The Reporting Persons intend to engage in discussions with the Issuer's management and Board of Directors regarding means of enhancing shareholder value, including, among other things, a review of strategic alternatives, changes to the Issuer's capitalization or dividend policy, the sale or transfer of a material amount of assets of the Issuer or any of its subsidiaries, and changes to the composition of the Board of Directors. The Reporting Persons have nominated, and intend to solicit proxies in support of, two director candidates for election at the Issuer's next annual meeting of stockholders. The Reporting Persons may also seek to engage with other stockholders, industry participants and financing sources regarding potential extraordinary corporate transactions, including a merger, reorganization or liquidation involving the Issuer. Depending upon overall market conditions, other investment opportunities available to the Reporting Persons, and the availability of Shares at prices that would make the purchase or sale of Shares desirable, the Reporting Persons may endeavor to increase or decrease their position in the Issuer through, among other things, the purchase or sale of Shares on the open market or in private transactions, on such terms and at such times as the Reporting Persons may deem advisable.</transactionPurpose>
      </item4>
    </items1To7>
  </formData>
</edgarSubmission>"#;

    #[test]
    fn test_parse_13d_amendment() {
        let filing = parse_schedule13d(SC13D_XML.as_bytes()).unwrap();

        assert_eq!(filing.form_type, "SCHEDULE 13D/A");
        assert!(filing.is_amendment);
        assert_eq!(filing.amendment_number, None);
        assert_eq!(filing.issuer_cik, "0001000229");
        assert_eq!(filing.issuer_cusip, "171779309");
        assert_eq!(filing.date_of_event, "2025-05-12");
        assert!(filing.previously_filed);
        assert!(filing.is_activist());

        assert_eq!(filing.reporting_persons.len(), 1);
        let person = &filing.reporting_persons[0];
        assert_eq!(person.name, "Starboard Value LP");
        assert_eq!(person.cik, "0001496099");
        assert_eq!(person.sole_voting_power, 1_874_978);
        assert_eq!(person.aggregate_amount_owned, 1_874_978);
        assert_eq!(person.percent_of_class, 8.2);
        assert_eq!(person.type_of_reporting_person, "PN");

        let items = filing.items_13d.as_ref().unwrap();
        assert!(items.item4_purpose_of_transaction.len() > 1_000);
        assert!(items
            .item4_purpose_of_transaction
            .contains("strategic alternatives"));
        assert!(filing.items_13g.is_none());
    }

    const SC13G_XML: &str = r#"<?xml version="1.0"?>
<edgarSubmission xmlns="http://www.sec.gov/edgar/schedule13g">
  <headerData>
    <submissionType>SCHEDULE 13G</submissionType>
    <filerInfo>
      <filer>
        <filerCredentials><cik>0001263508</cik></filerCredentials>
      </filer>
    </filerInfo>
  </headerData>
  <formData>
    <coverPageHeader>
      <securitiesClassTitle>Common Stock</securitiesClassTitle>
      <eventDateRequiresFilingThisStatement>2025-06-30</eventDateRequiresFilingThisStatement>
      <issuerInfo>
        <issuerCik>0001000229</issuerCik>
        <issuerName>Target Pharma Inc</issuerName>
        <issuerCusip>171779309</issuerCusip>
      </issuerInfo>
      <designateRulesPursuantThisScheduleFiled>
        <designateRulePursuantThisScheduleFiled>Rule 13d-1(b)</designateRulePursuantThisScheduleFiled>
      </designateRulesPursuantThisScheduleFiled>
    </coverPageHeader>
    <coverPageHeaderReportingPersonDetails>
      <reportingPersonName>Baker Bros. Advisors LP</reportingPersonName>
      <citizenshipOrOrganization>Delaware</citizenshipOrOrganization>
      <reportingPersonBeneficiallyOwnedNumberOfShares>
        <soleVotingPower>0</soleVotingPower>
        <sharedVotingPower>10,000,000</sharedVotingPower>
        <soleDispositivePower>0</soleDispositivePower>
        <sharedDispositivePower>10,000,000</sharedDispositivePower>
      </reportingPersonBeneficiallyOwnedNumberOfShares>
      <reportingPersonBeneficiallyOwnedAggregateNumberOfShares>10,000,000</reportingPersonBeneficiallyOwnedAggregateNumberOfShares>
      <classPercent>5.1</classPercent>
      <memberGroup>a</memberGroup>
      <typeOfReportingPerson>IA, PN</typeOfReportingPerson>
      <isAggregateExcludeShares>N</isAggregateExcludeShares>
    </coverPageHeaderReportingPersonDetails>
    <coverPageHeaderReportingPersonDetails>
      <reportingPersonName>Felix J. Baker</reportingPersonName>
      <citizenshipOrOrganization>United States</citizenshipOrOrganization>
      <reportingPersonBeneficiallyOwnedNumberOfShares>
        <soleVotingPower>0</soleVotingPower>
        <sharedVotingPower>10,000,000</sharedVotingPower>
        <soleDispositivePower>0</soleDispositivePower>
        <sharedDispositivePower>10,000,000</sharedDispositivePower>
      </reportingPersonBeneficiallyOwnedNumberOfShares>
      <reportingPersonBeneficiallyOwnedAggregateNumberOfShares>10,000,000</reportingPersonBeneficiallyOwnedAggregateNumberOfShares>
      <classPercent>5.1</classPercent>
      <memberGroup>a</memberGroup>
      <typeOfReportingPerson>IN</typeOfReportingPerson>
      <isAggregateExcludeShares>N</isAggregateExcludeShares>
    </coverPageHeaderReportingPersonDetails>
    <items>
      <item3><notApplicableFlag>Y</notApplicableFlag></item3>
      <item10>
        <certifications>By signing below I certify that the securities were acquired and are held in the ordinary course of business.</certifications>
      </item10>
    </items>
  </formData>
</edgarSubmission>"#;

    #[test]
    fn test_parse_13g_joint_filers() {
        let filing = parse_schedule13g(SC13G_XML.as_bytes()).unwrap();

        assert_eq!(filing.form_type, "SCHEDULE 13G");
        assert!(!filing.is_amendment);
        assert!(filing.is_passive());
        assert_eq!(filing.event_date, "2025-06-30");
        assert_eq!(filing.rule_designations, vec!["Rule 13d-1(b)"]);

        assert_eq!(filing.reporting_persons.len(), 2);
        // Per-person CIK falls back to the header filer CIK
        assert_eq!(filing.reporting_persons[0].cik, "0001263508");
        assert_eq!(filing.reporting_persons[0].shared_voting_power, 10_000_000);
        assert_eq!(filing.reporting_persons[0].member_of_group, "a");

        // Joint filers: total is max, not sum
        assert_eq!(filing.total_shares(), 10_000_000);
        assert_eq!(filing.total_percent(), 5.1);

        let items = filing.items_13g.as_ref().unwrap();
        assert!(items.item3_not_applicable);
        assert!(items.item10_certification.contains("ordinary course"));
        assert!(filing.items_13d.is_none());
    }

    #[test]
    fn test_aggregation_sum_for_separate_filers() {
        let filing = Schedule13Filing {
            reporting_persons: vec![
                ReportingPerson13 {
                    aggregate_amount_owned: 1_000,
                    member_of_group: "b".to_string(),
                    ..Default::default()
                },
                ReportingPerson13 {
                    aggregate_amount_owned: 2_000,
                    ..Default::default()
                },
                ReportingPerson13 {
                    aggregate_amount_owned: 5_000,
                    is_aggregate_exclude: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(filing.total_shares(), 3_000);
    }

    #[test]
    fn test_aggregation_max_for_group() {
        let filing = Schedule13Filing {
            reporting_persons: vec![
                ReportingPerson13 {
                    aggregate_amount_owned: 9_500,
                    member_of_group: "a".to_string(),
                    ..Default::default()
                },
                ReportingPerson13 {
                    aggregate_amount_owned: 10_000,
                    member_of_group: "a".to_string(),
                    ..Default::default()
                },
                ReportingPerson13 {
                    aggregate_amount_owned: 400,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        // Group members all report the same position; max wins over sum
        assert_eq!(filing.total_shares(), 10_000);
        let sum: i64 = filing
            .reporting_persons
            .iter()
            .map(|p| p.aggregate_amount_owned)
            .sum();
        assert!(filing.total_shares() <= sum);
    }

    #[test]
    fn test_power_totals() {
        let person = ReportingPerson13 {
            sole_voting_power: 100,
            shared_voting_power: 50,
            sole_dispositive_power: 100,
            shared_dispositive_power: 25,
            ..Default::default()
        };
        assert_eq!(person.total_voting_power(), 150);
        assert_eq!(person.total_dispositive_power(), 125);
    }
}
