//! Projection of the Form 4 structural tree into the published record.
//!
//! The output shape is table-like: one row per transaction or holding with
//! nullable numbers, the ordered deduplicated footnote IDs referenced by any
//! field of the row, and the derived per-row 10b5-1 status. Footnote evidence
//! always outranks the remarks signal: the remarks classification is applied
//! globally only when the XML flag asserts a plan, no footnote corroborates
//! it, and the remarks text classifies positively.

use serde::{Deserialize, Serialize};

use super::form4::{
    DerivativeHolding, DerivativeTransaction, Footnote, Form4, Issuer, NonDerivativeHolding,
    NonDerivativeTransaction, ReportingOwner, Signature,
};
use super::tenb51::{self, REMARKS_KEY};
use std::collections::HashMap;

/// ID of the synthetic footnote carrying the free-form remarks text.
pub const REMARKS_FOOTNOTE_ID: &str = "REMARKS";

/// The published Form 4 record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form4Output {
    pub metadata: Form4Metadata,
    pub form_type: String,
    pub schema_version: String,
    pub period_of_report: String,
    /// Document-level indicator
    pub has_10b51_plan: bool,
    pub issuer: IssuerOutput,
    pub reporting_owners: Vec<ReportingOwnerOutput>,
    pub transactions: Vec<NonDerivativeTransactionOutput>,
    pub derivatives: Vec<DerivativeTransactionOutput>,
    pub holdings: Vec<NonDerivativeHoldingOutput>,
    pub derivative_holdings: Vec<DerivativeHoldingOutput>,
    pub footnotes: Vec<FootnoteOutput>,
    pub signatures: Vec<SignatureOutput>,
}

/// Filing identity stamped by the caller (batch index row or single-source
/// invocation). Accession may be empty when the source is a local file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form4Metadata {
    pub cik: String,
    pub accession_number: String,
    pub form_type: String,
    pub period_of_report: String,
    pub filing_date: String,
    pub report_date: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerOutput {
    pub cik: String,
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingOwnerOutput {
    pub cik: String,
    pub name: String,
    pub address: AddressOutput,
    pub relationship: RelationshipOutput,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub street1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub street2: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipOutput {
    pub is_director: bool,
    pub is_officer: bool,
    pub is_ten_percent_owner: bool,
    pub is_other: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub officer_title: String,
}

/// A single non-derivative transaction row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonDerivativeTransactionOutput {
    pub security_title: String,
    pub transaction_date: String,
    pub transaction_code: String,
    /// Nullable: `None` when the field was empty or footnote-only
    pub shares: Option<f64>,
    pub price_per_share: Option<f64>,
    /// "A" or "D"
    pub acquired_disposed: String,
    pub shares_owned_following: Option<f64>,
    /// "D" or "I"
    pub direct_indirect: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nature_of_ownership: String,
    pub equity_swap_involved: bool,
    /// Per-transaction 10b5-1 indicator
    pub is_10b51_plan: bool,
    /// ISO-8601 adoption date; `None` when not 10b5-1 or the date is unknown
    pub plan_10b51_adoption_date: Option<String>,
    /// Footnote IDs referenced by any field of this row, first-occurrence order
    pub footnotes: Vec<String>,
}

/// A single derivative transaction row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativeTransactionOutput {
    pub security_title: String,
    pub transaction_date: String,
    pub transaction_code: String,
    pub shares: Option<f64>,
    pub price_per_share: Option<f64>,
    pub acquired_disposed: String,
    pub exercise_price: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exercise_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expiration_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub underlying_title: String,
    pub underlying_shares: Option<f64>,
    pub shares_owned_following: Option<f64>,
    pub direct_indirect: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nature_of_ownership: String,
    pub equity_swap_involved: bool,
    pub is_10b51_plan: bool,
    pub plan_10b51_adoption_date: Option<String>,
    pub footnotes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonDerivativeHoldingOutput {
    pub security_title: String,
    pub shares_owned_following: Option<f64>,
    pub direct_indirect: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nature_of_ownership: String,
    pub footnotes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativeHoldingOutput {
    pub security_title: String,
    pub exercise_price: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exercise_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expiration_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub underlying_title: String,
    pub underlying_shares: Option<f64>,
    pub shares_owned_following: Option<f64>,
    pub direct_indirect: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nature_of_ownership: String,
    pub footnotes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootnoteOutput {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureOutput {
    pub name: String,
    pub date: String,
}

impl Form4Output {
    /// Records the source URI (URL or local path) the filing was read from.
    pub fn set_source(&mut self, source: &str) {
        self.metadata.source = source.to_string();
    }

    /// Stamps index-row identity onto the record. Empty strings leave the
    /// existing value untouched.
    pub fn set_filing_metadata(&mut self, accession: &str, filing_date: &str, report_date: &str) {
        if !accession.is_empty() {
            self.metadata.accession_number = accession.to_string();
        }
        if !filing_date.is_empty() {
            self.metadata.filing_date = filing_date.to_string();
        }
        if !report_date.is_empty() {
            self.metadata.report_date = report_date.to_string();
        }
    }
}

impl Form4 {
    /// Projects the structural tree into the published record.
    ///
    /// The 10b5-1 derivation runs in a fixed order: footnotes and remarks are
    /// pre-scanned once, the remarks-globalization gate is decided at the
    /// document level, and each row then resolves its status with footnote
    /// evidence taking priority over the gate.
    pub fn to_output(&self) -> Form4Output {
        let footnote_pairs: Vec<(&str, &str)> = self
            .footnote_items()
            .iter()
            .map(|f| (f.id.as_str(), f.text.as_str()))
            .collect();
        let tenb51_map = tenb51::scan_10b51_signals(footnote_pairs, &self.remarks);

        // The remarks signal applies globally only when the XML flag asserts a
        // plan and no footnote already carries the evidence.
        let any_footnote_positive = self
            .footnote_items()
            .iter()
            .any(|f| tenb51_map.contains_key(&f.id));
        let use_remarks_global = self.aff10b5_one
            && !any_footnote_positive
            && tenb51_map.contains_key(REMARKS_KEY);

        let ctx = ProjectionContext {
            map: &tenb51_map,
            use_remarks_global,
        };

        let mut out = Form4Output {
            metadata: Form4Metadata {
                cik: self.issuer.cik.clone(),
                form_type: self.document_type.clone(),
                period_of_report: self.period_of_report.clone(),
                ..Default::default()
            },
            form_type: self.document_type.clone(),
            schema_version: self.schema_version.clone(),
            period_of_report: self.period_of_report.clone(),
            has_10b51_plan: self.has_10b51_plan(),
            issuer: convert_issuer(&self.issuer),
            reporting_owners: self.reporting_owners.iter().map(convert_owner).collect(),
            footnotes: self.footnote_items().iter().map(convert_footnote).collect(),
            signatures: self.signatures.iter().map(convert_signature).collect(),
            ..Default::default()
        };

        if let Some(table) = &self.non_derivative_table {
            out.transactions = table
                .transactions
                .iter()
                .map(|txn| convert_non_deriv_transaction(txn, &ctx))
                .collect();
            out.holdings = table.holdings.iter().map(convert_non_deriv_holding).collect();
        }

        if let Some(table) = &self.derivative_table {
            out.derivatives = table
                .transactions
                .iter()
                .map(|txn| convert_deriv_transaction(txn, &ctx))
                .collect();
            out.derivative_holdings =
                table.holdings.iter().map(convert_deriv_holding).collect();
        }

        // Surface non-empty remarks as a synthetic footnote so downstream
        // consumers see the text alongside the regular footnotes.
        if !self.remarks.is_empty() {
            out.footnotes.push(FootnoteOutput {
                id: REMARKS_FOOTNOTE_ID.to_string(),
                text: self.remarks.clone(),
            });
        }

        out
    }
}

struct ProjectionContext<'a> {
    map: &'a HashMap<String, String>,
    use_remarks_global: bool,
}

impl ProjectionContext<'_> {
    /// Resolves a row's 10b5-1 status from its referenced footnotes, falling
    /// back to the remarks signal only under the globalization gate.
    fn resolve(&self, footnote_ids: &[String]) -> (bool, Option<String>) {
        for id in footnote_ids {
            if let Some(date) = self.map.get(id) {
                return (true, non_empty(date));
            }
        }
        if self.use_remarks_global {
            if let Some(date) = self.map.get(REMARKS_KEY) {
                return (true, non_empty(date));
            }
        }
        (false, None)
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn convert_issuer(issuer: &Issuer) -> IssuerOutput {
    IssuerOutput {
        cik: issuer.cik.clone(),
        name: issuer.name.clone(),
        ticker: issuer.trading_symbol.clone(),
    }
}

fn convert_owner(owner: &ReportingOwner) -> ReportingOwnerOutput {
    ReportingOwnerOutput {
        cik: owner.id.cik.clone(),
        name: owner.id.name.clone(),
        address: AddressOutput {
            street1: owner.address.street1.clone(),
            street2: owner.address.street2.clone(),
            city: owner.address.city.clone(),
            state: owner.address.state.clone(),
            zip_code: owner.address.zip_code.clone(),
        },
        relationship: RelationshipOutput {
            is_director: owner.relationship.is_director,
            is_officer: owner.relationship.is_officer,
            is_ten_percent_owner: owner.relationship.is_ten_percent_owner,
            is_other: owner.relationship.is_other,
            officer_title: owner.relationship.officer_title.clone(),
        },
    }
}

fn convert_footnote(footnote: &Footnote) -> FootnoteOutput {
    FootnoteOutput {
        id: footnote.id.clone(),
        text: footnote.text.clone(),
    }
}

fn convert_signature(sig: &Signature) -> SignatureOutput {
    SignatureOutput {
        name: sig.name.clone(),
        date: sig.date.clone(),
    }
}

fn convert_non_deriv_transaction(
    txn: &NonDerivativeTransaction,
    ctx: &ProjectionContext<'_>,
) -> NonDerivativeTransactionOutput {
    let footnotes = collect_footnotes(&[
        txn.coding
            .footnote_id
            .as_ref()
            .map(|f| f.id.as_str())
            .unwrap_or(""),
        txn.amounts.shares.footnote(),
        txn.amounts.price_per_share.footnote(),
        txn.post_transaction.shares_owned_following.footnote(),
    ]);

    let (is_10b51, adoption_date) = ctx.resolve(&footnotes);

    NonDerivativeTransactionOutput {
        security_title: txn.security_title.value.clone(),
        transaction_date: txn.transaction_date.value.clone(),
        transaction_code: txn.coding.code.clone(),
        shares: txn.amounts.shares.as_number().ok(),
        price_per_share: txn.amounts.price_per_share.as_number().ok(),
        acquired_disposed: txn.amounts.acquired_disposed.value.clone(),
        shares_owned_following: txn.post_transaction.shares_owned_following.as_number().ok(),
        direct_indirect: txn.ownership_nature.direct_or_indirect.value.clone(),
        nature_of_ownership: txn.ownership_nature.nature_of_ownership.value.clone(),
        equity_swap_involved: txn.coding.equity_swap_involved,
        is_10b51_plan: is_10b51,
        plan_10b51_adoption_date: adoption_date,
        footnotes,
    }
}

fn convert_deriv_transaction(
    txn: &DerivativeTransaction,
    ctx: &ProjectionContext<'_>,
) -> DerivativeTransactionOutput {
    let footnotes = collect_footnotes(&[
        txn.coding
            .footnote_id
            .as_ref()
            .map(|f| f.id.as_str())
            .unwrap_or(""),
        txn.amounts.shares.footnote(),
        txn.amounts.price_per_share.footnote(),
        txn.conversion_or_exercise_price.footnote(),
        txn.exercise_date.footnote(),
        txn.expiration_date.footnote(),
        txn.underlying_security.security_title.footnote(),
        txn.underlying_security.shares.footnote(),
        txn.post_transaction.shares_owned_following.footnote(),
    ]);

    let (is_10b51, adoption_date) = ctx.resolve(&footnotes);

    DerivativeTransactionOutput {
        security_title: txn.security_title.value.clone(),
        transaction_date: txn.transaction_date.value.clone(),
        transaction_code: txn.coding.code.clone(),
        shares: txn.amounts.shares.as_number().ok(),
        price_per_share: txn.amounts.price_per_share.as_number().ok(),
        acquired_disposed: txn.amounts.acquired_disposed.value.clone(),
        exercise_price: txn.conversion_or_exercise_price.as_number().ok(),
        exercise_date: txn.exercise_date.value.clone(),
        expiration_date: txn.expiration_date.value.clone(),
        underlying_title: txn.underlying_security.security_title.value.clone(),
        underlying_shares: txn.underlying_security.shares.as_number().ok(),
        shares_owned_following: txn.post_transaction.shares_owned_following.as_number().ok(),
        direct_indirect: txn.ownership_nature.direct_or_indirect.value.clone(),
        nature_of_ownership: txn.ownership_nature.nature_of_ownership.value.clone(),
        equity_swap_involved: txn.coding.equity_swap_involved,
        is_10b51_plan: is_10b51,
        plan_10b51_adoption_date: adoption_date,
        footnotes,
    }
}

fn convert_non_deriv_holding(holding: &NonDerivativeHolding) -> NonDerivativeHoldingOutput {
    let footnotes = collect_footnotes(&[
        holding.security_title.footnote(),
        holding.post_transaction.shares_owned_following.footnote(),
        holding.ownership_nature.direct_or_indirect.footnote(),
        holding.ownership_nature.nature_of_ownership.footnote(),
    ]);

    NonDerivativeHoldingOutput {
        security_title: holding.security_title.value.clone(),
        shares_owned_following: holding.post_transaction.shares_owned_following.as_number().ok(),
        direct_indirect: holding.ownership_nature.direct_or_indirect.value.clone(),
        nature_of_ownership: holding.ownership_nature.nature_of_ownership.value.clone(),
        footnotes,
    }
}

fn convert_deriv_holding(holding: &DerivativeHolding) -> DerivativeHoldingOutput {
    let footnotes = collect_footnotes(&[
        holding.conversion_or_exercise_price.footnote(),
        holding.exercise_date.footnote(),
        holding.expiration_date.footnote(),
        holding.underlying_security.security_title.footnote(),
        holding.underlying_security.shares.footnote(),
        holding.post_transaction.shares_owned_following.footnote(),
    ]);

    DerivativeHoldingOutput {
        security_title: holding.security_title.value.clone(),
        exercise_price: holding.conversion_or_exercise_price.as_number().ok(),
        exercise_date: holding.exercise_date.value.clone(),
        expiration_date: holding.expiration_date.value.clone(),
        underlying_title: holding.underlying_security.security_title.value.clone(),
        underlying_shares: holding.underlying_security.shares.as_number().ok(),
        shares_owned_following: holding.post_transaction.shares_owned_following.as_number().ok(),
        direct_indirect: holding.ownership_nature.direct_or_indirect.value.clone(),
        nature_of_ownership: holding.ownership_nature.nature_of_ownership.value.clone(),
        footnotes,
    }
}

/// Deduplicates footnote IDs preserving first-occurrence order; empty strings
/// are dropped.
fn collect_footnotes(ids: &[&str]) -> Vec<String> {
    let mut result = Vec::new();
    for id in ids {
        if !id.is_empty() && !result.iter().any(|existing| existing == id) {
            result.push(id.to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::super::form4::parse;
    use super::*;

    const PLAN_SALE_XML: &str = r#"<ownershipDocument>
    <documentType>4</documentType>
    <periodOfReport>2025-03-14</periodOfReport>
    <aff10b5One>true</aff10b5One>
    <issuer>
        <issuerCik>0000320193</issuerCik>
        <issuerName>Apple Inc.</issuerName>
        <issuerTradingSymbol>AAPL</issuerTradingSymbol>
    </issuer>
    <nonDerivativeTable>
        <nonDerivativeTransaction>
            <securityTitle><value>Common Stock</value></securityTitle>
            <transactionDate><value>2025-03-14</value></transactionDate>
            <transactionCoding>
                <transactionCode>S</transactionCode>
                <equitySwapInvolved>0</equitySwapInvolved>
                <footnoteId id="F1"/>
            </transactionCoding>
            <transactionAmounts>
                <transactionShares><value>60000</value><footnoteId id="F1"/></transactionShares>
                <transactionPricePerShare><value>13.20</value></transactionPricePerShare>
                <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
            <postTransactionAmounts>
                <sharesOwnedFollowingTransaction><value>140000</value></sharesOwnedFollowingTransaction>
            </postTransactionAmounts>
            <ownershipNature>
                <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
            </ownershipNature>
        </nonDerivativeTransaction>
    </nonDerivativeTable>
    <footnotes>
        <footnote id="F1">Sales effected pursuant to a Rule 10b5-1 trading plan adopted on March 13, 2025.</footnote>
    </footnotes>
</ownershipDocument>"#;

    const WARRANT_EXERCISE_XML: &str = r#"<ownershipDocument>
    <documentType>4</documentType>
    <periodOfReport>2025-02-03</periodOfReport>
    <issuer>
        <issuerCik>0001631574</issuerCik>
        <issuerName>Biotech Holdings Corp</issuerName>
        <issuerTradingSymbol>BTHC</issuerTradingSymbol>
    </issuer>
    <nonDerivativeTable>
        <nonDerivativeTransaction>
            <securityTitle><value>Common Stock</value></securityTitle>
            <transactionDate><value>2025-02-03</value></transactionDate>
            <transactionCoding>
                <transactionCode>X</transactionCode>
                <equitySwapInvolved>0</equitySwapInvolved>
            </transactionCoding>
            <transactionAmounts>
                <transactionShares><value>697674</value><footnoteId id="F1"/></transactionShares>
                <transactionPricePerShare><value></value></transactionPricePerShare>
                <transactionAcquiredDisposedCode><value>A</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
            <postTransactionAmounts>
                <sharesOwnedFollowingTransaction><value>697674</value></sharesOwnedFollowingTransaction>
            </postTransactionAmounts>
            <ownershipNature>
                <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
            </ownershipNature>
        </nonDerivativeTransaction>
    </nonDerivativeTable>
    <derivativeTable>
        <derivativeTransaction>
            <securityTitle><value>Warrant</value></securityTitle>
            <conversionOrExercisePrice><value>2.02</value></conversionOrExercisePrice>
            <transactionDate><value>2025-02-03</value></transactionDate>
            <transactionCoding>
                <transactionCode>X</transactionCode>
                <equitySwapInvolved>0</equitySwapInvolved>
            </transactionCoding>
            <transactionAmounts>
                <transactionShares><value>697674</value></transactionShares>
                <transactionPricePerShare><value>0</value></transactionPricePerShare>
                <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
            <exerciseDate><value>2025-02-03</value></exerciseDate>
            <expirationDate><value>2027-08-01</value><footnoteId id="F1"/></expirationDate>
            <underlyingSecurity>
                <underlyingSecurityTitle><value>Common Stock</value></underlyingSecurityTitle>
                <underlyingSecurityShares><value>697674</value></underlyingSecurityShares>
            </underlyingSecurity>
            <postTransactionAmounts>
                <sharesOwnedFollowingTransaction><value>0</value></sharesOwnedFollowingTransaction>
            </postTransactionAmounts>
            <ownershipNature>
                <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
            </ownershipNature>
        </derivativeTransaction>
    </derivativeTable>
    <footnotes>
        <footnote id="F1">The warrant was exercised on a cashless basis.</footnote>
    </footnotes>
</ownershipDocument>"#;

    #[test]
    fn test_plan_sale_projection() {
        let form = parse(PLAN_SALE_XML.as_bytes()).unwrap();
        let out = form.to_output();

        assert!(out.has_10b51_plan);
        assert_eq!(out.transactions.len(), 1);

        let txn = &out.transactions[0];
        assert_eq!(txn.transaction_code, "S");
        assert_eq!(txn.shares, Some(60000.0));
        assert_eq!(txn.price_per_share, Some(13.20));
        assert!(txn.is_10b51_plan);
        assert_eq!(txn.plan_10b51_adoption_date.as_deref(), Some("2025-03-13"));
        // F1 referenced by coding and shares; deduplicated in first-occurrence order
        assert_eq!(txn.footnotes, vec!["F1"]);
    }

    #[test]
    fn test_warrant_exercise_projection() {
        let form = parse(WARRANT_EXERCISE_XML.as_bytes()).unwrap();
        let out = form.to_output();

        assert!(!out.has_10b51_plan);

        let txn = &out.transactions[0];
        assert_eq!(txn.transaction_code, "X");
        assert_eq!(txn.shares, Some(697674.0));
        assert_eq!(txn.price_per_share, None);
        assert_eq!(txn.acquired_disposed, "A");
        assert!(!txn.is_10b51_plan);
        assert_eq!(txn.footnotes, vec!["F1"]);

        let deriv = &out.derivatives[0];
        assert_eq!(deriv.transaction_code, "X");
        assert_eq!(deriv.price_per_share, Some(0.0));
        assert_eq!(deriv.exercise_price, Some(2.02));
        assert_eq!(deriv.underlying_shares, Some(697674.0));
        assert_eq!(deriv.acquired_disposed, "D");
        assert!(!deriv.is_10b51_plan);
        assert_eq!(deriv.footnotes, vec!["F1"]);
    }

    #[test]
    fn test_remarks_gate_applies_globally() {
        let xml = r#"<ownershipDocument>
            <documentType>4</documentType>
            <aff10b5One>true</aff10b5One>
            <issuer><issuerCik>1</issuerCik></issuer>
            <nonDerivativeTable>
                <nonDerivativeTransaction>
                    <securityTitle><value>Common Stock</value></securityTitle>
                    <transactionDate><value>2025-06-02</value></transactionDate>
                    <transactionCoding><transactionCode>S</transactionCode></transactionCoding>
                    <transactionAmounts>
                        <transactionShares><value>100</value></transactionShares>
                        <transactionPricePerShare><value>10</value></transactionPricePerShare>
                        <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
                    </transactionAmounts>
                    <postTransactionAmounts>
                        <sharesOwnedFollowingTransaction><value>900</value></sharesOwnedFollowingTransaction>
                    </postTransactionAmounts>
                    <ownershipNature>
                        <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
                    </ownershipNature>
                </nonDerivativeTransaction>
            </nonDerivativeTable>
            <remarks>All sales reported herein were effected pursuant to a Rule 10b5-1 trading plan adopted on January 6, 2025.</remarks>
        </ownershipDocument>"#;

        let form = parse(xml.as_bytes()).unwrap();
        let out = form.to_output();

        let txn = &out.transactions[0];
        assert!(txn.is_10b51_plan);
        assert_eq!(txn.plan_10b51_adoption_date.as_deref(), Some("2025-01-06"));
        assert!(txn.footnotes.is_empty());

        // Remarks surfaced as a synthetic footnote
        let last = out.footnotes.last().unwrap();
        assert_eq!(last.id, REMARKS_FOOTNOTE_ID);
        assert!(last.text.contains("Rule 10b5-1"));
    }

    #[test]
    fn test_remarks_does_not_override_footnote_evidence() {
        // A footnote classifies positively, so the remarks signal must stay
        // row-scoped: rows without the footnote are not marked.
        let xml = r#"<ownershipDocument>
            <documentType>4</documentType>
            <aff10b5One>true</aff10b5One>
            <issuer><issuerCik>1</issuerCik></issuer>
            <nonDerivativeTable>
                <nonDerivativeTransaction>
                    <securityTitle><value>Common Stock</value></securityTitle>
                    <transactionDate><value>2025-06-02</value></transactionDate>
                    <transactionCoding><transactionCode>S</transactionCode><footnoteId id="F1"/></transactionCoding>
                    <transactionAmounts>
                        <transactionShares><value>100</value></transactionShares>
                        <transactionPricePerShare><value>10</value></transactionPricePerShare>
                        <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
                    </transactionAmounts>
                    <postTransactionAmounts>
                        <sharesOwnedFollowingTransaction><value>900</value></sharesOwnedFollowingTransaction>
                    </postTransactionAmounts>
                    <ownershipNature>
                        <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
                    </ownershipNature>
                </nonDerivativeTransaction>
                <nonDerivativeTransaction>
                    <securityTitle><value>Common Stock</value></securityTitle>
                    <transactionDate><value>2025-06-03</value></transactionDate>
                    <transactionCoding><transactionCode>G</transactionCode></transactionCoding>
                    <transactionAmounts>
                        <transactionShares><value>50</value></transactionShares>
                        <transactionPricePerShare><value>0</value></transactionPricePerShare>
                        <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
                    </transactionAmounts>
                    <postTransactionAmounts>
                        <sharesOwnedFollowingTransaction><value>850</value></sharesOwnedFollowingTransaction>
                    </postTransactionAmounts>
                    <ownershipNature>
                        <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
                    </ownershipNature>
                </nonDerivativeTransaction>
            </nonDerivativeTable>
            <footnotes>
                <footnote id="F1">Sale made pursuant to a 10b5-1 trading plan adopted on February 1, 2025.</footnote>
            </footnotes>
            <remarks>Sold under a Rule 10b5-1 plan.</remarks>
        </ownershipDocument>"#;

        let form = parse(xml.as_bytes()).unwrap();
        let out = form.to_output();

        assert!(out.transactions[0].is_10b51_plan);
        assert_eq!(
            out.transactions[0].plan_10b51_adoption_date.as_deref(),
            Some("2025-02-01")
        );
        // Second row has no footnote reference and the gate is closed
        assert!(!out.transactions[1].is_10b51_plan);
        assert_eq!(out.transactions[1].plan_10b51_adoption_date, None);
    }

    #[test]
    fn test_footnote_dedup_preserves_first_occurrence_order() {
        let footnotes = collect_footnotes(&["F2", "F1", "F2", "", "F3", "F1"]);
        assert_eq!(footnotes, vec!["F2", "F1", "F3"]);
    }

    #[test]
    fn test_dangling_footnote_reference_is_retained() {
        // A row referencing a footnote with no matching body keeps the ID.
        let xml = r#"<ownershipDocument>
            <documentType>4</documentType>
            <issuer><issuerCik>1</issuerCik></issuer>
            <nonDerivativeTable>
                <nonDerivativeTransaction>
                    <securityTitle><value>Common Stock</value></securityTitle>
                    <transactionDate><value>2025-06-02</value></transactionDate>
                    <transactionCoding><transactionCode>P</transactionCode><footnoteId id="F9"/></transactionCoding>
                    <transactionAmounts>
                        <transactionShares><value>10</value></transactionShares>
                        <transactionPricePerShare><value>5</value></transactionPricePerShare>
                        <transactionAcquiredDisposedCode><value>A</value></transactionAcquiredDisposedCode>
                    </transactionAmounts>
                    <postTransactionAmounts>
                        <sharesOwnedFollowingTransaction><value>10</value></sharesOwnedFollowingTransaction>
                    </postTransactionAmounts>
                    <ownershipNature>
                        <directOrIndirectOwnership><value>D</value></directOrIndirectOwnership>
                    </ownershipNature>
                </nonDerivativeTransaction>
            </nonDerivativeTable>
        </ownershipDocument>"#;

        let form = parse(xml.as_bytes()).unwrap();
        let out = form.to_output();
        assert_eq!(out.transactions[0].footnotes, vec!["F9"]);
        assert!(out.footnotes.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let form = parse(PLAN_SALE_XML.as_bytes()).unwrap();
        let out = form.to_output();

        let json = serde_json::to_string_pretty(&out).unwrap();
        let back: Form4Output = serde_json::from_str(&json).unwrap();

        assert_eq!(back.transactions.len(), out.transactions.len());
        assert_eq!(back.transactions[0].shares, out.transactions[0].shares);
        assert_eq!(
            back.transactions[0].plan_10b51_adoption_date,
            out.transactions[0].plan_10b51_adoption_date
        );
        assert_eq!(back.footnotes.len(), out.footnotes.len());
    }
}
