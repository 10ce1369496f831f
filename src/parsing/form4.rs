//! Form 4 structural parser.
//!
//! Forms 3, 4 and 5 share the `ownershipDocument` XML schema; only Form 4 is
//! interpreted beyond detection. The structural tree mirrors the on-wire
//! document: numeric-ish leaves are [`Value`]s carrying the raw string and an
//! optional footnote reference, and conversion to numbers is late so the
//! on-wire precision and the footnote-only case stay representable.

use serde::Deserialize;

use crate::error::{EdgarError, Result};
use crate::parsing::tenb51;

/// An SEC Form 4 insider trading filing (`ownershipDocument` root).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form4 {
    pub schema_version: String,
    pub document_type: String,
    pub period_of_report: String,
    /// 10b5-1 trading plan indicator
    pub aff10b5_one: bool,
    pub issuer: Issuer,
    #[serde(rename = "reportingOwner")]
    pub reporting_owners: Vec<ReportingOwner>,
    pub non_derivative_table: Option<NonDerivativeTable>,
    pub derivative_table: Option<DerivativeTable>,
    pub footnotes: Option<FootnoteList>,
    #[serde(rename = "ownerSignature")]
    pub signatures: Vec<Signature>,
    pub remarks: String,
}

/// The company whose stock is being traded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Issuer {
    #[serde(rename = "issuerCik")]
    pub cik: String,
    #[serde(rename = "issuerName")]
    pub name: String,
    #[serde(rename = "issuerTradingSymbol")]
    pub trading_symbol: String,
}

/// An insider filing the Form 4
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportingOwner {
    #[serde(rename = "reportingOwnerId")]
    pub id: OwnerId,
    #[serde(rename = "reportingOwnerAddress")]
    pub address: OwnerAddress,
    #[serde(rename = "reportingOwnerRelationship")]
    pub relationship: Relationship,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwnerId {
    #[serde(rename = "rptOwnerCik")]
    pub cik: String,
    #[serde(rename = "rptOwnerName")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwnerAddress {
    #[serde(rename = "rptOwnerStreet1")]
    pub street1: String,
    #[serde(rename = "rptOwnerStreet2")]
    pub street2: String,
    #[serde(rename = "rptOwnerCity")]
    pub city: String,
    #[serde(rename = "rptOwnerState")]
    pub state: String,
    #[serde(rename = "rptOwnerZipCode")]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Relationship {
    pub is_director: bool,
    pub is_officer: bool,
    pub is_ten_percent_owner: bool,
    pub is_other: bool,
    pub officer_title: String,
}

/// Table I: common stock transactions and holdings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NonDerivativeTable {
    #[serde(rename = "nonDerivativeTransaction")]
    pub transactions: Vec<NonDerivativeTransaction>,
    #[serde(rename = "nonDerivativeHolding")]
    pub holdings: Vec<NonDerivativeHolding>,
}

/// A stock purchase, sale, or grant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonDerivativeTransaction {
    pub security_title: Value,
    pub transaction_date: Value,
    #[serde(rename = "transactionCoding")]
    pub coding: TransactionCoding,
    #[serde(rename = "transactionAmounts")]
    pub amounts: TransactionAmounts,
    #[serde(rename = "postTransactionAmounts")]
    pub post_transaction: PostTransactionAmounts,
    pub ownership_nature: OwnershipNature,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionCoding {
    #[serde(rename = "transactionFormType")]
    pub form_type: String,
    #[serde(rename = "transactionCode")]
    pub code: String,
    pub equity_swap_involved: bool,
    pub footnote_id: Option<FootnoteRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionAmounts {
    #[serde(rename = "transactionShares")]
    pub shares: Value,
    #[serde(rename = "transactionPricePerShare")]
    pub price_per_share: Value,
    #[serde(rename = "transactionAcquiredDisposedCode")]
    pub acquired_disposed: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostTransactionAmounts {
    #[serde(rename = "sharesOwnedFollowingTransaction")]
    pub shares_owned_following: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwnershipNature {
    #[serde(rename = "directOrIndirectOwnership")]
    pub direct_or_indirect: Value,
    #[serde(rename = "natureOfOwnership")]
    pub nature_of_ownership: Value,
}

/// A numeric-ish leaf: the raw on-wire string plus an optional footnote
/// reference. Conversion happens late through [`Value::as_number`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Value {
    pub value: String,
    #[serde(rename = "footnoteId")]
    pub footnote_id: Option<FootnoteRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FootnoteRef {
    #[serde(rename = "@id", default)]
    pub id: String,
}

impl Value {
    /// The referenced footnote ID, or empty when the field carries none.
    pub fn footnote(&self) -> &str {
        self.footnote_id.as_ref().map(|f| f.id.as_str()).unwrap_or("")
    }

    /// Late numeric conversion. An empty raw string is an error so callers can
    /// distinguish "absent" from zero.
    pub fn as_number(&self) -> Result<f64> {
        if self.value.is_empty() {
            return Err(EdgarError::InvalidFormat("empty value".to_string()));
        }
        self.value
            .parse::<f64>()
            .map_err(|e| EdgarError::InvalidFormat(format!("{}: {:?}", e, self.value)))
    }
}

/// Table II: derivative transactions and holdings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DerivativeTable {
    #[serde(rename = "derivativeTransaction")]
    pub transactions: Vec<DerivativeTransaction>,
    #[serde(rename = "derivativeHolding")]
    pub holdings: Vec<DerivativeHolding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativeTransaction {
    pub security_title: Value,
    pub conversion_or_exercise_price: Value,
    pub transaction_date: Value,
    #[serde(rename = "transactionCoding")]
    pub coding: TransactionCoding,
    #[serde(rename = "transactionAmounts")]
    pub amounts: TransactionAmounts,
    pub exercise_date: Value,
    pub expiration_date: Value,
    pub underlying_security: UnderlyingSecurity,
    #[serde(rename = "postTransactionAmounts")]
    pub post_transaction: PostTransactionAmounts,
    pub ownership_nature: OwnershipNature,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativeHolding {
    pub security_title: Value,
    pub conversion_or_exercise_price: Value,
    pub exercise_date: Value,
    pub expiration_date: Value,
    pub underlying_security: UnderlyingSecurity,
    #[serde(rename = "postTransactionAmounts")]
    pub post_transaction: PostTransactionAmounts,
    pub ownership_nature: OwnershipNature,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonDerivativeHolding {
    pub security_title: Value,
    #[serde(rename = "postTransactionAmounts")]
    pub post_transaction: PostTransactionAmounts,
    pub ownership_nature: OwnershipNature,
}

/// The security underlying a derivative
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnderlyingSecurity {
    #[serde(rename = "underlyingSecurityTitle")]
    pub security_title: Value,
    #[serde(rename = "underlyingSecurityShares")]
    pub shares: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FootnoteList {
    #[serde(rename = "footnote")]
    pub items: Vec<Footnote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Footnote {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Signature {
    #[serde(rename = "signatureName")]
    pub name: String,
    #[serde(rename = "signatureDate")]
    pub date: String,
}

/// Parses Form 4 XML into the structural tree.
pub fn parse(data: &[u8]) -> Result<Form4> {
    let text = String::from_utf8_lossy(data);
    let form4: Form4 = quick_xml::de::from_str(&text)?;
    Ok(form4)
}

/// Human-readable description of a single-letter transaction code.
pub fn transaction_code_description(code: &str) -> &'static str {
    match code {
        "P" => "Open Market Purchase",
        "S" => "Open Market Sale",
        "A" => "Grant, Award or Other Acquisition",
        "D" => "Disposition to the Issuer",
        "F" => "Payment of Exercise Price or Tax Liability",
        "G" => "Gift",
        "M" => "Exercise or Conversion of Derivative Security",
        "C" => "Conversion of Derivative Security",
        "E" => "Expiration of Short Derivative Position",
        "H" => "Expiration of Long Derivative Position",
        "I" => "Discretionary Transaction",
        "O" => "Exercise of Out-of-the-Money Derivative Security",
        "U" => "Disposition Pursuant to a Tender",
        "X" => "Exercise of In-the-Money or At-the-Money Derivative Security",
        "Z" => "Deposit into or Withdrawal from Voting Trust",
        _ => "",
    }
}

impl Form4 {
    /// Footnotes as a slice regardless of whether the container was present.
    pub fn footnote_items(&self) -> &[Footnote] {
        self.footnotes.as_ref().map(|f| f.items.as_slice()).unwrap_or(&[])
    }

    /// Only open market purchases and sales (codes `P` and `S`).
    pub fn market_trades(&self) -> Vec<&NonDerivativeTransaction> {
        self.non_derivative_table
            .as_ref()
            .map(|t| {
                t.transactions
                    .iter()
                    .filter(|txn| txn.coding.code == "P" || txn.coding.code == "S")
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Only open market purchases (code `P`).
    pub fn purchases(&self) -> Vec<&NonDerivativeTransaction> {
        self.market_trades()
            .into_iter()
            .filter(|txn| txn.coding.code == "P")
            .collect()
    }

    /// Only open market sales (code `S`).
    pub fn sales(&self) -> Vec<&NonDerivativeTransaction> {
        self.market_trades()
            .into_iter()
            .filter(|txn| txn.coding.code == "S")
            .collect()
    }

    /// Document-level 10b5-1 summary: true when the XML flag asserts or any
    /// footnote text mentions Rule 10b5-1.
    pub fn has_10b51_plan(&self) -> bool {
        if self.aff10b5_one {
            return true;
        }
        self.footnote_items()
            .iter()
            .any(|fn_| tenb51::mentions_10b51(&fn_.text))
    }
}
