//! Fact queries and the Financial Snapshot projection.
//!
//! [`FactQuery`] is a fluent, borrowing filter over a document's fact list:
//! concept/label filters, period end-date equality, and instant-vs-duration
//! shape predicates, with `get`/`first`/`most_recent`/`sum` terminals.
//! [`Xbrl::snapshot`] runs one query per snapshot field (instant shape for
//! balance-sheet slots, duration shape for income and cash-flow slots) and
//! reports required labels whose extracted value is zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EdgarError, Result};
use crate::parsing::concepts;
use crate::parsing::xbrl::{Fact, Period, Xbrl};

/// Fluent query over an XBRL document's facts.
///
/// Filters compose; terminals evaluate against the facts in source order.
pub struct FactQuery<'a> {
    facts: &'a [Fact],
    concept_filter: Vec<String>,
    label_filter: Option<String>,
    period_filter: Option<String>,
    instant_only: bool,
    duration_only: bool,
}

impl Xbrl {
    /// Starts a new query over this document's facts.
    pub fn query(&self) -> FactQuery<'_> {
        FactQuery {
            facts: &self.facts,
            concept_filter: Vec::new(),
            label_filter: None,
            period_filter: None,
            instant_only: false,
            duration_only: false,
        }
    }
}

impl<'a> FactQuery<'a> {
    /// Matches facts whose concept equals or contains any of the given
    /// strings. The substring match is an escape hatch for prefix-style
    /// taxonomies.
    pub fn by_concept<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concept_filter = concepts.into_iter().map(Into::into).collect();
        self
    }

    /// Matches facts whose standardized label equals `label` exactly.
    pub fn by_label(mut self, label: impl Into<String>) -> Self {
        self.label_filter = Some(label.into());
        self
    }

    /// Matches facts whose period ends on the given ISO date (an instant's
    /// instant, or a duration's end date).
    pub fn for_period_ending_on(mut self, date: impl Into<String>) -> Self {
        self.period_filter = Some(date.into());
        self
    }

    /// Only instant facts (balance sheet items).
    pub fn instant_only(mut self) -> Self {
        self.instant_only = true;
        self
    }

    /// Only duration facts (income statement and cash flow items).
    pub fn duration_only(mut self) -> Self {
        self.duration_only = true;
        self
    }

    fn matches(&self, fact: &Fact) -> bool {
        if !self.concept_filter.is_empty() {
            let matched = self
                .concept_filter
                .iter()
                .any(|c| fact.concept == *c || fact.concept.contains(c.as_str()));
            if !matched {
                return false;
            }
        }

        if let Some(label) = &self.label_filter {
            if fact.standard_label != *label {
                return false;
            }
        }

        if let Some(date) = &self.period_filter {
            match &fact.period {
                Some(period) if period.end_date_str() == date => {}
                _ => return false,
            }
        }

        if self.instant_only && !fact.is_instant() {
            return false;
        }
        if self.duration_only && !fact.is_duration() {
            return false;
        }

        true
    }

    /// All matching facts in source order.
    pub fn get(&self) -> Vec<&'a Fact> {
        self.facts.iter().filter(|f| self.matches(f)).collect()
    }

    /// The first matching fact, or `NotFound`.
    pub fn first(&self) -> Result<&'a Fact> {
        self.get().first().copied().ok_or(EdgarError::NotFound)
    }

    /// The matching fact with the most recent period end date.
    ///
    /// The sort is stable, so among facts sharing an end date the first in
    /// document order wins.
    pub fn most_recent(&self) -> Result<&'a Fact> {
        let mut results = self.get();
        if results.is_empty() {
            return Err(EdgarError::NotFound);
        }

        results.sort_by(|a, b| b.end_date().cmp(&a.end_date()));
        Ok(results[0])
    }

    /// Sum of the numeric values of all matches; `NotFound` when nothing
    /// matches.
    pub fn sum(&self) -> Result<f64> {
        let results = self.get();
        if results.is_empty() {
            return Err(EdgarError::NotFound);
        }

        Ok(results.iter().filter_map(|f| f.numeric_value).sum())
    }
}

// High-level metric helpers

impl Xbrl {
    /// Most recent cash and equivalents balance.
    pub fn cash_and_equivalents(&self) -> Result<f64> {
        self.query()
            .by_label("Cash and Cash Equivalents")
            .instant_only()
            .most_recent()?
            .as_number()
    }

    /// R&D expense for the given period end, or the most recent one.
    pub fn research_and_development(&self, period: &str) -> Result<f64> {
        let mut query = self
            .query()
            .by_label("Research and Development Expense")
            .duration_only();
        if !period.is_empty() {
            query = query.for_period_ending_on(period);
        }
        query.most_recent()?.as_number()
    }

    /// G&A expense for the given period end, or the most recent one.
    pub fn general_and_administrative(&self, period: &str) -> Result<f64> {
        let mut query = self
            .query()
            .by_label("General and Administrative Expense")
            .duration_only();
        if !period.is_empty() {
            query = query.for_period_ending_on(period);
        }
        query.most_recent()?.as_number()
    }

    /// Operating burn (R&D + G&A); errors only when neither is reported.
    pub fn burn(&self, period: &str) -> Result<f64> {
        let rd = self.research_and_development(period);
        let ga = self.general_and_administrative(period);

        if rd.is_err() && ga.is_err() {
            return Err(EdgarError::NotFound);
        }

        Ok(rd.unwrap_or(0.0) + ga.unwrap_or(0.0))
    }

    /// Total debt (short-term + long-term) as of the most recent balance
    /// sheet; errors when neither line is reported.
    pub fn total_debt(&self) -> Result<f64> {
        let lt = self
            .query()
            .by_label("Long-Term Debt")
            .instant_only()
            .most_recent()
            .and_then(|f| f.as_number())
            .unwrap_or(0.0);

        let st = self
            .query()
            .by_label("Short-Term Debt")
            .instant_only()
            .most_recent()
            .and_then(|f| f.as_number())
            .unwrap_or(0.0);

        if lt == 0.0 && st == 0.0 {
            return Err(EdgarError::NotFound);
        }

        Ok(lt + st)
    }

    /// Diluted weighted-average shares for the period.
    pub fn diluted_shares(&self, period: &str) -> Result<f64> {
        let mut query = self
            .query()
            .by_label("Shares Outstanding (Diluted)")
            .duration_only();
        if !period.is_empty() {
            query = query.for_period_ending_on(period);
        }
        query.most_recent()?.as_number()
    }

    /// Revenue for the period; zero when not reported (pre-revenue issuers).
    pub fn revenue(&self, period: &str) -> Result<f64> {
        let mut query = self.query().by_label("Revenue").duration_only();
        if !period.is_empty() {
            query = query.for_period_ending_on(period);
        }
        match query.most_recent() {
            Ok(fact) => fact.as_number(),
            Err(_) => Ok(0.0),
        }
    }

    /// Net income (loss) for the period; zero when not reported.
    pub fn net_income(&self, period: &str) -> Result<f64> {
        let mut query = self.query().by_label("Net Income (Loss)").duration_only();
        if !period.is_empty() {
            query = query.for_period_ending_on(period);
        }
        match query.most_recent() {
            Ok(fact) => fact.as_number(),
            Err(_) => Ok(0.0),
        }
    }
}

/// Fixed-schema snapshot of the headline financial metrics of one report.
///
/// Field values are the most recent fact per standardized label; a missing or
/// non-numeric fact becomes 0. Required labels whose value is exactly 0 are
/// listed in `missing_required_fields`. Zero is treated as missing even
/// though it can be a legitimate value (pre-revenue issuers), a known
/// trade-off acknowledged at the caller level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialSnapshot {
    /// Reporting period end (YYYY-MM-DD), derived from the contexts
    pub fiscal_year_end: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filing_date: String,
    /// "FY" for a 10-K, "Q1".."Q4" for a 10-Q
    pub fiscal_period: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub form_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub company_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cik: String,

    pub missing_required_fields: Vec<String>,

    // Balance sheet - assets (instant)
    pub cash: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub prepaid_expenses: f64,
    pub property_plant_equipment: f64,
    pub intangible_assets: f64,
    pub goodwill: f64,
    pub total_assets: f64,

    // Balance sheet - liabilities (instant)
    pub short_term_debt: f64,
    pub long_term_debt: f64,
    /// Short-term + long-term
    pub total_debt: f64,
    pub accounts_payable: f64,
    pub accrued_liabilities: f64,
    pub deferred_revenue: f64,
    pub total_liabilities: f64,

    // Balance sheet - equity (instant)
    pub stockholders_equity: f64,
    pub accumulated_deficit: f64,
    pub common_stock_shares_outstanding: f64,

    // Income statement (duration)
    pub revenue: f64,
    pub cost_of_revenue: f64,
    pub gross_profit: f64,
    pub rd_expense: f64,
    pub ga_expense: f64,
    pub selling_marketing_expense: f64,
    pub total_operating_expenses: f64,
    pub operating_income: f64,
    pub interest_expense: f64,
    pub income_tax_expense: f64,
    pub net_income: f64,

    // Per-share metrics (duration)
    pub basic_shares: f64,
    pub diluted_shares: f64,
    pub eps_basic: f64,
    pub eps_diluted: f64,

    // Cash flow statement (duration)
    pub cash_flow_operations: f64,
    pub cash_flow_investing: f64,
    pub cash_flow_financing: f64,
    pub capital_expenditures: f64,

    // Non-cash items (duration)
    pub depreciation_amortization: f64,
    pub stock_based_compensation: f64,
}

impl FinancialSnapshot {
    /// Snapshot value for a standardized label; `None` for labels outside the
    /// fixed schema.
    fn value_for_label(&self, label: &str) -> Option<f64> {
        match label {
            "Cash and Cash Equivalents" => Some(self.cash),
            "Accounts Receivable" => Some(self.accounts_receivable),
            "Inventory" => Some(self.inventory),
            "Prepaid Expenses" => Some(self.prepaid_expenses),
            "Property Plant and Equipment" => Some(self.property_plant_equipment),
            "Intangible Assets" => Some(self.intangible_assets),
            "Goodwill" => Some(self.goodwill),
            "Total Assets" => Some(self.total_assets),
            "Short-Term Debt" => Some(self.short_term_debt),
            "Long-Term Debt" => Some(self.long_term_debt),
            "Accounts Payable" => Some(self.accounts_payable),
            "Accrued Liabilities" => Some(self.accrued_liabilities),
            "Deferred Revenue" => Some(self.deferred_revenue),
            "Total Liabilities" => Some(self.total_liabilities),
            "Stockholders Equity" => Some(self.stockholders_equity),
            "Accumulated Deficit" => Some(self.accumulated_deficit),
            "Common Stock Shares Outstanding" => Some(self.common_stock_shares_outstanding),
            "Revenue" => Some(self.revenue),
            "Cost of Revenue" => Some(self.cost_of_revenue),
            "Gross Profit" => Some(self.gross_profit),
            "Research and Development Expense" => Some(self.rd_expense),
            "General and Administrative Expense" => Some(self.ga_expense),
            "Selling and Marketing Expense" => Some(self.selling_marketing_expense),
            "Total Operating Expenses" => Some(self.total_operating_expenses),
            "Operating Income (Loss)" => Some(self.operating_income),
            "Interest Expense" => Some(self.interest_expense),
            "Income Tax Expense" => Some(self.income_tax_expense),
            "Net Income (Loss)" => Some(self.net_income),
            "Shares Outstanding (Basic)" => Some(self.basic_shares),
            "Shares Outstanding (Diluted)" => Some(self.diluted_shares),
            "EPS Basic" => Some(self.eps_basic),
            "EPS Diluted" => Some(self.eps_diluted),
            "Cash Flow from Operations" => Some(self.cash_flow_operations),
            "Cash Flow from Investing" => Some(self.cash_flow_investing),
            "Cash Flow from Financing" => Some(self.cash_flow_financing),
            "Capital Expenditures" => Some(self.capital_expenditures),
            "Depreciation and Amortization" => Some(self.depreciation_amortization),
            "Stock-Based Compensation" => Some(self.stock_based_compensation),
            _ => None,
        }
    }
}

impl Xbrl {
    /// Builds the fixed-field snapshot for the most recent period.
    pub fn snapshot(&self) -> FinancialSnapshot {
        let mut snapshot = FinancialSnapshot::default();

        self.extract_dei_metadata(&mut snapshot);

        if let Some(fiscal_year_end) = self.fiscal_year_end() {
            snapshot.fiscal_year_end = fiscal_year_end.format("%Y-%m-%d").to_string();
        }

        let instant = |label: &str| -> f64 {
            self.query()
                .by_label(label)
                .instant_only()
                .most_recent()
                .and_then(|f| f.as_number())
                .unwrap_or(0.0)
        };

        let duration = |label: &str| -> f64 {
            self.query()
                .by_label(label)
                .duration_only()
                .most_recent()
                .and_then(|f| f.as_number())
                .unwrap_or(0.0)
        };

        snapshot.cash = instant("Cash and Cash Equivalents");
        snapshot.accounts_receivable = instant("Accounts Receivable");
        snapshot.inventory = instant("Inventory");
        snapshot.prepaid_expenses = instant("Prepaid Expenses");
        snapshot.property_plant_equipment = instant("Property Plant and Equipment");
        snapshot.intangible_assets = instant("Intangible Assets");
        snapshot.goodwill = instant("Goodwill");
        snapshot.total_assets = instant("Total Assets");

        snapshot.short_term_debt = instant("Short-Term Debt");
        snapshot.long_term_debt = instant("Long-Term Debt");
        snapshot.total_debt = snapshot.short_term_debt + snapshot.long_term_debt;
        snapshot.accounts_payable = instant("Accounts Payable");
        snapshot.accrued_liabilities = instant("Accrued Liabilities");
        snapshot.deferred_revenue = instant("Deferred Revenue");
        snapshot.total_liabilities = instant("Total Liabilities");

        snapshot.stockholders_equity = instant("Stockholders Equity");
        snapshot.accumulated_deficit = instant("Accumulated Deficit");
        snapshot.common_stock_shares_outstanding = instant("Common Stock Shares Outstanding");

        snapshot.revenue = duration("Revenue");
        snapshot.cost_of_revenue = duration("Cost of Revenue");
        snapshot.gross_profit = duration("Gross Profit");
        snapshot.rd_expense = duration("Research and Development Expense");
        snapshot.ga_expense = duration("General and Administrative Expense");
        snapshot.selling_marketing_expense = duration("Selling and Marketing Expense");
        snapshot.total_operating_expenses = duration("Total Operating Expenses");
        snapshot.operating_income = duration("Operating Income (Loss)");
        snapshot.interest_expense = duration("Interest Expense");
        snapshot.income_tax_expense = duration("Income Tax Expense");
        snapshot.net_income = duration("Net Income (Loss)");

        snapshot.basic_shares = duration("Shares Outstanding (Basic)");
        snapshot.diluted_shares = duration("Shares Outstanding (Diluted)");
        snapshot.eps_basic = duration("EPS Basic");
        snapshot.eps_diluted = duration("EPS Diluted");

        snapshot.cash_flow_operations = duration("Cash Flow from Operations");
        snapshot.cash_flow_investing = duration("Cash Flow from Investing");
        snapshot.cash_flow_financing = duration("Cash Flow from Financing");
        snapshot.capital_expenditures = duration("Capital Expenditures");

        snapshot.depreciation_amortization = duration("Depreciation and Amortization");
        snapshot.stock_based_compensation = duration("Stock-Based Compensation");

        snapshot.missing_required_fields = validate_required_fields(&snapshot);

        snapshot
    }

    /// Document and entity information from the DEI facts.
    fn extract_dei_metadata(&self, snapshot: &mut FinancialSnapshot) {
        for fact in &self.facts {
            match fact.concept.as_str() {
                "dei:EntityRegistrantName" => snapshot.company_name = fact.value.clone(),
                "dei:EntityCentralIndexKey" => snapshot.cik = fact.value.clone(),
                "dei:DocumentFiscalPeriodFocus" => snapshot.fiscal_period = fact.value.clone(),
                "dei:DocumentType" => snapshot.form_type = fact.value.clone(),
                _ => {}
            }
        }
    }

    /// The reporting period end: the latest end date among duration contexts
    /// spanning an annual (300-400 day) or quarterly (80-100 day) period.
    fn fiscal_year_end(&self) -> Option<NaiveDate> {
        let mut latest: Option<NaiveDate> = None;

        for ctx in &self.contexts {
            let (start, end) = match &ctx.period {
                Some(Period::Duration {
                    start_date,
                    end_date,
                }) => (start_date, end_date),
                _ => continue,
            };

            let start = match NaiveDate::parse_from_str(start, "%Y-%m-%d") {
                Ok(d) => d,
                Err(_) => continue,
            };
            let end = match NaiveDate::parse_from_str(end, "%Y-%m-%d") {
                Ok(d) => d,
                Err(_) => continue,
            };

            let days = (end - start).num_days();
            let annual = (300..=400).contains(&days);
            let quarterly = (80..=100).contains(&days);

            if (annual || quarterly) && latest.map(|l| end > l).unwrap_or(true) {
                latest = Some(end);
            }
        }

        latest
    }
}

/// Required labels whose extracted value equals 0, sorted.
fn validate_required_fields(snapshot: &FinancialSnapshot) -> Vec<String> {
    concepts::required_labels()
        .into_iter()
        .filter(|label| snapshot.value_for_label(label) == Some(0.0))
        .map(String::from)
        .collect()
}
