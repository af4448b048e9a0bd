//! Result types produced by the paystub pipeline.
//!
//! Everything here is built bottom-up by the pipeline stages and never
//! mutated afterwards. [`PaystubRecord`] is the aggregate root handed to the
//! CSV writer; [`PaystubOutput`] wraps it together with the non-fatal
//! diagnostics and timing stats returned by the per-document entry points.

use crate::error::Diagnostic;
use crate::money::format_amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ── Sections ─────────────────────────────────────────────────────────────

/// The paystub block a line item was read from.
///
/// The declaration order is the output order of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Earning,
    Deduction,
    Distribution,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Earning => "earning",
            Section::Deduction => "deduction",
            Section::Distribution => "distribution",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Header ───────────────────────────────────────────────────────────────

/// Metadata read from the top of a paystub by the layout classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaystubHeader {
    pub pay_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Payroll provider's unique identifier for this stub.
    pub advice_number: String,
    pub is_vest_event: bool,
}

// ── Line items ───────────────────────────────────────────────────────────

/// One earnings, deduction or distribution entry as printed on the stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub raw_label: String,
    /// Current-period amount with the sign printed on the stub.
    pub amount: Decimal,
    /// Year-to-date amount when the section carries a YTD column.
    pub ytd: Option<Decimal>,
    pub section: Section,
    /// 1-based page the line was found on.
    pub page: usize,
    /// 1-based row within that page.
    pub row: usize,
    /// The normalised line text, kept for the Original Description column.
    pub raw_text: String,
}

/// Totals printed on the stub itself ("Gross Pay", "Net Pay").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatedTotals {
    pub gross: Option<Decimal>,
    pub net: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Credit for non-negative amounts, debit for negative ones.
    pub fn for_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item after category mapping and sign normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub item: LineItem,
    /// Signed amount: earnings as printed, deductions and distributions
    /// always negative.
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub account_name: String,
    pub transaction_type: TransactionType,
}

impl ClassifiedTransaction {
    pub fn section(&self) -> Section {
        self.item.section
    }
}

// ── Validation ───────────────────────────────────────────────────────────

/// Outcome of the gross/net/deduction arithmetic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
    /// Sum of deductions as a positive magnitude.
    pub total_deductions: Decimal,
    /// Sum of distributions as a positive magnitude.
    pub total_distributions: Decimal,
    pub stated_gross: Option<Decimal>,
    pub balanced: bool,
    /// gross − net − deductions.
    pub discrepancy: Decimal,
}

// ── Output rows ──────────────────────────────────────────────────────────

/// One CSV row. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Original Description")]
    pub original_description: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Transaction Type")]
    pub transaction_type: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Account Name")]
    pub account_name: String,
    #[serde(rename = "Labels")]
    pub labels: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// CSV header, in column order.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "Date",
    "Description",
    "Original Description",
    "Amount",
    "Transaction Type",
    "Category",
    "Account Name",
    "Labels",
    "Notes",
];

/// Content key a consuming system can use to skip re-imported rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DedupKey {
    pub advice_number: String,
    pub date: NaiveDate,
    pub amount: String,
    pub description: String,
}

// ── Aggregate root ───────────────────────────────────────────────────────

/// A fully processed paystub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaystubRecord {
    pub header: PaystubHeader,
    pub gross_pay: Decimal,
    pub net_pay: Decimal,
    /// Earnings, then deductions, then distributions; each in parse order.
    pub transactions: Vec<ClassifiedTransaction>,
    pub validation: ValidationResult,
    /// One row per transaction, same order.
    pub rows: Vec<OutputRow>,
}

impl PaystubRecord {
    pub fn transactions_in(&self, section: Section) -> impl Iterator<Item = &ClassifiedTransaction> {
        self.transactions.iter().filter(move |t| t.section() == section)
    }

    pub fn dedup_keys(&self) -> Vec<DedupKey> {
        self.transactions
            .iter()
            .map(|t| DedupKey {
                advice_number: self.header.advice_number.clone(),
                date: self.header.pay_date,
                amount: format_amount(t.amount),
                description: t.description.clone(),
            })
            .collect()
    }

    /// File name used when writing this record into an output directory.
    pub fn file_name(&self) -> String {
        let advice: String = self
            .header
            .advice_number
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{}.csv", self.header.pay_date.format("%Y-%m-%d"), advice)
    }
}

/// Timing and volume stats for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub pages: usize,
    pub lines: usize,
    pub line_items: usize,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What the per-document entry points return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystubOutput {
    pub record: PaystubRecord,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: DocumentStats,
}

impl PaystubOutput {
    pub fn is_balanced(&self) -> bool {
        self.record.validation.balanced
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Structure summary returned by [`crate::convert::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub pages: usize,
    pub lines: usize,
    pub sample_lines: Vec<String>,
    pub patterns: KeyPatterns,
}

/// Which landmark patterns were seen while inspecting a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPatterns {
    pub pay_date: bool,
    pub earnings: bool,
    pub deductions: bool,
    pub net_pay: bool,
    pub rsu_vest: bool,
    pub advice_number: bool,
}

/// Outcome for one document of a batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub result: Result<PaystubOutput, crate::error::PaystubError>,
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub processed: usize,
    pub failed: usize,
    pub unbalanced: usize,
    pub warnings: usize,
    pub total_duration_ms: u64,
}

/// Everything [`crate::convert::process_batch`] returns, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: BatchStats,
}
