//! Line-item parsing: segment the document into earnings, deduction and
//! distribution entries.
//!
//! The parser walks lines in reading order with a single "current section"
//! state. Section behaviour comes from an ordered table of [`SectionRule`]s
//! (marker regex, line regex, field extractor, YTD flag, requirement), so a
//! new template variant is a new rule rather than new control flow.
//!
//! Per line, first match wins:
//!
//! 1. ignored headings ("Earnings Statement")
//! 2. section markers: switch the current section
//! 3. summary totals ("Gross Pay", "Net Pay"): record and close the section
//! 4. terminators: close the section
//! 5. inside a section: skip "Total ..." lines, then apply the line regex;
//!    unmatched lines with digits become [`Diagnostic::UnparsedLine`]

use crate::config::ProcessingConfig;
use crate::error::{Diagnostic, PaystubError};
use crate::money::{find_amounts, MONEY_TOKEN};
use crate::output::{LineItem, PaystubHeader, Section, StatedTotals};
use crate::pipeline::extract::{Document, TextLine};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::{debug, warn};

// ── Patterns ─────────────────────────────────────────────────────────────

static RE_EARNINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^earnings\b").unwrap());
static RE_DEDUCTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^deductions\b").unwrap());
static RE_DISTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:net\s+pay\s+distribution|distribution|deposits)\b").unwrap()
});

/// Label followed by one or more money tokens, up to end of line.
static RE_ITEM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<label>.*?[A-Za-z].*?)(?P<amounts>(?:\s+{MONEY_TOKEN})+)\s*$"
    ))
    .unwrap()
});

static RE_GROSS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^gross\s+pay\b(?P<rest>.*)$").unwrap());
static RE_NET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^net\s+pay\b(?P<rest>.*)$").unwrap());

static RE_IGNORED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:earnings\s+statement|deductions\s+statement)\b").unwrap());

static RE_TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:other\s+benefits|important\s+notes|federal\s+taxable\s+wages|taxable\s+marital\s+status|exemptions|benefits\s+information|your\s+federal\s+taxable)\b",
    )
    .unwrap()
});

static RE_TOTAL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:total|sub\s*-?\s*total)\b").unwrap());

/// Non-money trailing tokens stripped from labels: rates, hours and masked
/// account numbers.
static RE_TRAILING_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:-?[\d,]*\.?\d+|[xX*]+\d+)$").unwrap());

// ── Rules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing marker or no recognised line fails the document.
    Required,
    /// May be absent; present but empty still fails.
    Optional,
}

/// Label and amount tokens pulled from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFields {
    pub label: String,
    pub amounts: Vec<Decimal>,
}

/// Field extractor signature.
pub type Extractor = fn(&Captures<'_>) -> Option<LineFields>;

/// How one section is recognised and read.
#[derive(Debug, Clone)]
pub struct SectionRule {
    pub section: Section,
    pub marker: &'static Regex,
    pub line: &'static Regex,
    pub extractor: Extractor,
    pub has_ytd_column: bool,
    pub requirement: Requirement,
}

/// The rule table for a configuration, in evaluation order.
pub fn section_rules(config: &ProcessingConfig) -> Vec<SectionRule> {
    vec![
        SectionRule {
            section: Section::Distribution,
            marker: &RE_DISTRIBUTION,
            line: &RE_ITEM_LINE,
            extractor: deposit_fields,
            has_ytd_column: false,
            requirement: Requirement::Optional,
        },
        SectionRule {
            section: Section::Earning,
            marker: &RE_EARNINGS,
            line: &RE_ITEM_LINE,
            extractor: label_and_amounts,
            has_ytd_column: config.ytd_columns,
            requirement: Requirement::Required,
        },
        SectionRule {
            section: Section::Deduction,
            marker: &RE_DEDUCTIONS,
            line: &RE_ITEM_LINE,
            extractor: label_and_amounts,
            has_ytd_column: config.ytd_columns,
            requirement: Requirement::Required,
        },
    ]
}

fn label_and_amounts(caps: &Captures<'_>) -> Option<LineFields> {
    let label = strip_trailing_noise(caps.name("label")?.as_str());
    let amounts = find_amounts(caps.name("amounts")?.as_str());
    if label.is_empty() || amounts.is_empty() || !label.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    Some(LineFields { label, amounts })
}

/// Deposit lines carry masked account numbers between label and amount.
fn deposit_fields(caps: &Captures<'_>) -> Option<LineFields> {
    let mut fields = label_and_amounts(caps)?;
    fields.label = fields
        .label
        .split_whitespace()
        .filter(|t| !t.contains(['x', 'X', '*']) || !t.chars().any(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ");
    Some(fields)
}

fn strip_trailing_noise(label: &str) -> String {
    let mut tokens: Vec<&str> = label.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| RE_TRAILING_NOISE.is_match(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

// ── Parsing ──────────────────────────────────────────────────────────────

/// Everything the parser read from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItems {
    /// Items in reading order.
    pub items: Vec<LineItem>,
    pub stated: StatedTotals,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SectionState {
    seen: bool,
    recognized: usize,
}

/// Segment the document into typed line items.
///
/// # Errors
/// [`PaystubError::SectionParse`] when a required section is missing or
/// has no recognised line, or an optional section's marker is followed by
/// nothing recognisable.
pub fn parse_items(
    document: &Document,
    header: &PaystubHeader,
    config: &ProcessingConfig,
) -> Result<ParsedItems, PaystubError> {
    let rules = section_rules(config);
    let mut states = vec![SectionState::default(); rules.len()];
    let mut current: Option<usize> = None;
    let mut out = ParsedItems::default();

    for line in &document.lines {
        let text = line.text.as_str();

        if RE_IGNORED.is_match(text) {
            continue;
        }

        if let Some(idx) = rules.iter().position(|r| r.marker.is_match(text)) {
            debug!(page = line.page, row = line.row, section = %rules[idx].section, "section start");
            states[idx].seen = true;
            current = Some(idx);
            continue;
        }

        if record_total(line, &mut out.stated, config.ytd_columns) {
            current = None;
            continue;
        }

        if RE_TERMINATOR.is_match(text) {
            current = None;
            continue;
        }

        let Some(idx) = current else {
            continue;
        };
        let rule = &rules[idx];

        if RE_TOTAL_LINE.is_match(text) {
            debug!(page = line.page, row = line.row, "skipping total line");
            continue;
        }

        let fields = rule.line.captures(text).and_then(|caps| (rule.extractor)(&caps));
        match fields {
            Some(fields) => {
                states[idx].recognized += 1;
                if let Some(item) = build_item(rule, line, fields) {
                    out.items.push(item);
                }
            }
            None if text.chars().any(|c| c.is_ascii_digit()) => {
                warn!(page = line.page, row = line.row, section = %rule.section, "unparsed line: {}", text);
                out.diagnostics.push(Diagnostic::UnparsedLine {
                    section: rule.section,
                    page: line.page,
                    row: line.row,
                    text: text.to_string(),
                });
            }
            None => debug!(page = line.page, row = line.row, "sub-heading: {}", text),
        }
    }

    for (rule, state) in rules.iter().zip(&states) {
        let failed = match rule.requirement {
            Requirement::Required => !state.seen || state.recognized == 0,
            Requirement::Optional => state.seen && state.recognized == 0,
        };
        if failed {
            return Err(PaystubError::SectionParse {
                section: rule.section,
            });
        }
    }

    debug!(
        advice = %header.advice_number,
        items = out.items.len(),
        diagnostics = out.diagnostics.len(),
        "parsed line items"
    );
    Ok(out)
}

/// Record a Gross Pay / Net Pay line. Returns `false` when the line is not
/// a summary total.
fn record_total(line: &TextLine, stated: &mut StatedTotals, ytd: bool) -> bool {
    let (slot, rest) = if let Some(caps) = RE_GROSS.captures(&line.text) {
        (&mut stated.gross, caps.name("rest").map(|m| m.as_str()).unwrap_or(""))
    } else if let Some(caps) = RE_NET.captures(&line.text) {
        (&mut stated.net, caps.name("rest").map(|m| m.as_str()).unwrap_or(""))
    } else {
        return false;
    };

    let amounts = find_amounts(rest);
    let Some(current) = current_amount(&amounts, ytd).or_else(|| amounts.last().copied()) else {
        return false;
    };
    if slot.is_none() {
        *slot = Some(current);
    }
    true
}

/// The current-period amount: second-to-last token with a YTD column, last
/// token otherwise. `None` for a YTD-only line.
pub(crate) fn current_amount(amounts: &[Decimal], has_ytd_column: bool) -> Option<Decimal> {
    match (has_ytd_column, amounts.len()) {
        (_, 0) | (true, 1) => None,
        (true, n) => Some(amounts[n - 2]),
        (false, n) => Some(amounts[n - 1]),
    }
}

fn build_item(rule: &SectionRule, line: &TextLine, fields: LineFields) -> Option<LineItem> {
    let Some(amount) = current_amount(&fields.amounts, rule.has_ytd_column) else {
        debug!(page = line.page, row = line.row, "YTD-only line: {}", line.text);
        return None;
    };
    if amount.is_zero() {
        debug!(page = line.page, row = line.row, "zero current amount: {}", line.text);
        return None;
    }
    let ytd = if rule.has_ytd_column {
        fields.amounts.last().copied()
    } else {
        None
    };
    Some(LineItem {
        raw_label: fields.label,
        amount,
        ytd,
        section: rule.section,
        page: line.page,
        row: line.row,
        raw_text: line.text.clone(),
    })
}
