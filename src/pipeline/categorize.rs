//! Category mapping: raw stub labels → category, description and account.
//!
//! The mapping table is an ordered-rule evaluator. Within one table an
//! exact rule always wins; otherwise the longest matching prefix or
//! substring pattern is chosen (prefix before substring on equal length,
//! then declaration order). Vest stubs consult the `rsu` table first and
//! fall back to `regular`, so the same label ("Federal Income Tax") can land
//! in a stock-compensation bucket on a vest stub and a salary bucket
//! otherwise.
//!
//! Sign normalisation happens here as well: earnings keep the sign printed
//! on the stub, deductions and distributions become `-|amount|`.

use crate::config::ProcessingConfig;
use crate::error::{Diagnostic, PaystubError};
use crate::output::{ClassifiedTransaction, LineItem, Section, TransactionType};
use crate::pipeline::normalize::normalize_line;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Exact,
    Prefix,
    Substring,
}

/// One row of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Compared against the normalised label; normalised the same way.
    pub pattern: String,
    #[serde(default)]
    pub kind: MatchKind,
    /// Restrict the rule to items of one section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    pub category: String,
    /// Output description; the raw label is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl MappingRule {
    fn applies_to(&self, section: Section) -> bool {
        self.section.is_none_or(|s| s == section)
    }
}

/// Ordered rule tables for regular and vest stubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default)]
    pub regular: Vec<MappingRule>,
    #[serde(default)]
    pub rsu: Vec<MappingRule>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            regular: Vec::new(),
            rsu: Vec::new(),
        }
    }
}

impl MappingTable {
    pub fn rule_count(&self) -> usize {
        self.regular.len() + self.rsu.len()
    }

    /// Reject rules that could never match or would emit empty columns.
    pub fn validate(&self) -> Result<(), PaystubError> {
        if self.default_category.trim().is_empty() {
            return Err(PaystubError::InvalidConfig(
                "mappings.default_category must not be empty".into(),
            ));
        }
        for (table, rules) in [("regular", &self.regular), ("rsu", &self.rsu)] {
            for (i, rule) in rules.iter().enumerate() {
                if normalize_label(&rule.pattern).is_empty() {
                    return Err(PaystubError::InvalidConfig(format!(
                        "mappings.{table}[{i}]: empty pattern"
                    )));
                }
                if rule.category.trim().is_empty() {
                    return Err(PaystubError::InvalidConfig(format!(
                        "mappings.{table}[{i}] ('{}'): empty category",
                        rule.pattern
                    )));
                }
            }
        }
        Ok(())
    }

    /// Find the rule for `label`, honouring the vest fallback order.
    pub fn lookup(&self, label: &str, section: Section, is_vest_event: bool) -> Option<&MappingRule> {
        let key = normalize_label(label);
        if is_vest_event {
            if let Some(rule) = best_match(&self.rsu, &key, section) {
                return Some(rule);
            }
        }
        best_match(&self.regular, &key, section)
    }
}

/// Clean like page text, then lowercase and collapse whitespace to one
/// space. Hand-edited mapping files often carry en dashes and NBSPs.
pub fn normalize_label(label: &str) -> String {
    normalize_line(label)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn best_match<'a>(rules: &'a [MappingRule], key: &str, section: Section) -> Option<&'a MappingRule> {
    let applicable = || rules.iter().filter(|r| r.applies_to(section));

    if let Some(rule) = applicable()
        .find(|r| r.kind == MatchKind::Exact && normalize_label(&r.pattern) == key)
    {
        return Some(rule);
    }

    // (rule, pattern length, kind rank)
    let mut best: Option<(&MappingRule, usize, u8)> = None;
    for rule in applicable() {
        let pattern = normalize_label(&rule.pattern);
        let rank = match rule.kind {
            MatchKind::Exact => continue,
            MatchKind::Prefix if key.starts_with(&pattern) => 0,
            MatchKind::Substring if key.contains(&pattern) => 1,
            _ => continue,
        };
        let len = pattern.chars().count();
        let better = match best {
            None => true,
            Some((_, best_len, best_rank)) => len > best_len || (len == best_len && rank < best_rank),
        };
        if better {
            best = Some((rule, len, rank));
        }
    }
    best.map(|(rule, _, _)| rule)
}

// ── Classification ───────────────────────────────────────────────────────

/// Map one line item. Returns the diagnostic raised for unmapped labels.
pub fn classify_item(
    item: LineItem,
    is_vest_event: bool,
    config: &ProcessingConfig,
) -> (ClassifiedTransaction, Option<Diagnostic>) {
    let key = normalize_label(&item.raw_label);
    let rule = config.mappings.lookup(&item.raw_label, item.section, is_vest_event);

    let (description, category, rule_account, diagnostic) = match rule {
        Some(rule) => {
            debug!(label = %item.raw_label, category = %rule.category, "mapped");
            (
                rule.description.clone().unwrap_or_else(|| item.raw_label.clone()),
                rule.category.clone(),
                rule.account.clone(),
                None,
            )
        }
        None => {
            let fallback = config.mappings.default_category.clone();
            warn!(
                section = %item.section,
                label = %item.raw_label,
                "no category mapping, using '{}'",
                fallback
            );
            let diagnostic = Diagnostic::UnmappedCategory {
                section: item.section,
                label: item.raw_label.clone(),
                fallback: fallback.clone(),
            };
            (item.raw_label.clone(), fallback, None, Some(diagnostic))
        }
    };

    let account_name = rule_account.unwrap_or_else(|| config.account_for(&key).to_string());
    let amount = match item.section {
        Section::Earning => item.amount,
        Section::Deduction | Section::Distribution => -item.amount.abs(),
    };

    let transaction = ClassifiedTransaction {
        amount,
        description,
        category,
        account_name,
        transaction_type: TransactionType::for_amount(amount),
        item,
    };
    (transaction, diagnostic)
}

/// Map every item, appending unmapped-label diagnostics.
pub fn classify_items(
    items: Vec<LineItem>,
    is_vest_event: bool,
    config: &ProcessingConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ClassifiedTransaction> {
    items
        .into_iter()
        .map(|item| {
            let (tx, diag) = classify_item(item, is_vest_event, config);
            diagnostics.extend(diag);
            tx
        })
        .collect()
}
