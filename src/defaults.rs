//! Built-in category mapping table.
//!
//! Covers the labels printed by the supported ADP-style templates. Callers
//! replace it wholesale through the `mappings` key of a settings file;
//! [`default_mappings_json`] dumps this table as a starting point.

use crate::output::Section;
use crate::pipeline::categorize::{MappingRule, MappingTable, MatchKind, DEFAULT_CATEGORY};

fn rule(pattern: &str, kind: MatchKind, category: &str, description: &str) -> MappingRule {
    MappingRule {
        pattern: pattern.to_string(),
        kind,
        section: None,
        category: category.to_string(),
        description: Some(description.to_string()),
        account: None,
    }
}

fn in_section(mut rule: MappingRule, section: Section) -> MappingRule {
    rule.section = Some(section);
    rule
}

/// Rules applied to every stub.
fn regular_rules() -> Vec<MappingRule> {
    use MatchKind::*;
    vec![
        // Earnings
        in_section(
            rule("Regular", Exact, "Income:Salary", "Regular salary income"),
            Section::Earning,
        ),
        rule("Flex/Pto", Prefix, "Income:PTO", "Flexible PTO pay"),
        rule("Holiday Pay", Prefix, "Income:Holiday Pay", "Holiday pay"),
        rule("Stnd Pto Pay", Prefix, "Income:PTO", "Standard PTO pay"),
        rule("Std Pto Pay", Prefix, "Income:PTO", "Standard PTO pay"),
        rule("Bonus", Substring, "Income:Bonus", "Bonus"),
        rule("Overtime", Prefix, "Income:Overtime", "Overtime pay"),
        rule("Imputed Income", Prefix, "Income:Imputed Income", "Imputed income"),
        rule("Rsu Vest", Prefix, "Income:Stock Compensation", "RSU vest income"),
        // Statutory
        rule(
            "Federal Income Tax",
            Exact,
            "Taxes:Federal Income Tax",
            "Federal income tax withholding",
        ),
        rule("Medicare Surtax", Exact, "Taxes:Medicare", "Medicare surtax"),
        rule("Medicare Tax", Exact, "Taxes:Medicare", "Medicare tax"),
        rule("Social Security Tax", Exact, "Taxes:Social Security", "Social Security tax"),
        rule("WA Paid Family Leave", Prefix, "Taxes:State Leave", "WA paid family leave"),
        rule("WA Paid Medical Leave", Prefix, "Taxes:State Leave", "WA paid medical leave"),
        rule("State Income Tax", Substring, "Taxes:State Income Tax", "State income tax withholding"),
        // Retirement
        rule(
            "401K-Trad",
            Prefix,
            "Transfer:401k Traditional",
            "401k traditional contribution",
        ),
        rule("401K After Tax", Prefix, "Transfer:401k After Tax", "401k after-tax contribution"),
        rule("401K Roth", Prefix, "Transfer:401k Roth", "401k Roth contribution"),
        // Healthcare
        rule("Hsa", Exact, "Transfer:HSA", "HSA contribution"),
        rule("Pre-Tax Medical", Prefix, "Insurance:Medical", "Pre-tax medical premium"),
        rule("Pre-Tax Dental", Prefix, "Insurance:Dental", "Pre-tax dental premium"),
        rule("Pre-Tax Vision", Prefix, "Insurance:Vision", "Pre-tax vision premium"),
        // Insurance and other
        rule("Groupterm Life", Prefix, "Insurance:Life", "Group term life"),
        rule("Supp Life Ins", Prefix, "Insurance:Life", "Supplemental life insurance"),
        rule("Supp Ad/D", Prefix, "Insurance:AD&D", "Supplemental AD&D"),
        rule("Critic Illness", Prefix, "Insurance:Critical Illness", "Critical illness insurance"),
        rule("Oc Park Charge", Prefix, "Transportation:Parking", "Parking charge"),
        // Distribution
        in_section(
            rule("Checking Acct", Prefix, "Transfer:Direct Deposit", "Direct deposit to checking"),
            Section::Distribution,
        ),
        in_section(
            rule("Savings Acct", Prefix, "Transfer:Direct Deposit", "Direct deposit to savings"),
            Section::Distribution,
        ),
        in_section(
            rule("Net Check", Prefix, "Transfer:Direct Deposit", "Net check"),
            Section::Distribution,
        ),
    ]
}

/// Rules consulted first on vest stubs.
fn rsu_rules() -> Vec<MappingRule> {
    use MatchKind::*;
    vec![
        rule("Rsu Vest", Prefix, "Income:Stock Compensation", "RSU vest income"),
        rule("Stock Vest", Prefix, "Income:Stock Compensation", "Stock vest income"),
        rule(
            "Federal Income Tax",
            Exact,
            "Taxes:RSU Federal Income Tax",
            "Federal income tax withheld on RSU vest",
        ),
        rule("Medicare Tax", Exact, "Taxes:RSU Medicare", "Medicare tax withheld on RSU vest"),
        rule("Medicare Surtax", Exact, "Taxes:RSU Medicare", "Medicare surtax on RSU vest"),
        rule(
            "Social Security Tax",
            Exact,
            "Taxes:RSU Social Security",
            "Social Security tax withheld on RSU vest",
        ),
        rule("Rsu Stock Offset", Prefix, "Transfer:RSU Shares", "RSU shares delivered"),
        rule("Stock Offset", Substring, "Transfer:RSU Shares", "RSU shares delivered"),
        rule("Rsu Refund", Prefix, "Income:Stock Compensation", "RSU excess withholding refund"),
    ]
}

/// The built-in mapping table.
pub fn default_mapping_table() -> MappingTable {
    MappingTable {
        default_category: DEFAULT_CATEGORY.to_string(),
        regular: regular_rules(),
        rsu: rsu_rules(),
    }
}

/// The built-in table as pretty JSON, in the settings-file `mappings` shape.
pub fn default_mappings_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&default_mapping_table())
}
