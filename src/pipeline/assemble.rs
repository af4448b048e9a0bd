//! Transaction assembly: build the immutable [`PaystubRecord`].
//!
//! One output row per transaction, no aggregation. Rows are ordered
//! earnings, deductions, distributions, each group keeping parse order, so
//! reprocessing the same stub yields byte-identical CSV.

use crate::config::ProcessingConfig;
use crate::money::format_amount;
use crate::output::{ClassifiedTransaction, OutputRow, PaystubHeader, PaystubRecord, ValidationResult};

/// Longest Original Description emitted, in characters.
pub const ORIGINAL_TEXT_LIMIT: usize = 100;

pub fn assemble(
    header: PaystubHeader,
    mut transactions: Vec<ClassifiedTransaction>,
    validation: ValidationResult,
    config: &ProcessingConfig,
) -> PaystubRecord {
    // Stable: parse order survives within a section.
    transactions.sort_by_key(|t| t.section());

    let notes = notes_for(&header);
    let labels = if config.emit_labels {
        labels_for(&header)
    } else {
        String::new()
    };
    let date = header.pay_date.format("%Y-%m-%d").to_string();

    let rows = transactions
        .iter()
        .map(|t| OutputRow {
            date: date.clone(),
            description: t.description.clone(),
            original_description: if config.include_original_text {
                t.item.raw_text.chars().take(ORIGINAL_TEXT_LIMIT).collect()
            } else {
                String::new()
            },
            amount: format_amount(t.amount),
            transaction_type: t.transaction_type.to_string(),
            category: t.category.clone(),
            account_name: t.account_name.clone(),
            labels: labels.clone(),
            notes: notes.clone(),
        })
        .collect();

    PaystubRecord {
        gross_pay: validation.gross_pay,
        net_pay: validation.net_pay,
        header,
        transactions,
        validation,
        rows,
    }
}

/// `Pay Date: … | Period: … to … | RSU Vesting Event | Advice: …`
pub fn notes_for(header: &PaystubHeader) -> String {
    let mut parts = vec![format!("Pay Date: {}", header.pay_date.format("%Y-%m-%d"))];
    if header.period_start != header.pay_date {
        parts.push(format!(
            "Period: {} to {}",
            header.period_start.format("%Y-%m-%d"),
            header.period_end.format("%Y-%m-%d")
        ));
    }
    if header.is_vest_event {
        parts.push("RSU Vesting Event".to_string());
    }
    parts.push(format!("Advice: {}", header.advice_number));
    parts.join(" | ")
}

/// `RSU,Payroll,Pay-YYYY-MM`, RSU only on vest stubs.
pub fn labels_for(header: &PaystubHeader) -> String {
    let mut labels = Vec::with_capacity(3);
    if header.is_vest_event {
        labels.push("RSU".to_string());
    }
    labels.push("Payroll".to_string());
    labels.push(format!("Pay-{}", header.pay_date.format("%Y-%m")));
    labels.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{LineItem, Section, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header(vest: bool) -> PaystubHeader {
        PaystubHeader {
            pay_date: ymd(2025, 8, 29),
            period_start: ymd(2025, 8, 16),
            period_end: ymd(2025, 8, 31),
            advice_number: "0000123456".into(),
            is_vest_event: vest,
        }
    }

    fn tx(label: &str, section: Section, amount: Decimal, row: usize) -> ClassifiedTransaction {
        ClassifiedTransaction {
            item: LineItem {
                raw_label: label.into(),
                amount,
                ytd: None,
                section,
                page: 1,
                row,
                raw_text: format!("{label} {amount}"),
            },
            amount,
            description: label.into(),
            category: "Cat".into(),
            account_name: "Primary Checking".into(),
            transaction_type: TransactionType::for_amount(amount),
        }
    }

    fn validation() -> ValidationResult {
        ValidationResult {
            gross_pay: dec!(5000.00),
            net_pay: dec!(3300.00),
            total_deductions: dec!(1700.00),
            total_distributions: dec!(0),
            stated_gross: None,
            balanced: true,
            discrepancy: dec!(0),
        }
    }

    #[test]
    fn rows_are_grouped_by_section_in_parse_order() {
        let txs = vec![
            tx("Fed", Section::Deduction, dec!(-1200.00), 5),
            tx("Regular", Section::Earning, dec!(5000.00), 3),
            tx("Checking", Section::Distribution, dec!(-3300.00), 9),
            tx("401k", Section::Deduction, dec!(-500.00), 7),
        ];
        let record = assemble(header(false), txs, validation(), &ProcessingConfig::default());
        let order: Vec<&str> = record.rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(order, vec!["Regular", "Fed", "401k", "Checking"]);
        assert_eq!(record.rows[1].amount, "-1200.00");
        assert_eq!(record.rows[1].transaction_type, "debit");
        assert_eq!(record.rows[0].date, "2025-08-29");
        assert!(record.rows.iter().all(|r| r.labels.is_empty() && r.original_description.is_empty()));
    }

    #[test]
    fn notes_carry_period_vest_and_advice() {
        assert_eq!(
            notes_for(&header(true)),
            "Pay Date: 2025-08-29 | Period: 2025-08-16 to 2025-08-31 | RSU Vesting Event | Advice: 0000123456"
        );
        let mut h = header(false);
        h.period_start = h.pay_date;
        assert_eq!(notes_for(&h), "Pay Date: 2025-08-29 | Advice: 0000123456");
    }

    #[test]
    fn optional_columns_follow_config() {
        let config = ProcessingConfig::builder()
            .emit_labels(true)
            .include_original_text(true)
            .build()
            .unwrap();
        let long = "A".repeat(150);
        let txs = vec![tx(&long, Section::Earning, dec!(1.00), 1)];
        let record = assemble(header(true), txs, validation(), &config);
        assert_eq!(record.rows[0].labels, "RSU,Payroll,Pay-2025-08");
        assert_eq!(record.rows[0].original_description.chars().count(), ORIGINAL_TEXT_LIMIT);
        assert_eq!(labels_for(&header(false)), "Payroll,Pay-2025-08");
    }
}
