//! Balance validation: gross − net − deductions must come out at zero.
//!
//! Failures never abort processing; they become diagnostics next to the
//! record and `balanced = false` on the [`ValidationResult`]. Callers that
//! need hard failure (the CLI's `--strict`) escalate on that flag.

use crate::error::Diagnostic;
use crate::output::{ClassifiedTransaction, Section, StatedTotals, ValidationResult};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Compute totals for one document and check them against each other.
pub fn validate(
    transactions: &[ClassifiedTransaction],
    stated: &StatedTotals,
    tolerance: Decimal,
    diagnostics: &mut Vec<Diagnostic>,
) -> ValidationResult {
    let sum = |section: Section| -> Decimal {
        transactions
            .iter()
            .filter(|t| t.section() == section)
            .map(|t| t.amount)
            .sum()
    };
    let has_distributions = transactions.iter().any(|t| t.section() == Section::Distribution);

    let gross_pay = sum(Section::Earning);
    let total_deductions = -sum(Section::Deduction);
    let total_distributions = -sum(Section::Distribution);

    let net_pay = match stated.net {
        Some(net) => net,
        None if has_distributions => total_distributions,
        None => gross_pay - total_deductions,
    };

    let discrepancy = gross_pay - net_pay - total_deductions;
    let mut balanced = true;

    if discrepancy.abs() > tolerance {
        warn!(%gross_pay, %net_pay, %total_deductions, %discrepancy, "balance mismatch");
        diagnostics.push(Diagnostic::BalanceMismatch {
            gross: gross_pay,
            net: net_pay,
            deductions: total_deductions,
            discrepancy,
        });
        balanced = false;
    }

    if let Some(stated_gross) = stated.gross {
        if (stated_gross - gross_pay).abs() > tolerance {
            warn!(%stated_gross, computed = %gross_pay, "stated gross differs");
            diagnostics.push(Diagnostic::GrossMismatch {
                stated: stated_gross,
                computed: gross_pay,
            });
            balanced = false;
        }
    }

    if has_distributions && (total_distributions - net_pay).abs() > tolerance {
        warn!(%net_pay, distributed = %total_distributions, "distributions differ from net pay");
        diagnostics.push(Diagnostic::DistributionMismatch {
            net: net_pay,
            distributed: total_distributions,
        });
        balanced = false;
    }

    debug!(balanced, %discrepancy, "validated");
    ValidationResult {
        gross_pay,
        net_pay,
        total_deductions,
        total_distributions,
        stated_gross: stated.gross,
        balanced,
        discrepancy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{LineItem, TransactionType};
    use rust_decimal_macros::dec;

    fn tx(section: Section, amount: Decimal) -> ClassifiedTransaction {
        ClassifiedTransaction {
            item: LineItem {
                raw_label: "x".into(),
                amount: amount.abs(),
                ytd: None,
                section,
                page: 1,
                row: 1,
                raw_text: "x".into(),
            },
            amount,
            description: "x".into(),
            category: "x".into(),
            account_name: "Primary Checking".into(),
            transaction_type: TransactionType::for_amount(amount),
        }
    }

    #[test]
    fn regular_stub_balances() {
        let txs = vec![
            tx(Section::Earning, dec!(5000.00)),
            tx(Section::Deduction, dec!(-1200.00)),
            tx(Section::Deduction, dec!(-500.00)),
        ];
        let stated = StatedTotals {
            gross: Some(dec!(5000.00)),
            net: Some(dec!(3300.00)),
        };
        let mut diags = Vec::new();
        let v = validate(&txs, &stated, dec!(0.01), &mut diags);
        assert!(v.balanced);
        assert_eq!(v.gross_pay, dec!(5000.00));
        assert_eq!(v.total_deductions, dec!(1700.00));
        assert_eq!(v.discrepancy, dec!(0.00));
        assert!(diags.is_empty());
    }

    #[test]
    fn mismatch_beyond_tolerance_is_reported() {
        let txs = vec![
            tx(Section::Earning, dec!(5000.00)),
            tx(Section::Deduction, dec!(-1200.00)),
        ];
        let stated = StatedTotals {
            gross: None,
            net: Some(dec!(3300.00)),
        };
        let mut diags = Vec::new();
        let v = validate(&txs, &stated, dec!(0.01), &mut diags);
        assert!(!v.balanced);
        assert_eq!(v.discrepancy, dec!(500.00));
        assert!(matches!(diags[0], Diagnostic::BalanceMismatch { .. }));
    }

    #[test]
    fn rounding_within_tolerance_balances() {
        let txs = vec![
            tx(Section::Earning, dec!(1000.00)),
            tx(Section::Deduction, dec!(-100.01)),
        ];
        let stated = StatedTotals {
            gross: None,
            net: Some(dec!(900.00)),
        };
        let mut diags = Vec::new();
        assert!(validate(&txs, &stated, dec!(0.01), &mut diags).balanced);
        assert!(!validate(&txs, &stated, dec!(0.00), &mut diags).balanced);
    }

    #[test]
    fn net_falls_back_to_distributions_then_arithmetic() {
        let with_deposits = vec![
            tx(Section::Earning, dec!(1000.00)),
            tx(Section::Deduction, dec!(-200.00)),
            tx(Section::Distribution, dec!(-800.00)),
        ];
        let mut diags = Vec::new();
        let v = validate(&with_deposits, &StatedTotals::default(), dec!(0.01), &mut diags);
        assert_eq!(v.net_pay, dec!(800.00));
        assert_eq!(v.total_distributions, dec!(800.00));
        assert!(v.balanced);

        let v = validate(&with_deposits[..2], &StatedTotals::default(), dec!(0.01), &mut diags);
        assert_eq!(v.net_pay, dec!(800.00));
        assert!(v.balanced);
        assert!(diags.is_empty());
    }

    #[test]
    fn stated_gross_and_deposit_mismatches_flag() {
        let txs = vec![
            tx(Section::Earning, dec!(1000.00)),
            tx(Section::Deduction, dec!(-200.00)),
            tx(Section::Distribution, dec!(-700.00)),
        ];
        let stated = StatedTotals {
            gross: Some(dec!(1100.00)),
            net: Some(dec!(800.00)),
        };
        let mut diags = Vec::new();
        let v = validate(&txs, &stated, dec!(0.01), &mut diags);
        assert!(!v.balanced);
        assert_eq!(diags.len(), 2);
        assert!(matches!(diags[0], Diagnostic::GrossMismatch { .. }));
        assert!(matches!(diags[1], Diagnostic::DistributionMismatch { .. }));
    }

    #[test]
    fn fully_offset_vest_balances_at_zero_net() {
        let txs = vec![
            tx(Section::Earning, dec!(10000.00)),
            tx(Section::Deduction, dec!(-2200.00)),
            tx(Section::Deduction, dec!(-7800.00)),
        ];
        let stated = StatedTotals {
            gross: Some(dec!(10000.00)),
            net: Some(dec!(0.00)),
        };
        let mut diags = Vec::new();
        let v = validate(&txs, &stated, dec!(0.01), &mut diags);
        assert!(v.balanced);
        assert_eq!(v.net_pay, dec!(0.00));
    }
}
