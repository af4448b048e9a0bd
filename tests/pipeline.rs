//! Integration tests over extracted-text fixtures.
//!
//! These run every stage after pdfium (classify → parse → categorize →
//! validate → assemble → CSV) through the public API, so they need neither
//! a pdfium library nor real paystubs.

use paystub2csv::writer::{
    render_csv, verify_csv, verify_csv_str, write_record_checked, write_record_to_dir,
};
use paystub2csv::{
    process_batch, process_text, Diagnostic, ErrorKind, PaystubError, ProcessingConfig, Section,
};
use rust_decimal_macros::dec;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

const HEADER: &str =
    "Date,Description,Original Description,Amount,Transaction Type,Category,Account Name,Labels,Notes";

#[test]
fn regular_stub_yields_the_three_expected_rows() {
    let out = process_text(&fixture("regular.txt"), &ProcessingConfig::default()).unwrap();
    let record = &out.record;

    assert!(!record.header.is_vest_event);
    assert_eq!(record.header.advice_number, "0000123456");
    assert!(out.is_balanced());
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(record.gross_pay, dec!(5000.00));
    assert_eq!(record.net_pay, dec!(3300.00));
    assert!(record.validation.discrepancy.abs() <= dec!(0.01));

    let notes = "Pay Date: 2025-08-29 | Period: 2025-08-16 to 2025-08-31 | Advice: 0000123456";
    let expected = format!(
        "{HEADER}\n\
2025-08-29,Regular salary income,,5000.00,credit,Income:Salary,Primary Checking,,{notes}\n\
2025-08-29,Federal income tax withholding,,-1200.00,debit,Taxes:Federal Income Tax,Primary Checking,,{notes}\n\
2025-08-29,401k traditional contribution,,-500.00,debit,Transfer:401k Traditional,Primary Checking,,{notes}\n"
    );
    assert_eq!(render_csv(record).unwrap(), expected);
}

#[test]
fn rsu_vest_is_detected_and_balances_at_zero_net() {
    let out = process_text(&fixture("rsu.txt"), &ProcessingConfig::default()).unwrap();
    let record = &out.record;

    assert!(record.header.is_vest_event);
    assert!(out.is_balanced(), "{:?}", out.diagnostics);
    assert_eq!(record.gross_pay, dec!(10000.00));
    assert_eq!(record.net_pay, dec!(0.00));
    assert_eq!(record.validation.total_deductions, dec!(10000.00));

    let earning = record.transactions_in(Section::Earning).next().unwrap();
    assert_eq!(earning.category, "Income:Stock Compensation");
    assert!(record.rows[0].notes.contains("RSU Vesting Event"));

    let offset = record
        .transactions
        .iter()
        .find(|t| t.item.raw_label == "Rsu Stock Offset")
        .unwrap();
    assert_eq!(offset.category, "Transfer:RSU Shares");
    assert_eq!(offset.amount, dec!(-7035.00));
}

#[test]
fn federal_tax_category_depends_on_stub_kind() {
    let config = ProcessingConfig::default();
    let federal = |name: &str| {
        let out = process_text(&fixture(name), &config).unwrap();
        out.record
            .transactions
            .iter()
            .find(|t| t.item.raw_label == "Federal Income Tax")
            .map(|t| t.category.clone())
            .unwrap()
    };
    let regular = federal("regular.txt");
    let vest = federal("rsu.txt");
    assert_eq!(regular, "Taxes:Federal Income Tax");
    assert_eq!(vest, "Taxes:RSU Federal Income Tax");
    assert_ne!(regular, vest);
}

#[test]
fn ytd_vest_history_keeps_a_regular_stub_regular() {
    let out = process_text(&fixture("regular_after_vest.txt"), &ProcessingConfig::default())
        .unwrap();
    let record = &out.record;

    assert!(!record.header.is_vest_event);
    assert!(out.is_balanced(), "{:?}", out.diagnostics);
    assert_eq!(record.gross_pay, dec!(5000.00));
    assert_eq!(record.rows.len(), 3);
    assert!(record.rows.iter().all(|r| !r.notes.contains("RSU Vesting Event")));

    let categories: Vec<&str> = record.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(
        categories,
        vec![
            "Income:Salary",
            "Taxes:Federal Income Tax",
            "Transfer:401k Traditional"
        ]
    );
}

#[test]
fn deposits_are_distributions_and_unmapped_labels_warn() {
    let config = ProcessingConfig::builder()
        .account_override("Savings Acct", "Emergency Fund")
        .emit_labels(true)
        .build()
        .unwrap();
    let out = process_text(&fixture("deposits.txt"), &config).unwrap();
    let record = &out.record;

    assert!(out.is_balanced(), "{:?}", out.diagnostics);
    assert_eq!(record.validation.total_distributions, dec!(3550.00));

    let deposits: Vec<(&str, &str)> = record
        .transactions_in(Section::Distribution)
        .map(|t| (t.item.raw_label.as_str(), t.account_name.as_str()))
        .collect();
    assert_eq!(
        deposits,
        vec![
            ("Checking Acct", "Primary Checking"),
            ("Savings Acct", "Emergency Fund")
        ]
    );

    assert_eq!(out.diagnostics.len(), 1);
    match &out.diagnostics[0] {
        Diagnostic::UnmappedCategory { label, fallback, .. } => {
            assert_eq!(label, "Parking Reimbursement");
            assert_eq!(fallback, "Uncategorized");
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }

    // Earnings, then deductions, then distributions.
    let sections: Vec<Section> = record.transactions.iter().map(|t| t.section()).collect();
    let mut sorted = sections.clone();
    sorted.sort();
    assert_eq!(sections, sorted);
    assert!(record.rows.iter().all(|r| r.labels == "Payroll,Pay-2025-10"));
    assert_eq!(verify_csv_str(&render_csv(record).unwrap()).unwrap(), 8);
}

#[test]
fn missing_advice_number_is_unrecognized_layout() {
    let err = process_text(&fixture("missing_advice.txt"), &ProcessingConfig::default())
        .unwrap_err();
    match err {
        PaystubError::UnrecognizedLayout { missing } => assert_eq!(missing, "advice number"),
        other => panic!("expected UnrecognizedLayout, got {other:?}"),
    }
}

#[test]
fn reprocessing_is_byte_identical() {
    let config = ProcessingConfig::default();
    let text = fixture("deposits.txt");
    let first = render_csv(&process_text(&text, &config).unwrap().record).unwrap();
    let second = render_csv(&process_text(&text, &config).unwrap().record).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dedup_keys_identify_rows() {
    let out = process_text(&fixture("regular.txt"), &ProcessingConfig::default()).unwrap();
    let keys = out.record.dedup_keys();
    assert_eq!(keys.len(), out.record.rows.len());
    assert!(keys.iter().all(|k| k.advice_number == "0000123456"));
    assert_eq!(keys[1].amount, "-1200.00");
    assert_eq!(keys[1].description, "Federal income tax withholding");

    let again = process_text(&fixture("regular.txt"), &ProcessingConfig::default()).unwrap();
    assert_eq!(again.record.dedup_keys(), keys);
}

#[test]
fn tolerance_decides_balance() {
    let text = fixture("regular.txt").replace("Net Pay $3,300.00", "Net Pay $3,300.05");
    let loose = ProcessingConfig::builder().tolerance(dec!(0.10)).build().unwrap();
    assert!(process_text(&text, &loose).unwrap().is_balanced());

    let out = process_text(&text, &ProcessingConfig::default()).unwrap();
    assert!(!out.is_balanced());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::BalanceMismatch { .. })));
}

#[test]
fn written_csv_verifies_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = process_text(&fixture("regular.txt"), &ProcessingConfig::default()).unwrap();

    let path = write_record_to_dir(&out.record, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "2025-08-29_0000123456.csv");
    assert_eq!(verify_csv(&path).unwrap(), 3);

    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn unwritable_output_fails_only_its_own_record() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    let config = ProcessingConfig::default();
    let first = process_text(&fixture("regular.txt"), &config).unwrap();
    let second = process_text(&fixture("rsu.txt"), &config).unwrap();

    let err = write_record_checked(&first.record, &blocked, true).unwrap_err();
    assert!(matches!(err, PaystubError::OutputWriteFailed { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Output);

    let out_dir = dir.path().join("out");
    let path = write_record_checked(&second.record, &out_dir, true).unwrap();
    assert_eq!(path.file_name().unwrap(), "2025-09-15_0000129999.csv");
    assert_eq!(verify_csv(&path).unwrap(), second.record.rows.len());
}

#[tokio::test]
async fn batch_keeps_going_past_broken_documents() {
    let dir = tempfile::tempdir().unwrap();
    let not_pdf = dir.path().join("a-notes.pdf");
    std::fs::write(&not_pdf, "Pay Date: 08/29/2025").unwrap();
    let truncated = dir.path().join("b-truncated.pdf");
    std::fs::write(&truncated, "%PD").unwrap();
    let missing = dir.path().join("c-missing.pdf");

    let paths = vec![not_pdf.clone(), truncated.clone(), missing.clone()];
    let report = process_batch(&paths, &ProcessingConfig::default()).await;

    let order: Vec<&PathBuf> = report.outcomes.iter().map(|o| &o.path).collect();
    assert_eq!(order, vec![&not_pdf, &truncated, &missing]);
    assert!(matches!(
        report.outcomes[0].result,
        Err(PaystubError::NotAPdf { .. })
    ));
    assert!(matches!(
        report.outcomes[1].result,
        Err(PaystubError::NotAPdf { .. })
    ));
    assert!(matches!(
        report.outcomes[2].result,
        Err(PaystubError::FileNotFound { .. })
    ));
    assert_eq!(report.stats.total_documents, 3);
    assert_eq!(report.stats.failed, 3);
}
