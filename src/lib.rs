//! # paystub2csv
//!
//! Convert payroll paystub PDFs (ADP-style earnings statements) into
//! transaction-level CSV ready for import into a personal finance tool.
//!
//! ## Why this crate?
//!
//! A paystub is a small double-entry ledger: gross earnings on one side,
//! taxes, retirement contributions and benefits on the other, and the net
//! amount deposited to the bank. Budgeting tools only see the deposit. This
//! crate reads the statement's text layer, turns every earning and deduction
//! into its own categorised transaction, and checks that the numbers
//! actually add up before handing them over.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate the path, `%PDF` magic, expand directories
//!  ├─ 2. Extract    page text via pdfium (spawn_blocking, process-wide lock)
//!  ├─ 3. Classify   regular vs. RSU vest, pay date, period, advice number
//!  ├─ 4. Parse      earnings / deductions / distribution line items
//!  ├─ 5. Categorize label → category, account, signed amount
//!  ├─ 6. Validate   gross − net − deductions ≈ 0 within tolerance
//!  └─ 7. Assemble   one CSV row per transaction, stable order
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paystub2csv::{process_file, render_csv, ProcessingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessingConfig::default();
//!     let output = process_file("2025-08-29.pdf", &config).await?;
//!     print!("{}", render_csv(&output.record)?);
//!     if !output.is_balanced() {
//!         eprintln!("warning: {:?}", output.diagnostics);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paystub2csv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! paystub2csv = { version = "0.3", default-features = false }
//! ```
//!
//! ## Category mappings
//!
//! The built-in table ([`defaults::default_mapping_table`]) covers the usual
//! ADP labels. Replace it with a JSON file via
//! [`ProcessingConfig::from_json_file`]; `paystub2csv --dump-mappings`
//! prints the defaults as a starting point.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod defaults;
pub mod error;
pub mod money;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessingConfig, ProcessingConfigBuilder};
pub use convert::{
    inspect, process_batch, process_batch_sync, process_file, process_file_blocking,
    process_text, process_to_file,
};
pub use error::{Diagnostic, ErrorKind, PaystubError};
pub use output::{
    BatchReport, BatchStats, ClassifiedTransaction, DedupKey, DocumentOutcome, DocumentStats,
    DocumentSummary, LineItem, OutputRow, PaystubHeader, PaystubOutput, PaystubRecord, Section,
    TransactionType, ValidationResult,
};
pub use pipeline::categorize::{MappingRule, MappingTable, MatchKind};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{process_stream, DocumentStream};
pub use writer::{render_csv, verify_csv, write_csv, write_record_to_dir};
