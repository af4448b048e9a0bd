//! Error types for the paystub2csv library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`PaystubError`]: **Fatal** for one document: the PDF cannot be read,
//!   the layout is not a recognised paystub, or a required section came out
//!   empty. Returned as `Err(PaystubError)` from the per-document entry
//!   points. Batch entry points record it against the document and carry on
//!   with its siblings.
//!
//! * [`Diagnostic`]: **Non-fatal**: a single line did not parse, a label has
//!   no mapping rule, or the arithmetic does not balance. Collected into
//!   [`crate::output::PaystubOutput::diagnostics`] next to the record so
//!   callers decide whether partial output is acceptable.

use crate::output::Section;
use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paystub2csv library.
#[derive(Debug, Error)]
pub enum PaystubError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF has no text layer (scanned image or empty pages).
    #[error("PDF '{path}' has no extractable text; scanned paystubs are not supported")]
    NoTextLayer { path: PathBuf },

    /// More pages than any paystub should have.
    #[error("PDF '{path}' has {pages} pages (limit {limit}); not a paystub")]
    TooManyPages {
        path: PathBuf,
        pages: usize,
        limit: usize,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib, or install\n\
libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Layout errors ─────────────────────────────────────────────────────
    /// A required header field could not be found or parsed.
    #[error("Unrecognized paystub layout: {missing} not found")]
    UnrecognizedLayout { missing: &'static str },

    /// An expected section produced no line items.
    #[error("Section '{section}' is missing or contains no line items")]
    SectionParse { section: Section },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read or decoded.
    #[error("Failed to load configuration '{path}': {detail}")]
    ConfigLoad { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output CSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialisation failed or a CSV file does not follow the row contract.
    #[error("CSV format error: {0}")]
    CsvFormat(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`PaystubError`], used for batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Extraction,
    UnrecognizedLayout,
    SectionParse,
    Config,
    Output,
    Internal,
}

impl PaystubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaystubError::FileNotFound { .. }
            | PaystubError::PermissionDenied { .. }
            | PaystubError::NotAPdf { .. }
            | PaystubError::CorruptPdf { .. }
            | PaystubError::PasswordRequired { .. }
            | PaystubError::WrongPassword { .. }
            | PaystubError::NoTextLayer { .. }
            | PaystubError::TooManyPages { .. }
            | PaystubError::PdfiumBindingFailed(_) => ErrorKind::Extraction,
            PaystubError::UnrecognizedLayout { .. } => ErrorKind::UnrecognizedLayout,
            PaystubError::SectionParse { .. } => ErrorKind::SectionParse,
            PaystubError::InvalidConfig(_) | PaystubError::ConfigLoad { .. } => ErrorKind::Config,
            PaystubError::OutputWriteFailed { .. } | PaystubError::CsvFormat(_) => {
                ErrorKind::Output
            }
            PaystubError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// A non-fatal finding for a single document.
///
/// Stored in [`crate::output::PaystubOutput::diagnostics`]. Processing of
/// the document always continues past a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A line inside a recognised section matched no pattern.
    #[error("Page {page}, row {row}: unparsed {section} line '{text}'")]
    UnparsedLine {
        section: Section,
        page: usize,
        row: usize,
        text: String,
    },

    /// No mapping rule matched the label; the default category was used.
    #[error("No category mapping for {section} label '{label}', using '{fallback}'")]
    UnmappedCategory {
        section: Section,
        label: String,
        fallback: String,
    },

    /// gross − net − deductions is outside the tolerance.
    #[error("Balance mismatch: gross {gross} − net {net} − deductions {deductions} = {discrepancy}")]
    BalanceMismatch {
        gross: Decimal,
        net: Decimal,
        deductions: Decimal,
        discrepancy: Decimal,
    },

    /// The stub's printed Gross Pay disagrees with the sum of earnings.
    #[error("Stated gross pay {stated} differs from sum of earnings {computed}")]
    GrossMismatch { stated: Decimal, computed: Decimal },

    /// Deposits do not add up to net pay.
    #[error("Distributions total {distributed} differs from net pay {net}")]
    DistributionMismatch { net: Decimal, distributed: Decimal },
}
