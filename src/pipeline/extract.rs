//! Text extraction: read every page's text layer via pdfium.
//!
//! ## Locking
//!
//! pdfium keeps global library state, and binding plus document loading are
//! not safe to run from several threads at once. Every call into pdfium in
//! this crate goes through [`PDFIUM_LOCK`]; batch workers wait on it only for
//! extraction and run the remaining stages in parallel.
//!
//! ## Binding order
//!
//! 1. [`ProcessingConfig::pdfium_library`]
//! 2. `PDFIUM_LIB_PATH`
//! 3. the system loader (`libpdfium` on the library search path)

use crate::config::ProcessingConfig;
use crate::error::PaystubError;
use crate::pipeline::normalize::normalize_page;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Serialises all pdfium access in the process.
static PDFIUM_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Page separator understood by [`Document::from_text`] (form feed).
pub const PAGE_BREAK: char = '\u{0C}';

/// One normalised line with its position in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// 1-based page number.
    pub page: usize,
    /// 1-based line number within the page.
    pub row: usize,
    /// Leading indentation in characters.
    pub column: usize,
    pub text: String,
}

/// Extracted text in reading order: top-to-bottom within a page, pages in
/// document order. Dropped once parsing finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub pages: usize,
    pub lines: Vec<TextLine>,
}

impl Document {
    /// Build from per-page raw text.
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let lines = pages
            .iter()
            .enumerate()
            .flat_map(|(i, raw)| {
                normalize_page(raw.as_ref())
                    .into_iter()
                    .map(move |l| TextLine {
                        page: i + 1,
                        row: l.row,
                        column: l.column,
                        text: l.text,
                    })
            })
            .collect();
        Self {
            pages: pages.len(),
            lines,
        }
    }

    /// Build from plain text; form feeds separate pages.
    pub fn from_text(text: &str) -> Self {
        let pages: Vec<&str> = text.split(PAGE_BREAK).collect();
        Self::from_pages(&pages)
    }

    /// No non-empty line on any page.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Extract and normalise the text of a PDF.
///
/// Blocking; the async entry points call it from `spawn_blocking`.
///
/// # Errors
/// `PasswordRequired` / `WrongPassword` for encrypted files,
/// `CorruptPdf` when pdfium cannot load the file, `TooManyPages` above
/// `config.max_pages`, `NoTextLayer` for image-only documents.
pub fn extract_document(path: &Path, config: &ProcessingConfig) -> Result<Document, PaystubError> {
    let start = Instant::now();
    let raw_pages = {
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        read_pages(path, config)?
    };

    let document = Document::from_pages(&raw_pages);
    if document.is_empty() {
        return Err(PaystubError::NoTextLayer {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Extracted {} lines from {} pages in {}ms",
        document.line_count(),
        document.pages,
        start.elapsed().as_millis()
    );
    Ok(document)
}

/// Raw page text straight from pdfium. Caller holds the lock.
fn read_pages(path: &Path, config: &ProcessingConfig) -> Result<Vec<String>, PaystubError> {
    let pdfium = bind_pdfium(config.pdfium_library.as_deref())?;
    let password = config.password.as_deref();

    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| map_load_error(path, password.is_some(), e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    debug!("PDF loaded: {} pages", total_pages);

    if total_pages > config.max_pages {
        return Err(PaystubError::TooManyPages {
            path: path.to_path_buf(),
            pages: total_pages,
            limit: config.max_pages,
        });
    }

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| PaystubError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let all = text.all();
        debug!("Page {} → {} chars", idx + 1, all.len());
        texts.push(all);
    }
    Ok(texts)
}

fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, PaystubError> {
    let library: Option<PathBuf> = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match library {
        Some(lib) => {
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
                .map_err(|e| PaystubError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)))?
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| PaystubError::PdfiumBindingFailed(format!("system library: {:?}", e)))?,
    };
    Ok(Pdfium::new(bindings))
}

fn map_load_error(path: &Path, had_password: bool, e: PdfiumError) -> PaystubError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            PaystubError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            PaystubError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        PaystubError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}
