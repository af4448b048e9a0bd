//! Input resolution: validate user-supplied paths and expand directories.
//!
//! pdfium crashes or returns opaque errors on non-PDF input, so every file
//! is checked for existence, read permission and the `%PDF` magic bytes
//! before extraction. Directories are walked recursively; only `.pdf` files
//! (any case) are kept, sorted so batch order is deterministic.

use crate::error::PaystubError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Validate a local file path, checking existence and PDF magic bytes.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, PaystubError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(PaystubError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            // A file shorter than the header fails read_exact and is rejected too.
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(PaystubError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PaystubError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PaystubError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Expand an input path into the list of PDFs to process.
///
/// A file is returned as-is (validated later, per document, so one bad file
/// does not fail the batch). A directory yields every `.pdf` beneath it.
pub fn collect_inputs(input: impl AsRef<Path>) -> Result<Vec<PathBuf>, PaystubError> {
    let input = input.as_ref();
    if !input.exists() {
        return Err(PaystubError::FileNotFound {
            path: input.to_path_buf(),
        });
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_pdf_name(p))
        .collect();
    files.sort();
    debug!("Found {} PDFs under {}", files.len(), input.display());
    Ok(files)
}

fn is_pdf_name(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("pdf"))
}
