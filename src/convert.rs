//! Eager processing entry points: one document, or a whole batch.
//!
//! Per document the pipeline is synchronous ([`process_file_blocking`]).
//! The async variants move it onto tokio's blocking pool, and batches fan
//! out with `buffer_unordered(config.concurrency)`. Use
//! [`crate::stream::process_stream`] instead when results should be handled
//! as each document finishes.

use crate::config::ProcessingConfig;
use crate::error::{Diagnostic, PaystubError};
use crate::output::{
    BatchReport, BatchStats, DocumentOutcome, DocumentStats, DocumentSummary, PaystubOutput,
    PaystubRecord,
};
use crate::pipeline::extract::{self, Document};
use crate::pipeline::{assemble, categorize, classify, input, parse, validate};
use crate::writer;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Lines shown in a [`DocumentSummary`].
const SAMPLE_LINES: usize = 10;

/// Run the stages after extraction over an already-built document.
///
/// Returns the record, diagnostics and the number of parsed line items.
fn run_stages(
    document: &Document,
    config: &ProcessingConfig,
) -> Result<(PaystubRecord, Vec<Diagnostic>, usize), PaystubError> {
    let header = classify::classify(document, config)?;
    let parsed = parse::parse_items(document, &header, config)?;
    let line_items = parsed.items.len();

    let mut diagnostics = parsed.diagnostics;
    let transactions =
        categorize::classify_items(parsed.items, header.is_vest_event, config, &mut diagnostics);
    let validation = validate::validate(
        &transactions,
        &parsed.stated,
        config.tolerance,
        &mut diagnostics,
    );
    let record = assemble::assemble(header, transactions, validation, config);
    Ok((record, diagnostics, line_items))
}

fn finish(
    document: &Document,
    config: &ProcessingConfig,
    extract_duration_ms: u64,
    start: Instant,
) -> Result<PaystubOutput, PaystubError> {
    let (record, diagnostics, line_items) = run_stages(document, config)?;
    let stats = DocumentStats {
        pages: document.pages,
        lines: document.line_count(),
        line_items,
        extract_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    Ok(PaystubOutput {
        record,
        diagnostics,
        stats,
    })
}

/// Process already-extracted text. Form feeds separate pages.
///
/// Useful for text dumped by another extractor and for tests; behaves
/// exactly like [`process_file_blocking`] after extraction.
pub fn process_text(text: &str, config: &ProcessingConfig) -> Result<PaystubOutput, PaystubError> {
    let start = Instant::now();
    let document = Document::from_text(text);
    if document.is_empty() {
        return Err(PaystubError::NoTextLayer {
            path: PathBuf::from("<text>"),
        });
    }
    finish(&document, config, 0, start)
}

/// Process one PDF on the current thread.
pub fn process_file_blocking(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<PaystubOutput, PaystubError> {
    let start = Instant::now();
    let path = input::resolve_local(path)?;
    info!("Processing {}", path.display());

    let document = extract::extract_document(&path, config)?;
    let extract_duration_ms = start.elapsed().as_millis() as u64;

    let output = finish(&document, config, extract_duration_ms, start)?;
    info!(
        "Processed {}: {} rows, balanced={}, {} warnings, {}ms",
        path.display(),
        output.record.rows.len(),
        output.record.validation.balanced,
        output.diagnostics.len(),
        output.stats.total_duration_ms
    );
    Ok(output)
}

/// Process one PDF.
///
/// # Errors
/// Returns `Err(PaystubError)` only for fatal problems: unreadable or
/// non-PDF input, no text layer, an unrecognised layout or a missing
/// required section. Unbalanced arithmetic and unmapped labels are
/// reported in [`PaystubOutput::diagnostics`].
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<PaystubOutput, PaystubError> {
    let path = path.as_ref().to_path_buf();
    let cfg = config.clone();
    tokio::task::spawn_blocking(move || process_file_blocking(&path, &cfg))
        .await
        .map_err(|e| PaystubError::Internal(format!("Processing task panicked: {}", e)))?
}

/// Process a PDF and write its CSV to `output_path` atomically.
pub async fn process_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<PaystubOutput, PaystubError> {
    let output = process_file(path, config).await?;
    let out = output_path.as_ref().to_path_buf();
    let record = output.record.clone();
    tokio::task::spawn_blocking(move || writer::write_csv(&record, &out))
        .await
        .map_err(|e| PaystubError::Internal(format!("Write task panicked: {}", e)))??;
    Ok(output)
}

/// Report what a PDF's text layer looks like without parsing it.
///
/// Meant for debugging `UnrecognizedLayout` failures.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<DocumentSummary, PaystubError> {
    let path = input::resolve_local(path)?;
    let cfg = config.clone();
    let extract_path = path.clone();
    let document =
        tokio::task::spawn_blocking(move || extract::extract_document(&extract_path, &cfg))
            .await
            .map_err(|e| PaystubError::Internal(format!("Inspect task panicked: {}", e)))??;
    Ok(summarize(&path, &document))
}

/// Summary of an extracted document.
pub fn summarize(path: &Path, document: &Document) -> DocumentSummary {
    DocumentSummary {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        pages: document.pages,
        lines: document.line_count(),
        sample_lines: document
            .lines
            .iter()
            .take(SAMPLE_LINES)
            .map(|l| l.text.clone())
            .collect(),
        patterns: classify::key_patterns(document),
    }
}

// ── Batch ────────────────────────────────────────────────────────────────

/// Runs one document to completion on the current thread.
pub(crate) type DocumentFn = fn(&Path, &ProcessingConfig) -> Result<PaystubOutput, PaystubError>;

fn process_pdf(path: &Path, config: &ProcessingConfig) -> Result<PaystubOutput, PaystubError> {
    process_file_blocking(path, config)
}

/// Process one document for a batch, firing progress events.
pub(crate) async fn process_one(path: PathBuf, config: ProcessingConfig) -> DocumentOutcome {
    run_document(path, config, process_pdf).await
}

async fn run_document(path: PathBuf, config: ProcessingConfig, run: DocumentFn) -> DocumentOutcome {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&path);
    }
    let task_path = path.clone();
    let cfg = config.clone();
    let result = tokio::task::spawn_blocking(move || run(&task_path, &cfg))
        .await
        .map_err(|e| PaystubError::Internal(format!("Processing task panicked: {}", e)))
        .and_then(|r| r);
    match &result {
        Ok(output) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(&path, output.record.rows.len(), output.is_balanced());
            }
        }
        Err(e) => {
            warn!("Failed {}: {}", path.display(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(&path, &e.to_string());
            }
        }
    }
    DocumentOutcome { path, result }
}

/// Process many PDFs concurrently.
///
/// A document that fails is recorded in its [`DocumentOutcome`] and never
/// stops its siblings. Outcomes come back in input order.
pub async fn process_batch(paths: &[PathBuf], config: &ProcessingConfig) -> BatchReport {
    run_batch(paths, config, process_pdf).await
}

async fn run_batch(paths: &[PathBuf], config: &ProcessingConfig, run: DocumentFn) -> BatchReport {
    let start = Instant::now();
    let total = paths.len();
    info!("Starting batch of {} documents", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut indexed: Vec<(usize, DocumentOutcome)> =
        stream::iter(paths.iter().cloned().enumerate().map(|(idx, path)| {
            let cfg = config.clone();
            async move { (idx, run_document(path, cfg, run).await) }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    indexed.sort_by_key(|(idx, _)| *idx);
    let outcomes: Vec<DocumentOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

    let stats = batch_stats(&outcomes, start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} processed, {} failed, {} unbalanced, {}ms",
        stats.processed, stats.total_documents, stats.failed, stats.unbalanced, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.processed);
    }
    BatchReport { outcomes, stats }
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_batch_sync(
    paths: &[PathBuf],
    config: &ProcessingConfig,
) -> Result<BatchReport, PaystubError> {
    Ok(tokio::runtime::Runtime::new()
        .map_err(|e| PaystubError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_batch(paths, config)))
}

/// Aggregate counts over a set of outcomes.
pub fn batch_stats(outcomes: &[DocumentOutcome], total_duration_ms: u64) -> BatchStats {
    let mut stats = BatchStats {
        total_documents: outcomes.len(),
        total_duration_ms,
        ..BatchStats::default()
    };
    for outcome in outcomes {
        match &outcome.result {
            Ok(output) => {
                stats.processed += 1;
                if !output.is_balanced() {
                    stats.unbalanced += 1;
                }
                stats.warnings += output.diagnostics.len();
            }
            Err(_) => stats.failed += 1,
        }
    }
    stats
}
