//! Progress-callback trait for batch processing events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ProcessingConfigBuilder::progress_callback`] to receive
//! events as the batch entry points work through their documents. The CLI
//! drives an `indicatif` bar from it.
//!
//! # Example
//!
//! ```rust
//! use paystub2csv::{BatchProgressCallback, ProcessingConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_document_complete(&self, _path: &Path, _rows: usize, _balanced: bool) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ProcessingConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch pipeline as it processes each document.
///
/// Documents run concurrently, so `on_document_*` may be called from
/// several threads at once. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document starts.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    fn on_document_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when a document produced a record.
    ///
    /// # Arguments
    /// * `rows`: number of CSV rows produced
    /// * `balanced`: whether the arithmetic check passed
    fn on_document_complete(&self, path: &Path, rows: usize, balanced: bool) {
        let _ = (path, rows, balanced);
    }

    /// Called when a document failed fatally.
    fn on_document_error(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::ProcessingConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
