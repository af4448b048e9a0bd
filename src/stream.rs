//! Streaming batch API: emit documents as they finish.
//!
//! [`crate::convert::process_batch`] returns only after every document is
//! done. [`process_stream`] yields each [`DocumentOutcome`] as soon as its
//! document completes, so callers can write CSVs or report failures while
//! the rest of the batch is still running. Outcomes arrive in completion
//! order; match on `outcome.path` if input order matters.

use crate::config::ProcessingConfig;
use crate::convert::process_one;
use crate::output::DocumentOutcome;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document outcomes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Process PDFs concurrently, yielding each outcome as it completes.
///
/// At most `config.concurrency` documents are in flight. Document-level
/// progress events fire as in the eager API; batch start/complete events
/// do not, since the caller owns the stream's lifetime.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use paystub2csv::{process_stream, ProcessingConfig};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() {
/// let paths = vec![PathBuf::from("2025-08-29.pdf"), PathBuf::from("2025-09-15.pdf")];
/// let mut stream = process_stream(paths, &ProcessingConfig::default());
/// while let Some(outcome) = stream.next().await {
///     match outcome.result {
///         Ok(out) => println!("{}: {} rows", outcome.path.display(), out.record.rows.len()),
///         Err(e) => eprintln!("{}: {e}", outcome.path.display()),
///     }
/// }
/// # }
/// ```
pub fn process_stream(paths: Vec<PathBuf>, config: &ProcessingConfig) -> DocumentStream {
    info!("Starting streaming batch of {} documents", paths.len());
    let concurrency = config.concurrency;
    let config_clone = config.clone();

    let s = stream::iter(paths.into_iter().map(move |path| {
        let cfg = config_clone.clone();
        process_one(path, cfg)
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
