//! CLI binary for paystub2csv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessingConfig`, writes CSVs and reports per-document results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use paystub2csv::defaults::default_mappings_json;
use paystub2csv::pipeline::input::collect_inputs;
use paystub2csv::writer::write_record_checked;
use paystub2csv::{
    inspect, process_file, process_stream, render_csv, verify_csv, write_csv, write_record_to_dir,
    BatchProgressCallback, DocumentSummary, PaystubOutput, ProcessingConfig,
    ProcessingConfigBuilder, ProgressCallback,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── CLI progress callback using indicatif ────────────────────────────────

/// Progress bar over the documents of a directory batch. Documents finish
/// out of order, so each one logs its own line above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} stubs  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.reset_eta();
    }

    fn on_document_start(&self, path: &Path) {
        self.bar.set_message(display_name(path));
    }

    fn on_document_complete(&self, path: &Path, rows: usize, balanced: bool) {
        let mark = if balanced { green("✓") } else { yellow("⚠") };
        self.bar.println(format!(
            "  {} {:<40} {}",
            mark,
            display_name(path),
            dim(&format!("{rows:>3} rows"))
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, path: &Path, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<40} {}",
            red("✗"),
            display_name(path),
            red(first_line)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} paystubs processed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} paystubs processed  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One paystub to stdout
  paystub2csv 2025-08-29.pdf

  # One paystub to a file, re-checked after writing
  paystub2csv 2025-08-29.pdf -o august.csv --verify

  # A folder of paystubs into a folder of CSVs
  paystub2csv ~/Documents/paystubs -o ~/Documents/paystub-csv

  # Refuse to write anything that does not balance
  paystub2csv ~/Documents/paystubs -o out/ --strict

  # Custom category mappings
  paystub2csv --dump-mappings > mappings.json
  paystub2csv stub.pdf --config my-config.json

  # Debug a layout that is not recognised
  paystub2csv --inspect-only stub.pdf

CONFIG FILE (JSON, every key optional):
  {
    "tolerance": "0.01",
    "concurrency": 4,
    "default_account": "Primary Checking",
    "account_overrides": { "Checking Acct": "Joint Checking" },
    "date_formats": ["%m/%d/%Y", "%Y-%m-%d"],
    "emit_labels": true,
    "mappings": { "default_category": "Uncategorized", "regular": [...], "rsu": [...] }
  }

ENVIRONMENT VARIABLES:
  PAYSTUB2CSV_*     Every flag, e.g. PAYSTUB2CSV_TOLERANCE=0.05
  PDFIUM_LIB_PATH   Path to libpdfium when it is not on the loader path
  RUST_LOG          Overrides the log filter (e.g. paystub2csv=debug)

EXIT STATUS:
  0 when every document was converted, 1 when any failed (or, with
  --strict, did not balance).
"#;

/// Convert payroll paystub PDFs into transaction-level CSV.
#[derive(Parser, Debug)]
#[command(
    name = "paystub2csv",
    version,
    about = "Convert payroll paystub PDFs into transaction-level CSV",
    long_about = "Read ADP-style paystub PDFs, split every earning, deduction and deposit \
into its own categorised transaction, check that gross, deductions and net pay balance, \
and write CSV ready for import into a personal finance tool.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A paystub PDF or a directory of them.
    #[arg(required_unless_present = "dump_mappings")]
    input: Option<PathBuf>,

    /// Output CSV file, or output directory for directory input.
    #[arg(short, long, env = "PAYSTUB2CSV_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "PAYSTUB2CSV_CONFIG")]
    config: Option<PathBuf>,

    /// Allowed rounding difference when balancing (e.g. 0.01).
    #[arg(long, env = "PAYSTUB2CSV_TOLERANCE")]
    tolerance: Option<Decimal>,

    /// Number of documents processed at once.
    #[arg(short, long, env = "PAYSTUB2CSV_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Password for encrypted PDFs.
    #[arg(long, env = "PAYSTUB2CSV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PAYSTUB2CSV_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Account name for rows with no account-specific mapping.
    #[arg(long, env = "PAYSTUB2CSV_ACCOUNT")]
    account: Option<String>,

    /// Fill the Labels column (RSU, Payroll, Pay-YYYY-MM).
    #[arg(long, env = "PAYSTUB2CSV_LABELS")]
    labels: bool,

    /// Fill the Original Description column with the source line.
    #[arg(long, env = "PAYSTUB2CSV_ORIGINAL_TEXT")]
    original_text: bool,

    /// Treat an unbalanced paystub as a failure and do not write it.
    #[arg(long, env = "PAYSTUB2CSV_STRICT")]
    strict: bool,

    /// Print structured JSON instead of CSV.
    #[arg(long, env = "PAYSTUB2CSV_JSON")]
    json: bool,

    /// Print what the text layer looks like, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Re-read every written CSV and check its format.
    #[arg(long, env = "PAYSTUB2CSV_VERIFY")]
    verify: bool,

    /// Print the built-in category mappings as JSON and exit.
    #[arg(long)]
    dump_mappings: bool,

    /// Disable progress bar.
    #[arg(long, env = "PAYSTUB2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAYSTUB2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAYSTUB2CSV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.dump_mappings {
        let json = default_mappings_json().context("Failed to serialise default mappings")?;
        println!("{json}");
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("INPUT is required (a PDF file or a directory)")?;
    let paths = collect_inputs(&input)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    if paths.is_empty() {
        bail!("No PDF files found under {}", input.display());
    }

    let config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let mut summaries = Vec::with_capacity(paths.len());
        for path in &paths {
            let summary = inspect(path, &config)
                .await
                .with_context(|| format!("Failed to inspect {}", path.display()))?;
            summaries.push(summary);
        }
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries).context("Failed to serialise summary")?
            );
        } else {
            for summary in &summaries {
                print_summary(summary);
            }
        }
        return Ok(());
    }

    if input.is_dir() {
        let out_dir = cli
            .output
            .clone()
            .context("Directory input requires -o <OUTPUT_DIR>")?;
        run_directory(&cli, paths, &out_dir, config).await
    } else {
        run_single(&cli, &input, &config).await
    }
}

/// Map CLI args (and the optional config file) to `ProcessingConfig`.
fn build_config(cli: &Cli) -> Result<ProcessingConfig> {
    let mut builder: ProcessingConfigBuilder = match cli.config {
        Some(ref path) => ProcessingConfig::builder_from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProcessingConfig::builder(),
    };

    if let Some(tolerance) = cli.tolerance {
        builder = builder.tolerance(tolerance);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(ref account) = cli.account {
        builder = builder.default_account(account.clone());
    }
    if cli.labels {
        builder = builder.emit_labels(true);
    }
    if cli.original_text {
        builder = builder.include_original_text(true);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &DocumentSummary) {
    let flag = |found: bool| if found { green("found") } else { red("missing") };
    println!("File:           {}", bold(&summary.file_name));
    println!("Pages:          {}", summary.pages);
    println!("Text lines:     {}", summary.lines);
    println!("Pay date:       {}", flag(summary.patterns.pay_date));
    println!("Advice number:  {}", flag(summary.patterns.advice_number));
    println!("Earnings:       {}", flag(summary.patterns.earnings));
    println!("Deductions:     {}", flag(summary.patterns.deductions));
    println!("Net pay:        {}", flag(summary.patterns.net_pay));
    println!("RSU vest:       {}", flag(summary.patterns.rsu_vest));
    println!("First lines:");
    for line in &summary.sample_lines {
        println!("  {}", dim(line));
    }
    println!();
}

fn report_diagnostics(path: &Path, output: &PaystubOutput) {
    for diagnostic in &output.diagnostics {
        eprintln!("  {} {}: {}", yellow("⚠"), display_name(path), diagnostic);
    }
}

/// One PDF: CSV to stdout, or to `-o` (a file, or a directory).
async fn run_single(cli: &Cli, input: &Path, config: &ProcessingConfig) -> Result<()> {
    let start = Instant::now();
    let output = process_file(input, config)
        .await
        .with_context(|| format!("Failed to process {}", input.display()))?;

    if !cli.quiet {
        report_diagnostics(input, &output);
    }
    if cli.strict && !output.is_balanced() {
        bail!(
            "{} does not balance (discrepancy {}); nothing written",
            input.display(),
            output.record.validation.discrepancy
        );
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    match cli.output {
        Some(ref out) => {
            let written = if out.is_dir() {
                write_record_to_dir(&output.record, out)
            } else {
                write_csv(&output.record, out).map(|_| out.clone())
            }
            .with_context(|| format!("Failed to write {}", out.display()))?;

            if cli.verify {
                let rows = verify_csv(&written)
                    .with_context(|| format!("Verification failed for {}", written.display()))?;
                if !cli.quiet {
                    eprintln!("{} verified {} rows", green("✓"), rows);
                }
            }
            if !cli.quiet {
                eprintln!(
                    "{}  {} rows  {}ms  →  {}",
                    if output.is_balanced() { green("✔") } else { yellow("⚠") },
                    output.record.rows.len(),
                    start.elapsed().as_millis(),
                    bold(&written.display().to_string())
                );
            }
        }
        None if !cli.json => {
            let csv = render_csv(&output.record).context("Failed to render CSV")?;
            io::stdout()
                .lock()
                .write_all(csv.as_bytes())
                .context("Failed to write to stdout")?;
        }
        None => {}
    }

    Ok(())
}

/// A directory: one CSV per paystub into `out_dir`, written as each
/// document finishes.
async fn run_directory(
    cli: &Cli,
    paths: Vec<PathBuf>,
    out_dir: &Path,
    mut config: ProcessingConfig,
) -> Result<()> {
    let start = Instant::now();
    let total = paths.len();

    let progress = if cli.quiet || cli.no_progress || cli.json {
        None
    } else {
        let cb = CliProgressCallback::new();
        config.progress_callback = Some(cb.clone() as ProgressCallback);
        Some(cb)
    };
    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let mut owners: HashMap<String, PathBuf> = HashMap::new();
    let mut failed = 0usize;
    let mut unbalanced = 0usize;
    let mut documents = Vec::with_capacity(total);

    let mut stream = process_stream(paths, &config);
    while let Some(outcome) = stream.next().await {
        let output = match outcome.result {
            Ok(output) => output,
            Err(e) => {
                failed += 1;
                if progress.is_none() && !cli.quiet {
                    eprintln!("{} {}: {}", red("✗"), outcome.path.display(), e);
                }
                documents.push(serde_json::json!({
                    "path": outcome.path,
                    "error": e.to_string(),
                    "kind": e.kind(),
                }));
                continue;
            }
        };

        if !cli.quiet && progress.is_none() {
            report_diagnostics(&outcome.path, &output);
        }
        if !output.is_balanced() {
            unbalanced += 1;
            if cli.strict {
                failed += 1;
                eprintln!(
                    "{} {}: does not balance; not written",
                    red("✗"),
                    outcome.path.display()
                );
                continue;
            }
        }

        let file_name = output.record.file_name();
        if let Some(owner) = earlier_owner(&owners, &file_name, &outcome.path) {
            eprintln!(
                "{} {}: duplicate of {} ({}); skipped",
                yellow("⚠"),
                outcome.path.display(),
                owner.display(),
                file_name
            );
            continue;
        }

        let record = &output.record;
        let written =
            tokio::task::block_in_place(|| write_record_checked(record, out_dir, cli.verify));
        let csv_path = match written {
            Ok(path) => path,
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", red("✗"), outcome.path.display(), e);
                documents.push(serde_json::json!({
                    "path": outcome.path,
                    "error": e.to_string(),
                    "kind": e.kind(),
                }));
                continue;
            }
        };
        if let Some(replaced) = owners.insert(file_name.clone(), outcome.path.clone()) {
            eprintln!(
                "{} {}: duplicate of {} ({}); superseded",
                yellow("⚠"),
                replaced.display(),
                outcome.path.display(),
                file_name
            );
        }

        documents.push(serde_json::json!({
            "path": outcome.path,
            "csv": csv_path,
            "rows": output.record.rows.len(),
            "balanced": output.is_balanced(),
            "diagnostics": output.diagnostics,
        }));
    }

    let succeeded = total - failed;
    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, succeeded);
    }

    if cli.json {
        let report = serde_json::json!({
            "documents": documents,
            "total": total,
            "processed": succeeded,
            "failed": failed,
            "unbalanced": unbalanced,
            "total_duration_ms": start.elapsed().as_millis() as u64,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet && progress.is_none() {
        eprintln!(
            "Processed {}/{} paystubs in {}ms ({} unbalanced) → {}",
            succeeded,
            total,
            start.elapsed().as_millis(),
            unbalanced,
            out_dir.display()
        );
    }

    if failed > 0 {
        bail!("{failed} of {total} paystubs failed");
    }
    Ok(())
}

/// The input already holding `file_name`, if it sorts at or before `path`.
///
/// Two stubs with the same pay date and advice number are one paystub. The
/// CSV always comes from the earliest input path, whichever finishes first.
fn earlier_owner<'a>(
    owners: &'a HashMap<String, PathBuf>,
    file_name: &str,
    path: &Path,
) -> Option<&'a PathBuf> {
    owners.get(file_name).filter(|owner| owner.as_path() <= path)
}
