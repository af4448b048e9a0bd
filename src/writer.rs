//! CSV serialisation, atomic file output and format verification.
//!
//! Files are written to a `NamedTempFile` in the destination directory and
//! persisted (renamed) over the final path, so a crash or an abandoned
//! document never leaves a half-written CSV where an importer could pick it
//! up.

use crate::error::PaystubError;
use crate::money::{format_amount, parse_amount};
use crate::output::{OutputRow, PaystubRecord, OUTPUT_COLUMNS};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

fn csv_error(e: impl std::fmt::Display) -> PaystubError {
    PaystubError::CsvFormat(e.to_string())
}

/// Serialise rows under the header line.
pub fn render_rows(rows: &[OutputRow]) -> Result<String, PaystubError> {
    let mut wtr = csv_writer(Vec::new());
    wtr.write_record(OUTPUT_COLUMNS).map_err(csv_error)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_error)?;
    }
    let bytes = wtr.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

/// Serialise one record to CSV text, header included.
pub fn render_csv(record: &PaystubRecord) -> Result<String, PaystubError> {
    render_rows(&record.rows)
}

/// Where [`write_record_to_dir`] puts a record.
pub fn output_path(dir: &Path, record: &PaystubRecord) -> PathBuf {
    dir.join(record.file_name())
}

/// Atomically write `contents` to `path`, creating parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PaystubError> {
    let write_err = |source: std::io::Error| PaystubError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Render and atomically write one record to `path`.
pub fn write_csv(record: &PaystubRecord, path: &Path) -> Result<(), PaystubError> {
    let csv = render_csv(record)?;
    write_atomic(path, csv.as_bytes())?;
    info!("Wrote {} rows to {}", record.rows.len(), path.display());
    Ok(())
}

/// Write one record into `dir` under its canonical file name.
pub fn write_record_to_dir(record: &PaystubRecord, dir: &Path) -> Result<PathBuf, PaystubError> {
    let path = output_path(dir, record);
    write_csv(record, &path)?;
    Ok(path)
}

/// Write one record into `dir`, then re-read it when `verify` is set.
///
/// A failure here belongs to this record alone; batch callers report it and
/// move on to the next document.
pub fn write_record_checked(
    record: &PaystubRecord,
    dir: &Path,
    verify: bool,
) -> Result<PathBuf, PaystubError> {
    let path = write_record_to_dir(record, dir)?;
    if verify {
        verify_csv(&path)?;
    }
    Ok(path)
}

/// Re-read a CSV file and check it follows the row contract.
///
/// Returns the number of data rows.
pub fn verify_csv(path: &Path) -> Result<usize, PaystubError> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| PaystubError::CsvFormat(format!("{}: {}", path.display(), e)))?;
    verify_reader(&mut rdr)
}

/// [`verify_csv`] over in-memory CSV text.
pub fn verify_csv_str(text: &str) -> Result<usize, PaystubError> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    verify_reader(&mut rdr)
}

fn verify_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> Result<usize, PaystubError> {
    let headers = rdr.headers().map_err(csv_error)?.clone();
    if headers.iter().ne(OUTPUT_COLUMNS.iter().copied()) {
        return Err(PaystubError::CsvFormat(format!(
            "unexpected header: {:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut count = 0;
    for (i, result) in rdr.deserialize::<OutputRow>().enumerate() {
        let n = i + 1;
        let row = result.map_err(|e| PaystubError::CsvFormat(format!("row {n}: {e}")))?;
        verify_row(&row).map_err(|reason| PaystubError::CsvFormat(format!("row {n}: {reason}")))?;
        count += 1;
    }
    Ok(count)
}

fn verify_row(row: &OutputRow) -> Result<(), String> {
    NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}'", row.date))?;

    let amount = parse_amount(&row.amount).ok_or_else(|| format!("invalid amount '{}'", row.amount))?;
    if format_amount(amount) != row.amount {
        return Err(format!("amount '{}' is not in canonical form", row.amount));
    }

    let negative = amount.is_sign_negative() && !amount.is_zero();
    match (row.transaction_type.as_str(), negative) {
        ("credit", false) | ("debit", true) => Ok(()),
        ("credit", true) | ("debit", false) => Err(format!(
            "transaction type '{}' disagrees with amount {}",
            row.transaction_type, row.amount
        )),
        (other, _) => Err(format!("invalid transaction type '{other}'")),
    }
}
