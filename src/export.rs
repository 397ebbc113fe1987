//! File export of fetched records.
//!
//! A batch is written twice: a pretty-printed JSON array holding every record
//! verbatim, and a CSV with one fixed column set for spreadsheet use.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument};

use crate::record::RawRecord;

/// CSV header, in column order.
pub const CSV_COLUMNS: [&str; 11] = [
    "title",
    "authors",
    "publisher",
    "isbn",
    "datetime",
    "price",
    "sale_price",
    "url",
    "thumbnail",
    "status",
    "contents",
];

/// Runs of characters not allowed in export file names.
#[allow(clippy::expect_used)]
static FILENAME_UNSAFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9A-Za-z가-힣]+").expect("filename regex is valid") // Static pattern, safe to panic
});

/// Errors raised while writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failure.
    #[error("failed to write JSON to {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// CSV serialization failure.
    #[error("failed to write CSV to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ExportError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Files written by [`export_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Turns a search query into a file-name-safe stem.
///
/// ASCII letters, digits and Hangul syllables are kept; every other run of
/// characters becomes one `_`. Leading and trailing `_` are trimmed, and an
/// empty result becomes `query`.
#[must_use]
pub fn sanitize_query_for_filename(query: &str) -> String {
    let replaced = FILENAME_UNSAFE.replace_all(query, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "query".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes `records` as a pretty-printed UTF-8 JSON array.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_json(path: &Path, records: &[RawRecord]) -> Result<(), ExportError> {
    let file = File::create(path).map_err(ExportError::io(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(ExportError::io(path))?;
    writer.flush().map_err(ExportError::io(path))
}

/// Writes `records` as CSV with the [`CSV_COLUMNS`] header.
///
/// Missing fields are empty cells. `authors` is joined with `", "` and
/// `isbn` holds the normalized token.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_csv(path: &Path, records: &[RawRecord]) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(CSV_COLUMNS).map_err(csv_err)?;
    for record in records {
        writer.write_record(csv_row(record)).map_err(csv_err)?;
    }
    writer.flush().map_err(ExportError::io(path))
}

/// Writes `books_<query>.json` and `books_<query>.csv` into `out_dir`,
/// creating the directory if needed.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory or either file cannot be written.
#[instrument(skip(out_dir, records), fields(out_dir = %out_dir.display(), records = records.len()))]
pub fn export_batch(
    out_dir: &Path,
    query: &str,
    records: &[RawRecord],
) -> Result<ExportPaths, ExportError> {
    fs::create_dir_all(out_dir).map_err(ExportError::io(out_dir))?;

    let stem = format!("books_{}", sanitize_query_for_filename(query));
    let paths = ExportPaths {
        json: out_dir.join(format!("{stem}.json")),
        csv: out_dir.join(format!("{stem}.csv")),
    };

    write_json(&paths.json, records)?;
    info!(path = %paths.json.display(), "JSON export written");
    write_csv(&paths.csv, records)?;
    info!(path = %paths.csv.display(), "CSV export written");

    Ok(paths)
}

fn csv_row(record: &RawRecord) -> Vec<String> {
    CSV_COLUMNS
        .iter()
        .map(|column| match *column {
            "authors" => record
                .authors()
                .map(|names| names.join(", "))
                .unwrap_or_default(),
            "isbn" => record.isbn().unwrap_or_default().to_string(),
            other => cell(record.get(other)),
        })
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
