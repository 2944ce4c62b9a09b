//! Pre-aggregated daily summary ingestion.
//!
//! Summaries are small CSVs with `date` and `failed_attempts` columns, one
//! file per extract (`auth_summary_*.csv`). Parsing is lenient at row
//! granularity: a bad count coerces to zero, a row without a date is
//! dropped, and neither aborts the batch.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// One `(date, failed_attempts)` row as read, date not yet validated.
/// Date validation belongs to the daily aggregator, which drops rows that
/// do not parse as real `YYYY-MM-DD` dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub date: String,
    pub failed_attempts: u64,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    /// No `auth_summary_*.csv` files exist at all; distinct from "files
    /// found but no usable rows", which the aggregator reports.
    #[error("no summary reports found under {dir}")]
    NoReports { dir: PathBuf },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coerce a count cell to an integer. Accepts `"12"`, `"12.0"`, padded
/// whitespace; anything else (including a missing cell) is zero.
pub fn coerce_count(raw: Option<&str>) -> u64 {
    let s = match raw {
        Some(s) => s.trim(),
        None => return 0,
    };
    if s.is_empty() {
        return 0;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v as u64,
        _ => 0,
    }
}

/// Read `date,failed_attempts` rows from one summary. Column order comes
/// from the header; files without both columns yield nothing.
pub fn read_rows<R: BufRead>(reader: R) -> Vec<SummaryRow> {
    let mut lines = reader.lines().map_while(Result::ok);

    let header = match lines.next() {
        Some(h) => h,
        None => return Vec::new(),
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let date_idx = columns.iter().position(|c| *c == "date");
    let count_idx = columns.iter().position(|c| *c == "failed_attempts");
    let (date_idx, count_idx) = match (date_idx, count_idx) {
        (Some(d), Some(c)) => (d, c),
        _ => return Vec::new(),
    };

    let mut rows = Vec::new();
    for line in lines {
        let cells: Vec<&str> = line.split(',').collect();
        let date = cells.get(date_idx).map(|c| c.trim()).unwrap_or("");
        if date.is_empty() {
            continue;
        }
        rows.push(SummaryRow {
            date: date.to_string(),
            failed_attempts: coerce_count(cells.get(count_idx).copied()),
        });
    }
    rows
}

/// Collect rows from every `auth_summary_*.csv` in `dir`, in filename order.
pub fn collect_reports(dir: &Path) -> Result<Vec<SummaryRow>, SummaryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SummaryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("auth_summary_") && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(SummaryError::NoReports {
            dir: dir.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for path in paths {
        let file = File::open(&path).map_err(|source| SummaryError::Io {
            path: path.clone(),
            source,
        })?;
        rows.extend(read_rows(BufReader::new(file)));
    }
    Ok(rows)
}
