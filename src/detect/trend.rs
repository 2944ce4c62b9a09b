//! Daily aggregation and trailing moving average.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::parser::summary::SummaryRow;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrendError {
    /// No input rows at all.
    #[error("no rows to aggregate")]
    NoRows,

    /// Rows were supplied but none carried a valid `YYYY-MM-DD` date. Kept
    /// distinct from [`TrendError::NoRows`] so the caller can say "found
    /// summaries but no usable rows" instead of "found nothing".
    #[error("rows present but none had a valid YYYY-MM-DD date")]
    NoValidRows,
}

/// Sum counts per calendar date. Rows whose date is not a strict
/// `%Y-%m-%d` calendar date are dropped at row granularity, never turned
/// into a sentinel key and never an error for the batch. Pure: the same
/// rows always produce the same map.
pub fn aggregate_daily(rows: &[SummaryRow]) -> Result<BTreeMap<NaiveDate, u64>, TrendError> {
    if rows.is_empty() {
        return Err(TrendError::NoRows);
    }

    let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in rows {
        let date = match NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => continue,
        };
        *daily.entry(date).or_insert(0) += row.failed_attempts;
    }

    if daily.is_empty() {
        return Err(TrendError::NoValidRows);
    }
    Ok(daily)
}

/// Trailing moving average with a shrinking window at the series start:
/// `out[i]` is the mean of `values[max(0, i-window+1) ..= i]`. Output has
/// the same length and index alignment as the input; `window <= 1` returns
/// the input unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = i.saturating_sub(window - 1);
        let slice = &values[start..=i];
        out.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, count: u64) -> SummaryRow {
        SummaryRow {
            date: date.to_string(),
            failed_attempts: count,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_aggregate_sums_per_date() {
        let rows = vec![
            row("2024-01-01", 3),
            row("2024-01-01", 4),
            row("2024-01-02", 10),
        ];
        let daily = aggregate_daily(&rows).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[&date("2024-01-01")], 7);
        assert_eq!(daily[&date("2024-01-02")], 10);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let rows = vec![row("2024-01-01", 3), row("2024-01-02", 4)];
        assert_eq!(aggregate_daily(&rows), aggregate_daily(&rows));
    }

    #[test]
    fn test_aggregate_drops_bad_dates() {
        let rows = vec![
            row("2024-13-40", 5),
            row("not-a-date", 1),
            row("2024-01-02", 2),
        ];
        let daily = aggregate_daily(&rows).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[&date("2024-01-02")], 2);
    }

    #[test]
    fn test_no_rows_vs_no_valid_rows() {
        assert_eq!(aggregate_daily(&[]), Err(TrendError::NoRows));
        assert_eq!(
            aggregate_daily(&[row("2024-13-40", 5)]),
            Err(TrendError::NoValidRows)
        );
    }

    #[test]
    fn test_dates_iterate_chronologically() {
        let rows = vec![
            row("2024-02-01", 1),
            row("2023-12-31", 1),
            row("2024-01-15", 1),
        ];
        let daily = aggregate_daily(&rows).unwrap();
        let dates: Vec<_> = daily.keys().copied().collect();
        assert_eq!(
            dates,
            vec![date("2023-12-31"), date("2024-01-15"), date("2024-02-01")]
        );
    }

    #[test]
    fn test_moving_average_window_one_is_identity() {
        let s = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(moving_average(&s, 1), s);
        assert_eq!(moving_average(&s, 0), s);
    }

    #[test]
    fn test_moving_average_shrinks_at_start() {
        let s = vec![7.0, 10.0];
        assert_eq!(moving_average(&s, 7), vec![7.0, 8.5]);
    }

    #[test]
    fn test_moving_average_large_window_is_running_mean() {
        let s = vec![1.0, 2.0, 3.0, 4.0];
        let out = moving_average(&s, 10);
        assert_eq!(out, vec![1.0, 1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_moving_average_window_three() {
        let s = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_average(&s, 3);
        assert_eq!(out, vec![1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_moving_average_empty() {
        assert!(moving_average(&[], 7).is_empty());
    }
}
