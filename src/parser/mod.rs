//! Ingestion: raw auth.log/journal lines and pre-aggregated daily summaries.

pub mod authlog;
pub mod summary;

use chrono::NaiveDate;
use thiserror::Error;

/// One failed authentication attempt extracted from a log line.
///
/// `source` is never empty: a line without an extractable source identifier
/// produces no event at all. `when` is present only when the line carries a
/// parseable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEvent {
    pub source: String,
    pub when: Option<NaiveDate>,
}

/// Unexpected internal parser faults. Unmatched or malformed lines are not
/// faults (they yield `Ok(None)`); this exists so the rare genuine failure
/// is inspectable instead of being swallowed.
#[derive(Debug, Error)]
pub enum ParseFault {
    #[error("line exceeds maximum length ({len} > {max})")]
    LineTooLong { len: usize, max: usize },
}
