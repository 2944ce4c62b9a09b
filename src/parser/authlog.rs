//! Failure extraction from raw sshd log lines.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use super::{FailureEvent, ParseFault};

/// Lines longer than this are treated as an internal fault rather than fed
/// through the matcher. Real auth.log lines are a few hundred bytes.
const MAX_LINE_LEN: usize = 64 * 1024;

/// Extracts [`FailureEvent`]s from sshd log lines.
///
/// The source pattern is intentionally permissive: four dot-separated 1-3
/// digit groups, with no per-octet range check. Matching is "fail open" --
/// unrelated, malformed, or truncated lines (including a partial final line
/// of a log that is being appended to concurrently) simply produce no event.
pub struct AuthLogParser {
    failed: Regex,
    // Sep 12 10:41:02 host sshd[1234]: ...
    syslog_ts: Regex,
    // 2024-09-12T10:41:02.123456+02:00 host sshd[1234]: ...
    iso_ts: Regex,
}

impl Default for AuthLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthLogParser {
    pub fn new() -> Self {
        Self {
            failed: Regex::new(
                r"Failed password.*from ([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})",
            )
            .unwrap(),
            syslog_ts: Regex::new(r"^([A-Z][a-z]{2})\s+(\d{1,2})\s+\d{2}:\d{2}:\d{2}").unwrap(),
            iso_ts: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[T ]").unwrap(),
        }
    }

    /// Parse one raw line. `Ok(None)` means "not a failed-login line" and is
    /// the common case; `Err` is reserved for internal faults the caller
    /// should log before skipping the line anyway.
    pub fn parse_line(&self, line: &str) -> Result<Option<FailureEvent>, ParseFault> {
        if line.len() > MAX_LINE_LEN {
            return Err(ParseFault::LineTooLong {
                len: line.len(),
                max: MAX_LINE_LEN,
            });
        }

        let caps = match self.failed.captures(line) {
            Some(c) => c,
            None => return Ok(None),
        };
        let source = caps[1].to_string();

        Ok(Some(FailureEvent {
            source,
            when: self.line_date(line),
        }))
    }

    /// Parse every line of a batch, skipping non-matches and logging faults.
    pub fn parse_lines<'a, I>(&self, lines: I) -> Vec<FailureEvent>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut events = Vec::new();
        for line in lines {
            match self.parse_line(line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(fault) => {
                    tracing::warn!(%fault, "skipping unparseable line");
                }
            }
        }
        events
    }

    /// Best-effort calendar date from the line prefix. Syslog timestamps
    /// carry no year: assume the current year unless that lands in the
    /// future (a December line read in early January), then back off one
    /// year.
    fn line_date(&self, line: &str) -> Option<NaiveDate> {
        if let Some(caps) = self.iso_ts.captures(line) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        if let Some(caps) = self.syslog_ts.captures(line) {
            let month = month_number(&caps[1])?;
            let day: u32 = caps[2].parse().ok()?;
            let today = Local::now().date_naive();
            let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if candidate > today {
                return NaiveDate::from_ymd_opt(today.year() - 1, month, day);
            }
            return Some(candidate);
        }

        None
    }
}

fn month_number(abbr: &str) -> Option<u32> {
    match abbr {
        "Jan" => Some(1),
        "Feb" => Some(2),
        "Mar" => Some(3),
        "Apr" => Some(4),
        "May" => Some(5),
        "Jun" => Some(6),
        "Jul" => Some(7),
        "Aug" => Some(8),
        "Sep" => Some(9),
        "Oct" => Some(10),
        "Nov" => Some(11),
        "Dec" => Some(12),
        _ => None,
    }
}
