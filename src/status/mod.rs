//! Run-outcome snapshots and their bounded history.

pub mod history;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detect::Severity;

/// Immutable record of one detection run, in the flat shape polled by
/// front-ends. Unknown fields stay `None` and serialize as `null`: "no data
/// yet" must never read as `0` or `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub id: Uuid,
    pub status: Option<Severity>,
    pub timestamp: DateTime<Utc>,
    pub runner_rc: Option<i32>,
    pub dashboard_ok: Option<bool>,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

/// Builds snapshots with output tails bounded to `tail_lines`.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    tail_lines: usize,
}

impl SnapshotBuilder {
    pub fn new(tail_lines: usize) -> Self {
        Self { tail_lines }
    }

    /// Assemble one snapshot. `runner_rc` is stored losslessly; consumers
    /// own its interpretation (0 = clean, warn code = findings, else error).
    pub fn build(
        &self,
        status: Option<Severity>,
        runner_rc: Option<i32>,
        dashboard_ok: Option<bool>,
        stdout: &str,
        stderr: &str,
    ) -> StatusSnapshot {
        StatusSnapshot {
            id: Uuid::new_v4(),
            status,
            timestamp: Utc::now(),
            runner_rc,
            dashboard_ok,
            stdout_tail: tail(stdout, self.tail_lines),
            stderr_tail: tail(stderr, self.tail_lines),
        }
    }
}

/// Last `n` lines of `text`, trailing newline dropped.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_bounds_long_output() {
        let text: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let t = tail(&text, 40);
        assert_eq!(t.lines().count(), 40);
        assert!(t.starts_with("line 60"));
        assert!(t.ends_with("line 99"));
    }

    #[test]
    fn test_tail_short_output_unchanged() {
        assert_eq!(tail("a\nb\n", 40), "a\nb");
        assert_eq!(tail("", 40), "");
    }

    #[test]
    fn test_unknowns_serialize_as_null() {
        let b = SnapshotBuilder::new(40);
        let snap = b.build(None, None, None, "", "");
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"], serde_json::Value::Null);
        assert_eq!(json["runner_rc"], serde_json::Value::Null);
        assert_eq!(json["dashboard_ok"], serde_json::Value::Null);
    }

    #[test]
    fn test_known_fields_roundtrip() {
        let b = SnapshotBuilder::new(40);
        let snap = b.build(Some(Severity::Medium), Some(2), Some(true), "out", "err");
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"], "MEDIUM");
        assert_eq!(json["runner_rc"], 2);
        assert_eq!(json["dashboard_ok"], true);
        assert_eq!(json["stdout_tail"], "out");
    }
}
