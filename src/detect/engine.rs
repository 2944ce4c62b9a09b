//! One-shot scan orchestration: lines in, classified report out.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::detect::bruteforce::SourceCounter;
use crate::detect::trend::moving_average;
use crate::detect::{classify, Severity};
use crate::parser::authlog::AuthLogParser;
use crate::source::LogSource;
use crate::status::history::HistoryStore;
use crate::status::{SnapshotBuilder, StatusSnapshot};
use crate::storage::Pool;

/// Outcome of one detection run. Immutable once produced.
#[derive(Debug)]
pub struct ScanReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total_failures: u64,
    /// Per-source counts, highest first.
    pub per_source: Vec<(String, u64)>,
    pub suspects: Vec<String>,
    /// Failures per calendar day, from events that carried a timestamp.
    pub daily: BTreeMap<NaiveDate, u64>,
    /// Trailing moving average aligned with `daily` in date order.
    pub smoothed: Vec<f64>,
    /// Latest day's `(date, count)`, when any event was dated.
    pub latest: Option<(NaiveDate, u64)>,
    /// Severity of the latest day's count; unknown when nothing was dated.
    pub severity: Option<Severity>,
}

impl ScanReport {
    /// Terminal rendering, also used as the snapshot's stdout tail.
    pub fn summary_text(&self) -> String {
        let mut out = String::new();
        out.push_str("SSH failed login attempts by source\n");
        out.push_str("-----------------------------------\n");
        if self.per_source.is_empty() {
            out.push_str("(no failed attempts found)\n");
        }
        for (source, count) in &self.per_source {
            out.push_str(&format!("{source}: {count} attempts\n"));
        }
        if !self.suspects.is_empty() {
            out.push_str(&format!(
                "\nPossible brute force activity from: {}\n",
                self.suspects.join(", ")
            ));
        } else {
            out.push_str("\nNo brute force patterns detected.\n");
        }
        if let (Some((date, count)), Some(severity)) = (self.latest, self.severity) {
            out.push_str(&format!("\nLatest day {date}: {count} failures ({severity})\n"));
        }
        out
    }
}

/// Detection engine for a single synchronous scan. Holds configuration
/// only; all counters are built fresh inside [`ScanEngine::analyze`], so
/// concurrent invocations share nothing.
pub struct ScanEngine {
    config: Config,
    parser: AuthLogParser,
}

impl ScanEngine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: AuthLogParser::new(),
        }
    }

    /// Run the full pipeline over one batch of raw lines.
    pub fn analyze(&self, lines: &[String]) -> ScanReport {
        let started_at = Utc::now();
        let events = self.parser.parse_lines(lines.iter().map(String::as_str));

        let mut counter = SourceCounter::new();
        counter.observe_all(&events);

        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for event in &events {
            if let Some(date) = event.when {
                *daily.entry(date).or_insert(0) += 1;
            }
        }

        let series: Vec<f64> = daily.values().map(|&c| c as f64).collect();
        let smoothed = moving_average(&series, self.config.smoothing_window);

        let latest = daily.iter().next_back().map(|(d, c)| (*d, *c));
        let severity = latest.map(|(_, count)| classify(count, &self.config.thresholds));

        ScanReport {
            id: Uuid::new_v4(),
            started_at,
            total_failures: counter.total(),
            suspects: counter.suspects(self.config.suspect_threshold),
            per_source: counter.ranked(),
            daily,
            smoothed,
            latest,
            severity,
        }
    }

    /// Process exit code for a report: clean, or the configured warn code
    /// when suspects were found. Hard errors never reach this point.
    pub fn exit_code(&self, report: &ScanReport) -> i32 {
        if report.suspects.is_empty() {
            0
        } else {
            self.config.warn_exit_code
        }
    }
}

/// Read one batch from `source`, analyze it, and persist both the scan row
/// and a status snapshot.
pub async fn run_scan(
    pool: &Pool,
    config: &Config,
    source: &dyn LogSource,
) -> Result<(ScanReport, StatusSnapshot)> {
    info!(source = %source.describe(), "starting detection scan");
    let lines = source.lines().await?;
    info!(lines = lines.len(), "fetched log batch");

    let engine = ScanEngine::new(config.clone());
    let report = engine.analyze(&lines);
    if !report.suspects.is_empty() {
        warn!(suspects = report.suspects.len(), "brute-force suspects found");
    }

    let snapshot = SnapshotBuilder::new(config.tail_lines).build(
        report.severity,
        Some(engine.exit_code(&report)),
        None,
        &report.summary_text(),
        "",
    );

    record_scan(pool, &report)?;
    HistoryStore::new(pool.clone(), config.history_capacity).record(&snapshot)?;

    Ok((report, snapshot))
}

fn record_scan(pool: &Pool, report: &ScanReport) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO scans (id, total_failures, suspect_count, severity, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            report.id.to_string(),
            report.total_failures as i64,
            report.suspects.len() as i64,
            report.severity.map(|s| s.to_string()),
            report.started_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}
