//! Capacity-bounded snapshot history over SQLite.
//!
//! Ordering is always the embedded `created_at` timestamp (id as tiebreak),
//! never storage or filename order. Inserts and evictions share one
//! transaction, so a concurrent reader sees either the old history or the
//! new one, never a half-written entry.

use anyhow::Result;
use rusqlite::params;

use crate::status::StatusSnapshot;
use crate::storage::Pool;

/// One history listing entry. Decoding is per-entry: a corrupt payload
/// becomes an error record and the rest of the listing is unaffected.
#[derive(Debug)]
pub enum HistoryRecord {
    Ok(StatusSnapshot),
    Corrupt { id: String, error: String },
}

impl HistoryRecord {
    /// Diagnostic line for corrupt entries, `<id>: ERROR: <detail>`.
    pub fn describe(&self) -> String {
        match self {
            HistoryRecord::Ok(snap) => format!(
                "{} | status={} rc={} dash={}",
                snap.timestamp.to_rfc3339(),
                snap.status.map(|s| s.to_string()).unwrap_or_else(|| "UNKNOWN".into()),
                snap.runner_rc.map(|rc| rc.to_string()).unwrap_or_else(|| "N/A".into()),
                match snap.dashboard_ok {
                    Some(true) => "OK",
                    Some(false) => "FAIL",
                    None => "N/A",
                },
            ),
            HistoryRecord::Corrupt { id, error } => format!("{id}: ERROR: {error}"),
        }
    }
}

pub struct HistoryStore {
    pool: Pool,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(pool: Pool, capacity: usize) -> Self {
        Self { pool, capacity }
    }

    /// Append a snapshot and evict the oldest entries beyond capacity, in
    /// one transaction.
    pub fn record(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let payload = serde_json::to_string(snapshot)?;
        tx.execute(
            "INSERT INTO snapshots (id, status, runner_rc, dashboard_ok, payload_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                snapshot.id.to_string(),
                snapshot.status.map(|s| s.to_string()),
                snapshot.runner_rc,
                snapshot.dashboard_ok,
                payload,
                snapshot.timestamp.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM snapshots WHERE id NOT IN (
                 SELECT id FROM snapshots ORDER BY created_at DESC, id DESC LIMIT ?1
             )",
            params![self.capacity as i64],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Most recent decodable snapshot. Corrupt newer entries are skipped,
    /// so one bad row degrades the answer to the last good run instead of
    /// "no status at all".
    pub fn latest(&self) -> Result<Option<StatusSnapshot>> {
        Ok(self.recent(self.capacity)?.into_iter().find_map(|r| match r {
            HistoryRecord::Ok(snap) => Some(snap),
            HistoryRecord::Corrupt { .. } => None,
        }))
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, payload_json FROM snapshots
             ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            match serde_json::from_str::<StatusSnapshot>(&payload) {
                Ok(snap) => records.push(HistoryRecord::Ok(snap)),
                Err(e) => records.push(HistoryRecord::Corrupt {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        Ok(records)
    }
}
