//! Periodic scan scheduling.
//!
//! One interval task; each tick is an independent scan with nothing to roll
//! back. The persisted automation flag is re-read every tick, so
//! enable/disable takes effect without restarting the daemon.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::detect::engine::run_scan;
use crate::source::{FileSource, JournalSource, LogSource};
use crate::storage::{automation_enabled, Pool};

/// Pick the scan source: the configured auth log when it exists, the
/// journal otherwise.
pub fn default_source(config: &Config) -> Box<dyn LogSource> {
    let path = std::path::Path::new(&config.scan.log_path);
    if path.exists() {
        Box::new(FileSource::new(path))
    } else {
        Box::new(JournalSource::new(config.scan.unit.clone()))
    }
}

/// Main scheduler loop. Ticks every `scan.interval_secs` and runs one scan
/// per tick while automation is enabled.
pub async fn run_scheduler_loop(pool: Pool, config: Config) {
    info!(
        interval_secs = config.scan.interval_secs,
        "scan scheduler started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.scan.interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // consume the immediate first tick; the first scan happens one full
    // interval after startup
    interval.tick().await;

    loop {
        interval.tick().await;

        match automation_enabled(&pool) {
            Ok(false) => {
                debug!("automation disabled, skipping tick");
                continue;
            }
            Ok(true) => {}
            Err(e) => {
                error!("failed to read automation flag: {e}");
                continue;
            }
        }

        let source = default_source(&config);
        match run_scan(&pool, &config, source.as_ref()).await {
            Ok((report, _)) => {
                info!(
                    scan = %report.id,
                    failures = report.total_failures,
                    suspects = report.suspects.len(),
                    "scheduled scan complete"
                );
            }
            Err(e) => {
                // a failed scan never takes the scheduler down
                error!("scheduled scan failed: {e:#}");
            }
        }
    }
}
