//! AuthWatch -- host-level SSH authentication anomaly detection.
//!
//! This crate parses authentication logs into failed-login events,
//! thresholds per-source counts into brute-force suspects, aggregates
//! failures per calendar day, smooths the daily trend, classifies it into
//! severity bands, and publishes status snapshots with a bounded history.

pub mod api;
pub mod config;
pub mod detect;
pub mod parser;
pub mod scheduler;
pub mod source;
pub mod status;
pub mod storage;

use anyhow::Result;

use crate::config::Config;

/// Start the AuthWatch daemon: API server plus the periodic scan scheduler.
pub async fn serve(bind: &str, config: Config) -> Result<()> {
    // 1. Storage
    tracing::info!(db_path = %config.db_path, "Initializing database");
    let pool = storage::open_pool(&config.db_path)?;

    // 2. Scheduler (background task)
    let scheduler_pool = pool.clone();
    let scheduler_config = config.clone();
    tokio::spawn(async move {
        scheduler::run_scheduler_loop(scheduler_pool, scheduler_config).await;
    });

    // 3. API server
    let addr: std::net::SocketAddr = bind.parse()?;
    let app = api::router(api::state::AppState { pool, config });

    tracing::info!(%addr, "AuthWatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
