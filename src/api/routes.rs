//! API route definitions.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::detect::engine::run_scan;
use crate::scheduler::default_source;
use crate::status::history::{HistoryRecord, HistoryStore};
use crate::storage::{automation_enabled, set_automation_enabled};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(latest_status))
        .route("/history", get(history))
        .route("/scan", post(trigger_scan))
        .route("/automation", get(automation_state).put(set_automation))
}

fn meta() -> Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": { "status": "ok", "version": env!("CARGO_PKG_VERSION") },
        "meta": meta()
    }))
}

/// Latest snapshot as the flat record the front-end contract expects;
/// unknown fields stay explicit nulls.
async fn latest_status(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let store = HistoryStore::new(state.pool.clone(), state.config.history_capacity);
    let latest = store
        .latest()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match latest {
        Some(snapshot) => Ok(Json(json!({ "data": snapshot, "meta": meta() }))),
        None => Ok(Json(
            json!({ "data": null, "meta": { "message": "no runs recorded yet" } }),
        )),
    }
}

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, StatusCode> {
    let limit = params.limit.unwrap_or(state.config.history_capacity);
    let store = HistoryStore::new(state.pool.clone(), state.config.history_capacity);
    let records = store
        .recent(limit)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entries: Vec<Value> = records
        .into_iter()
        .map(|record| match record {
            HistoryRecord::Ok(snapshot) => json!(snapshot),
            HistoryRecord::Corrupt { id, error } => json!({
                "id": id,
                "error": format!("{id}: ERROR: {error}")
            }),
        })
        .collect();

    let total = entries.len();
    Ok(Json(json!({ "data": entries, "meta": { "total": total } })))
}

async fn trigger_scan(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let source = default_source(&state.config);
    let (report, snapshot) = run_scan(&state.pool, &state.config, source.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("scan via API failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(json!({
        "data": {
            "scan_id": report.id,
            "total_failures": report.total_failures,
            "suspects": report.suspects,
            "severity": report.severity,
            "snapshot": snapshot
        },
        "meta": meta()
    })))
}

async fn automation_state(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let enabled =
        automation_enabled(&state.pool).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(json!({ "data": { "enabled": enabled }, "meta": meta() })))
}

#[derive(Deserialize)]
struct AutomationBody {
    enabled: bool,
}

async fn set_automation(
    State(state): State<AppState>,
    Json(body): Json<AutomationBody>,
) -> Result<Json<Value>, StatusCode> {
    set_automation_enabled(&state.pool, body.enabled)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(
        json!({ "data": { "enabled": body.enabled }, "meta": meta() }),
    ))
}
