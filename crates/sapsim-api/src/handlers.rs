//! Management and monitor endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/systems` | List registered systems |
//! | `POST` | `/api/systems` | Register or replace a system |
//! | `GET` | `/api/systems/{id}` | Single system |
//! | `GET` | `/api/systems/{id}/modules` | Modules with endpoint summaries |
//! | `PUT` | `/api/systems/{id}/parameters` | Replace connection parameters |
//! | `GET` | `/api/health` | Per-system health |
//! | `GET` | `/api/monitor/requests` | Recent transactions, newest first |
//! | `DELETE` | `/api/monitor/requests` | Clear the request log |
//! | `GET` | `/api/monitor/stats` | Log size, observers and counters |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::Utc;
use sapsim_core::SystemDefinition;
use sapsim_types::{ModuleInfo, SystemInfo};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Entries returned by `GET /api/monitor/requests` without `count`.
pub const DEFAULT_RECENT_COUNT: usize = 100;

/// Query parameters for `GET /api/monitor/requests`.
#[derive(Debug, serde::Deserialize)]
pub struct RecentQuery {
    /// Maximum number of entries to return.
    pub count: Option<usize>,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// List every registered system.
pub async fn list_systems(State(state): State<Arc<AppState>>) -> Json<Vec<SystemInfo>> {
    Json(
        state
            .registry
            .get_all_systems()
            .iter()
            .map(|system| system.info())
            .collect(),
    )
}

/// Return one system.
pub async fn get_system(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SystemInfo>, ApiError> {
    state
        .registry
        .get_system(&id)
        .map(|system| Json(system.info()))
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))
}

/// Return the modules of one system with their endpoint summaries.
pub async fn get_modules(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ModuleInfo>>, ApiError> {
    let modules = state
        .registry
        .get_modules_for_system(&id)
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))?;
    Ok(Json(modules.iter().map(|module| module.info()).collect()))
}

/// Register a system, replacing any system with the same id.
///
/// Responds `201 Created` with a `Location` header. An ambiguous endpoint
/// pair is rejected with `409 Conflict` and leaves the registry untouched.
pub async fn register_system(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SystemDefinition>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(definition) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let system = definition.build()?;
    let info = system.info();
    state.registry.register_system(system)?;
    info!(system_id = %info.id, modules = definition.modules.len(), "System registered over HTTP");

    let location = format!("/api/systems/{}", info.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(info),
    ))
}

/// Replace the connection parameters of a system.
pub async fn update_parameters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<BTreeMap<String, String>>, JsonRejection>,
) -> Result<Json<SystemInfo>, ApiError> {
    let Json(parameters) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let system = state.registry.update_parameters(&id, parameters)?;
    Ok(Json(system.info()))
}

/// Probe every system and report its health.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let systems = state.registry.get_system_health_status(&state.data).await;
    let status = if systems.values().all(|ok| *ok) { "healthy" } else { "degraded" };
    Json(serde_json::json!({
        "status": status,
        "data_provider": state.data.name(),
        "systems": systems,
    }))
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Return up to `count` recent transactions, newest first.
pub async fn recent_requests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentQuery>,
) -> impl IntoResponse {
    let count = params.count.unwrap_or(DEFAULT_RECENT_COUNT);
    Json(state.monitor.get_recent_requests(count))
}

/// Empty the request log.
pub async fn clear_requests(State(state): State<Arc<AppState>>) -> StatusCode {
    state.monitor.clear_requests();
    StatusCode::NO_CONTENT
}

/// Report log occupancy, observers and status counters.
pub async fn monitor_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);
    Json(serde_json::json!({
        "retained": state.monitor.get_total_request_count(),
        "max_requests": state.monitor.max_requests(),
        "observers": state.monitor.observer_count(),
        "counters": state.counters.snapshot(),
        "systems": state.registry.len(),
        "uptime_seconds": uptime_seconds,
    }))
}
