//! Axum router construction for the simulator API.
//!
//! Assembles management routes, monitor routes, the `WebSocket` feed and
//! the dynamic endpoint fallback into a single [`Router`] with CORS and
//! HTTP tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatch;
use crate::handlers;
use crate::recorder;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /ws/requests` -- `WebSocket` transaction feed
/// - `GET|POST /api/systems` -- list or register systems
/// - `GET /api/systems/{id}` -- single system
/// - `GET /api/systems/{id}/modules` -- modules with endpoint summaries
/// - `PUT /api/systems/{id}/parameters` -- replace connection parameters
/// - `GET /api/health` -- per-system health
/// - `GET|DELETE /api/monitor/requests` -- read or clear the request log
/// - `GET /api/monitor/stats` -- monitor statistics
/// - anything else under `/api/{systemId}/{moduleId}` -- dynamic endpoints
///
/// Every route except the monitor and feed is recorded to the request
/// monitor.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/requests", get(ws::ws_requests))
        // Registry management
        .route(
            "/api/systems",
            get(handlers::list_systems).post(handlers::register_system),
        )
        .route("/api/systems/{id}", get(handlers::get_system))
        .route("/api/systems/{id}/modules", get(handlers::get_modules))
        .route("/api/systems/{id}/parameters", put(handlers::update_parameters))
        .route("/api/health", get(handlers::health))
        // Monitor
        .route(
            "/api/monitor/requests",
            get(handlers::recent_requests).delete(handlers::clear_requests),
        )
        .route("/api/monitor/stats", get(handlers::monitor_stats))
        // Simulated systems
        .fallback(dispatch::dispatch)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            recorder::record_transaction,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
