//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
///
/// Answers `503` with status `"degraded"` when the PostgreSQL backend does
/// not respond.
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let (backend, reachable) = match &state.stores.pool {
        Some(db) => match db.ping().await {
            Ok(()) => ("postgres", true),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                ("postgres", false)
            }
        },
        None => ("memory", true),
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if reachable { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend.to_string(),
        ws_sessions: state.realtime.metrics_snapshot().active_sessions,
    };
    (status, Json(ApiResponse::ok(body)))
}
