//! Route definitions for the WasteHub HTTP API.
//!
//! Routes are grouped by rate-limit tier; every group is wrapped in exactly
//! one tier layer and mounted under `/api`. The WebSocket upgrade lives at
//! `/ws` and is charged to the auth tier, so failed handshakes count.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use wastehub_service::RateLimitTier;

use crate::handlers;
use crate::middleware::rate_limit::{TierState, enforce};
use crate::state::AppState;

/// Build the complete Axum router.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(tiered(&state, RateLimitTier::General, general_routes()))
        .merge(tiered(&state, RateLimitTier::Auth, auth_routes()))
        .merge(tiered(&state, RateLimitTier::Read, read_routes()))
        .merge(tiered(&state, RateLimitTier::Write, write_routes()))
        .merge(tiered(&state, RateLimitTier::Upload, upload_routes()));

    let ws_routes = tiered(
        &state,
        RateLimitTier::Auth,
        Router::new().route("/ws", get(handlers::ws::ws_upgrade)),
    );

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

fn tiered(
    state: &AppState,
    tier: RateLimitTier,
    routes: Router<AppState>,
) -> Router<AppState> {
    routes.route_layer(axum_middleware::from_fn_with_state(
        TierState::new(state, tier),
        enforce,
    ))
}

/// Health and admin monitoring
fn general_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/admin/realtime", get(handlers::admin::realtime_metrics))
}

/// Token verification; only failures are charged
fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/verify", post(handlers::auth::verify_token))
}

/// Task, notification, and chat reads
fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(handlers::task::list_tasks))
        .route("/tasks/{id}", get(handlers::task::get_task))
        .route("/tasks/{id}/history", get(handlers::task::task_history))
        .route("/notifications", get(handlers::notification::list_notifications))
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/chat/rooms/{room}/messages",
            get(handlers::chat::room_messages),
        )
}

/// Task actions, notification edits, and admin broadcasts
fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(handlers::task::assign_task))
        .route("/tasks/{id}/start", post(handlers::task::start_task))
        .route("/tasks/{id}/complete", post(handlers::task::complete_task))
        .route("/tasks/{id}/cancel", post(handlers::task::cancel_task))
        .route("/tasks/{id}/reschedule", post(handlers::task::reschedule_task))
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route("/notifications/{id}/read", put(handlers::notification::mark_read))
        .route(
            "/notifications/{id}",
            delete(handlers::notification::delete_notification),
        )
        .route("/notifications", delete(handlers::notification::clear_all))
        .route("/admin/alerts", post(handlers::admin::emergency_alert))
        .route(
            "/admin/applications/{id}/decision",
            post(handlers::admin::decide_application),
        )
        .route("/admin/announcements", post(handlers::admin::announcement))
}

/// Task image attachment
fn upload_routes() -> Router<AppState> {
    Router::new().route("/tasks/{id}/images", post(handlers::task::attach_images))
}
