//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use wastehub_auth::SessionVerifier;
use wastehub_core::config::AppConfig;
use wastehub_database::Stores;
use wastehub_realtime::RealtimeEngine;
use wastehub_service::{NotificationService, RateLimitGuard, TaskService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// Every field is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Store backend
    pub stores: Stores,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer and handshake token verification
    pub verifier: Arc<dyn SessionVerifier>,
    /// Tiered rate limit guard
    pub rate_limiter: Arc<RateLimitGuard>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,

    // ── Services ─────────────────────────────────────────────
    /// Pickup task service
    pub task_service: TaskService,
    /// Notification service
    pub notification_service: NotificationService,
}
