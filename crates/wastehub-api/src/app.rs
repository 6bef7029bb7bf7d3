//! Application builder: wires stores, services, and the realtime engine
//! into an [`AppState`], and serves the router with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use wastehub_auth::{JwtSessionVerifier, SessionVerifier};
use wastehub_core::config::AppConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_database::Stores;
use wastehub_realtime::RealtimeEngine;
use wastehub_realtime::server::RealtimeServices;
use wastehub_service::{
    ChatService, DirectoryService, NotificationService, RateLimitGuard, TaskService,
};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Connect the configured store backend and assemble the state.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    info!(backend = ?config.database.backend, "Initializing stores");
    let stores = Stores::from_config(&config.database).await?;
    Ok(assemble_state(config, stores))
}

/// Assemble services and the realtime engine over existing stores.
pub fn assemble_state(config: AppConfig, stores: Stores) -> AppState {
    // ── Step 1: Auth and rate limiting ───────────────────────────
    let verifier: Arc<dyn SessionVerifier> = Arc::new(JwtSessionVerifier::new(&config.auth));
    let rate_limiter = Arc::new(RateLimitGuard::new(&config.rate_limit, config.environment));

    // ── Step 2: Services ─────────────────────────────────────────
    let directory = DirectoryService::new(
        stores.reports.clone(),
        stores.users.clone(),
        &config.directory,
    );
    let task_service = TaskService::new(stores.tasks.clone(), directory);
    let notification_service =
        NotificationService::new(stores.notifications.clone(), &config.realtime.notifications);
    let chat_service = ChatService::new(stores.chat.clone(), &config.realtime);

    // ── Step 3: Realtime engine ──────────────────────────────────
    let realtime = Arc::new(RealtimeEngine::new(
        &config.realtime,
        RealtimeServices {
            verifier: verifier.clone(),
            tasks: task_service.clone(),
            chat: chat_service,
            notifications: notification_service.clone(),
            guard: rate_limiter.clone(),
        },
    ));

    AppState {
        config: Arc::new(config),
        stores,
        verifier,
        rate_limiter,
        realtime,
        task_service,
        notification_service,
    }
}

/// Serve `state` until Ctrl+C or SIGTERM, then close every WebSocket and
/// give in-flight requests `shutdown_grace_seconds` to finish.
pub async fn run_server(state: AppState) -> AppResult<()> {
    let config = state.config.clone();
    let engine = state.realtime.clone();
    let db = state.stores.pool.clone();
    engine.start_maintenance(Duration::from_secs(
        config.rate_limit.sweep_interval_seconds,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!("WasteHub server listening on {}", addr);

    let stop = engine.shutdown_token();
    let app = build_app(state);
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
    });

    tokio::select! {
        joined = &mut server => return flatten(joined),
        _ = shutdown_signal() => {}
    }

    info!("Shutdown signal received");
    engine.shutdown().await;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let result = match tokio::time::timeout(grace, server).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
            Ok(())
        }
    };

    if let Some(db) = db {
        db.close().await;
    }
    result
}

fn flatten(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> AppResult<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::internal(format!("Server error: {e}"))),
        Err(e) => Err(AppError::internal(format!("Server task failed: {e}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
