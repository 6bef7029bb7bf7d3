//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use wastehub_auth::SessionVerifier;
use wastehub_core::config::realtime::RealtimeConfig;
use wastehub_entity::event::DomainEvent;
use wastehub_service::{ChatService, NotificationService, RateLimitGuard, TaskService};

use crate::channel::registry::RoomRegistry;
use crate::channel::room::AreaGrid;
use crate::connection::gateway::{GatewayParts, SessionGateway};
use crate::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use crate::connection::pool::SessionPool;
use crate::dispatch::{DispatchReport, EventDispatcher};
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::notification::NotificationFanout;

/// Services the engine needs from the layers below.
#[derive(Debug, Clone)]
pub struct RealtimeServices {
    /// Handshake token verification.
    pub verifier: Arc<dyn SessionVerifier>,
    /// Task lookups for task-room access.
    pub tasks: TaskService,
    /// Chat persistence and history.
    pub chat: ChatService,
    /// Notification projection and storage.
    pub notifications: NotificationService,
    /// Rate limit guard shared with the HTTP layer.
    pub guard: Arc<RateLimitGuard>,
}

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Session gateway.
    pub gateway: Arc<SessionGateway>,
    /// Event dispatcher.
    pub dispatcher: Arc<EventDispatcher>,
    /// Notification fan-out.
    pub fanout: Arc<NotificationFanout>,
    /// Room registry.
    pub rooms: Arc<RoomRegistry>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    pool: Arc<SessionPool>,
    notifications: NotificationService,
    guard: Arc<RateLimitGuard>,
    config: RealtimeConfig,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("sessions", &self.pool.session_count())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: &RealtimeConfig, services: RealtimeServices) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let pool = Arc::new(SessionPool::new());
        let rooms = Arc::new(RoomRegistry::new(config));
        let dispatcher = Arc::new(EventDispatcher::new(
            pool.clone(),
            rooms.clone(),
            AreaGrid::new(config.area_precision),
            metrics.clone(),
        ));
        let fanout = Arc::new(NotificationFanout::new(
            services.notifications.clone(),
            dispatcher.clone(),
            metrics.clone(),
        ));
        let gateway = Arc::new(SessionGateway::new(
            config,
            services.verifier,
            services.tasks,
            services.chat,
            GatewayParts {
                pool: pool.clone(),
                rooms: rooms.clone(),
                dispatcher: dispatcher.clone(),
                metrics: metrics.clone(),
                guard: services.guard.clone(),
            },
        ));

        info!(
            area_precision = config.area_precision,
            max_connections_per_user = config.max_connections_per_user,
            "Real-time engine initialized"
        );

        Self {
            gateway,
            dispatcher,
            fanout,
            rooms,
            metrics,
            pool,
            notifications: services.notifications,
            guard: services.guard,
            config: config.clone(),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Deliver a domain event: push it live, then store and push the
    /// notifications it implies.
    ///
    /// Notification failures are logged; the change that produced the event
    /// is already committed.
    pub async fn publish(&self, event: &DomainEvent) -> DispatchReport {
        let report = self.dispatcher.dispatch(event);
        if let Err(e) = self.fanout.fan_out(event).await {
            error!(event_id = %event.id, event = event.name(), error = %e, "Notification fan-out failed");
        }
        report
    }

    /// Counters plus current gauges.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(
            self.pool.session_count(),
            self.pool.user_count(),
            self.rooms.room_count(),
        )
    }

    /// Spawn the heartbeat reaper, the notification purge, and the rate
    /// limit sweep. They stop on [`shutdown`](Self::shutdown).
    pub fn start_maintenance(&self, rate_limit_sweep: Duration) {
        self.tracker.spawn(run_heartbeat(
            self.gateway.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_secs(self.config.ping_interval_seconds.max(1)),
                pong_timeout: Duration::from_secs(self.config.pong_timeout_seconds.max(1)),
            },
            self.shutdown.clone(),
        ));

        let notifications = self.notifications.clone();
        let purge_every = Duration::from_secs(self.config.notifications.purge_interval_seconds.max(1));
        let shutdown = self.shutdown.clone();
        self.tracker.spawn(async move {
            let mut interval = tokio::time::interval(purge_every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = notifications.purge_expired().await {
                            warn!(error = %e, "Notification purge failed");
                        }
                    }
                }
            }
        });

        let guard = self.guard.clone();
        let shutdown = self.shutdown.clone();
        self.tracker.spawn(async move {
            let mut interval = tokio::time::interval(rate_limit_sweep.max(Duration::from_secs(1)));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        guard.sweep();
                    }
                }
            }
        });

        info!("Real-time maintenance tasks started");
    }

    /// Token cancelled when the engine shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop background tasks and close every session.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.shutdown.cancel();
        self.gateway.close_all();
        self.tracker.close();
        self.tracker.wait().await;
        info!("Real-time engine shut down");
    }
}
