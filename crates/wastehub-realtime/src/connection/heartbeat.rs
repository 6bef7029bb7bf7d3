//! Ping/pong heartbeat reaper.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::gateway::SessionGateway;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// A session silent for longer than this is reaped
    pub pong_timeout: Duration,
}

/// Run the heartbeat loop until `shutdown` fires.
///
/// Every tick reaps sessions whose last pong is older than the timeout and
/// pings the rest.
pub async fn run_heartbeat(
    gateway: Arc<SessionGateway>,
    config: HeartbeatConfig,
    shutdown: CancellationToken,
) {
    let mut interval = time::interval(config.ping_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let reaped = gateway.sweep_heartbeats(config.pong_timeout);
                if reaped > 0 {
                    debug!(reaped, "Heartbeat sweep removed sessions");
                }
            }
        }
    }

    debug!("Heartbeat loop ended");
}
