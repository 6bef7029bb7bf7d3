//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters. All counters only grow.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Sessions registered
    connections_opened: AtomicU64,
    /// Sessions unregistered
    connections_closed: AtomicU64,
    /// Sessions closed to make room for a newer one of the same user
    sessions_evicted: AtomicU64,
    /// Sessions removed by the heartbeat reaper
    sessions_reaped: AtomicU64,
    /// Inbound frames processed
    frames_received: AtomicU64,
    /// Events pushed through the dispatcher
    events_dispatched: AtomicU64,
    /// Frames queued to sessions
    deliveries: AtomicU64,
    /// Frames dropped on full or closed queues
    dropped_deliveries: AtomicU64,
    /// `new_notification` frames pushed
    notifications_pushed: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new session
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed session
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an eviction
    pub fn session_evicted(&self) {
        self.sessions_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reaped session
    pub fn session_reaped(&self) {
        self.sessions_reaped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound frame
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one dispatched event and its per-session outcome
    pub fn event_dispatched(&self, delivered: u64, dropped: u64) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.dropped_deliveries.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Record a direct frame (replies, pings) to one session
    pub fn frame_sent(&self, delivered: bool) {
        if delivered {
            self.deliveries.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped_deliveries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record live notification pushes
    pub fn notifications_pushed(&self, count: u64) {
        self.notifications_pushed.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters plus current gauges
    pub fn snapshot(&self, active_sessions: usize, connected_users: usize, rooms: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            active_sessions: active_sessions as u64,
            connected_users: connected_users as u64,
            rooms: rooms as u64,
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            sessions_reaped: self.sessions_reaped.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            notifications_pushed: self.notifications_pushed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Live sessions
    pub active_sessions: u64,
    /// Users with at least one live session
    pub connected_users: u64,
    /// Non-empty rooms
    pub rooms: u64,
    /// Sessions ever registered
    pub connections_opened: u64,
    /// Sessions ever unregistered
    pub connections_closed: u64,
    /// Sessions evicted by the per-user ceiling
    pub sessions_evicted: u64,
    /// Sessions reaped for missed pongs
    pub sessions_reaped: u64,
    /// Inbound frames processed
    pub frames_received: u64,
    /// Events dispatched
    pub events_dispatched: u64,
    /// Frames queued
    pub deliveries: u64,
    /// Frames dropped
    pub dropped_deliveries: u64,
    /// Live notification pushes
    pub notifications_pushed: u64,
}
