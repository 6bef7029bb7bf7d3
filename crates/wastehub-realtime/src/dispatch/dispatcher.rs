//! Resolves an event's rooms and pushes it to every member session.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use wastehub_entity::event::DomainEvent;

use crate::channel::registry::RoomRegistry;
use crate::channel::resolver::resolve_rooms_for_event;
use crate::channel::room::{AreaGrid, RoomId};
use crate::connection::handle::Delivery;
use crate::connection::pool::SessionPool;
use crate::message::builder::{encode, event_message};
use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Rooms resolved.
    pub rooms: usize,
    /// Distinct sessions targeted.
    pub sessions: usize,
    /// Frames queued.
    pub delivered: usize,
    /// Frames dropped on full or closed queues.
    pub dropped: usize,
}

/// Fire-and-forget delivery over bounded per-session queues.
///
/// A session in several target rooms receives the frame once. One slow or
/// dead session never holds up the others.
#[derive(Debug)]
pub struct EventDispatcher {
    pool: Arc<SessionPool>,
    rooms: Arc<RoomRegistry>,
    grid: AreaGrid,
    metrics: Arc<RealtimeMetrics>,
}

impl EventDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        pool: Arc<SessionPool>,
        rooms: Arc<RoomRegistry>,
        grid: AreaGrid,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            pool,
            rooms,
            grid,
            metrics,
        }
    }

    /// `dispatch(event)`: resolve rooms, then push the event's message.
    pub fn dispatch(&self, event: &DomainEvent) -> DispatchReport {
        let rooms = resolve_rooms_for_event(event, &self.grid);
        let report = self.push_to_rooms(&rooms, &event_message(event));
        debug!(
            event_id = %event.id,
            event = event.name(),
            rooms = report.rooms,
            sessions = report.sessions,
            delivered = report.delivered,
            dropped = report.dropped,
            "Event dispatched"
        );
        report
    }

    /// Push one message to every session in `rooms`, each at most once.
    pub fn push_to_rooms(&self, rooms: &[RoomId], message: &OutboundMessage) -> DispatchReport {
        let frame = match encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize outbound message");
                return DispatchReport::default();
            }
        };

        let mut seen = HashSet::new();
        let mut report = DispatchReport {
            rooms: rooms.len(),
            ..DispatchReport::default()
        };
        for room in rooms {
            for conn_id in self.rooms.members(room) {
                if !seen.insert(conn_id) {
                    continue;
                }
                let Some(handle) = self.pool.get(&conn_id) else {
                    continue;
                };
                report.sessions += 1;
                match handle.send(frame.clone()) {
                    Delivery::Queued => report.delivered += 1,
                    Delivery::Full | Delivery::Closed => report.dropped += 1,
                }
            }
        }

        self.metrics
            .event_dispatched(report.delivered as u64, report.dropped as u64);
        report
    }
}
