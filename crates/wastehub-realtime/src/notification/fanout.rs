//! Stores the notifications an event implies and pushes each one live.

use std::sync::Arc;

use tracing::debug;

use wastehub_core::result::AppResult;
use wastehub_entity::event::DomainEvent;
use wastehub_entity::notification::Notification;
use wastehub_service::NotificationService;

use crate::channel::room::RoomId;
use crate::dispatch::EventDispatcher;
use crate::message::builder::notification_message;
use crate::metrics::RealtimeMetrics;

/// Notification fan-out.
///
/// Records are written whether or not the recipient is online; the live
/// `new_notification` push is a courtesy on top.
#[derive(Debug)]
pub struct NotificationFanout {
    notifications: NotificationService,
    dispatcher: Arc<EventDispatcher>,
    metrics: Arc<RealtimeMetrics>,
}

impl NotificationFanout {
    /// Creates a new fan-out.
    pub fn new(
        notifications: NotificationService,
        dispatcher: Arc<EventDispatcher>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            notifications,
            dispatcher,
            metrics,
        }
    }

    /// Persist, then push `new_notification` to each recipient's user room.
    ///
    /// Returns the notifications created by this call.
    pub async fn fan_out(&self, event: &DomainEvent) -> AppResult<Vec<Notification>> {
        let created = self.notifications.record(event).await?;
        for notification in &created {
            let report = self.dispatcher.push_to_rooms(
                &[RoomId::User(notification.user_id)],
                &notification_message(notification),
            );
            debug!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                live_sessions = report.delivered,
                "Notification pushed"
            );
        }
        self.metrics.notifications_pushed(created.len() as u64);
        Ok(created)
    }
}
