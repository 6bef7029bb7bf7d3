//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wastehub_core::types::{EventId, NotificationId, UserId};

use super::kind::{NotificationPriority, NotificationType};

/// A durable, per-user record derived from a domain event.
///
/// There is at most one notification per `(user_id, event_id)`, and
/// `is_read` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// The domain event this notification was projected from.
    pub event_id: EventId,
    /// Notification type.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Additional structured data (JSON).
    pub payload: Option<serde_json::Value>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification stops being listed or counted.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Check if the notification has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Whether the notification counts towards the unread badge at `now`.
    pub fn counts_as_unread(&self, now: DateTime<Utc>) -> bool {
        !self.is_read && !self.is_expired_at(now)
    }
}

/// A projected notification before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Notification type.
    pub notification_type: NotificationType,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Priority.
    pub priority: NotificationPriority,
    /// Structured data for the client.
    pub payload: Option<serde_json::Value>,
}

impl NewNotification {
    /// Materialize the record for `event_id`, created at `now`.
    pub fn into_notification(
        self,
        event_id: EventId,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Notification {
        Notification {
            id: NotificationId::new(),
            user_id: self.user_id,
            event_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            priority: self.priority,
            payload: self.payload,
            is_read: false,
            read_at: None,
            created_at: now,
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expires_at: Option<DateTime<Utc>>) -> Notification {
        NewNotification {
            user_id: UserId::new(),
            notification_type: NotificationType::TaskStarted,
            title: "Pickup started".into(),
            message: "The collector is on the way".into(),
            priority: NotificationPriority::Normal,
            payload: None,
        }
        .into_notification(EventId::new(), Utc::now(), expires_at)
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = sample(None);
        assert!(!n.is_read);
        assert!(n.counts_as_unread(Utc::now()));
    }

    #[test]
    fn test_expired_does_not_count() {
        let now = Utc::now();
        let n = sample(Some(now - Duration::seconds(1)));
        assert!(n.is_expired_at(now));
        assert!(!n.counts_as_unread(now));
    }

    #[test]
    fn test_type_serializes_as_type_field() {
        let json = serde_json::to_value(sample(None)).unwrap();
        assert_eq!(json["type"], "task_started");
    }
}
