//! Domain events.
//!
//! Every state change the engine reacts to is one [`DomainEvent`]. Task
//! mutations return one from the service layer; the realtime engine
//! resolves its rooms, pushes it, and projects notifications from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wastehub_core::types::{ApplicationId, EventId, UserId};

use crate::chat::ChatMessage;
use crate::task::{TaskSnapshot, TaskStatus};
use crate::user::UserRole;

/// An event with identity, time, and actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique id; notifications are deduplicated on it.
    pub id: EventId,
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
    /// Who caused it. `None` for server-originated events.
    pub actor_id: Option<UserId>,
    /// What happened.
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(actor_id: Option<UserId>, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            occurred_at: Utc::now(),
            actor_id,
            payload,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match &self.payload {
            EventPayload::TaskAssigned { .. } => "task_assigned",
            EventPayload::TaskStatusChanged { .. } => "task_status_changed",
            EventPayload::ChatPosted(_) => "chat_posted",
            EventPayload::ApplicationDecided { .. } => "application_decided",
            EventPayload::EmergencyAlert { .. } => "emergency_alert",
            EventPayload::SystemAnnouncement { .. } => "system_announcement",
        }
    }
}

/// Closed set of event kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// An admin created a task for a report.
    TaskAssigned {
        /// The new task.
        task: TaskSnapshot,
        /// Assignment notes.
        notes: Option<String>,
    },
    /// A task moved along its lifecycle.
    TaskStatusChanged {
        /// The task after the change.
        task: TaskSnapshot,
        /// Status before the change.
        previous: TaskStatus,
        /// The edge taken: `in_progress`, `completed`, `cancelled`, or `rescheduled`.
        status: TaskStatus,
        /// Cancellation reason or completion notes.
        reason: Option<String>,
        /// Date before a reschedule.
        previous_scheduled_date: Option<DateTime<Utc>>,
    },
    /// A chat message was stored.
    ChatPosted(ChatMessage),
    /// An admin decided on a collector application.
    ApplicationDecided {
        /// Application identifier.
        application_id: ApplicationId,
        /// The applicant.
        applicant_id: UserId,
        /// Outcome.
        approved: bool,
        /// Reason given to the applicant.
        reason: Option<String>,
    },
    /// Safety alert for all field staff.
    EmergencyAlert {
        /// Alert title.
        title: String,
        /// Alert body.
        message: String,
        /// Severity.
        severity: AlertSeverity,
        /// Latitude of the incident, if known.
        latitude: Option<f64>,
        /// Longitude of the incident, if known.
        longitude: Option<f64>,
    },
    /// Broadcast from an admin.
    SystemAnnouncement {
        /// Who should receive it.
        audience: Audience,
        /// Title.
        title: String,
        /// Body.
        message: String,
    },
}

/// Severity of an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Advisory.
    Low,
    /// Default.
    #[default]
    Medium,
    /// Stop work.
    High,
    /// Evacuate.
    Critical,
}

/// Recipients of a system announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Audience {
    /// Every connected user.
    All,
    /// Every user with one role.
    Role {
        /// The role.
        role: UserRole,
    },
    /// Every user subscribed to the area containing a point.
    Area {
        /// Latitude.
        latitude: f64,
        /// Longitude.
        longitude: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged() {
        let event = DomainEvent::new(
            None,
            EventPayload::SystemAnnouncement {
                audience: Audience::Role {
                    role: UserRole::Collector,
                },
                title: "Depot closed".into(),
                message: "Use the north depot today".into(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["kind"], "system_announcement");
        assert_eq!(json["payload"]["audience"]["scope"], "role");
        assert_eq!(event.name(), "system_announcement");
    }
}
