//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wastehub_core::types::{ApplicationId, EventId, UserId};
use wastehub_entity::chat::ChatMessage;
use wastehub_entity::event::AlertSeverity;
use wastehub_entity::notification::Notification;
use wastehub_entity::task::{TaskSnapshot, TaskStatus};
use wastehub_entity::user::UserRole;

use crate::connection::handle::ConnectionId;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Join a room.
    JoinRoom {
        /// Room key.
        room: String,
    },
    /// Leave a room.
    LeaveRoom {
        /// Room key.
        room: String,
    },
    /// Post a chat message to a joined room.
    SendMessage {
        /// Room key.
        room: String,
        /// Message text.
        #[serde(alias = "message")]
        body: String,
        /// Provisional id of the client's optimistic copy.
        #[serde(default)]
        client_id: Option<String>,
    },
    /// Reply to a server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Handshake accepted.
    Connected {
        /// Connection ID.
        connection_id: ConnectionId,
        /// Authenticated user.
        user_id: UserId,
        /// User role.
        role: UserRole,
        /// Rooms joined automatically.
        rooms: Vec<String>,
        /// Server time.
        server_time: DateTime<Utc>,
    },
    /// Join confirmed, with recent history for chat rooms.
    RoomJoined {
        /// Canonical room key.
        room: String,
        /// Recent messages, oldest first.
        history: Vec<ChatMessage>,
    },
    /// Leave confirmed.
    RoomLeft {
        /// Canonical room key.
        room: String,
    },
    /// A task was assigned.
    AssignTask {
        /// Triggering event.
        event_id: EventId,
        /// The new task.
        task: TaskSnapshot,
        /// Assignment notes.
        notes: Option<String>,
    },
    /// A task changed status.
    TaskUpdate {
        /// Triggering event.
        event_id: EventId,
        /// Who made the change.
        actor_id: Option<UserId>,
        /// Task after the change.
        task: TaskSnapshot,
        /// Status before the change.
        previous_status: TaskStatus,
        /// The edge taken.
        status: TaskStatus,
        /// Cancellation reason or completion notes.
        reason: Option<String>,
        /// Date before a reschedule.
        previous_scheduled_date: Option<DateTime<Utc>>,
    },
    /// A chat message was posted to a joined room.
    NewMessage {
        /// The stored message, including the sender's `client_id`.
        message: ChatMessage,
    },
    /// A durable notification was stored for this user.
    NewNotification {
        /// The notification.
        notification: Notification,
    },
    /// A collector application was approved.
    ApplicationApproved {
        /// Triggering event.
        event_id: EventId,
        /// Application ID.
        application_id: ApplicationId,
        /// Applicant.
        applicant_id: UserId,
        /// Note from the admin.
        reason: Option<String>,
    },
    /// A collector application was rejected.
    ApplicationRejected {
        /// Triggering event.
        event_id: EventId,
        /// Application ID.
        application_id: ApplicationId,
        /// Applicant.
        applicant_id: UserId,
        /// Reason given.
        reason: Option<String>,
    },
    /// Safety alert for field staff.
    EmergencyAlert {
        /// Triggering event.
        event_id: EventId,
        /// Title.
        title: String,
        /// Body.
        message: String,
        /// Severity.
        severity: AlertSeverity,
        /// Incident latitude.
        latitude: Option<f64>,
        /// Incident longitude.
        longitude: Option<f64>,
        /// When it was raised.
        issued_at: DateTime<Utc>,
    },
    /// Admin announcement.
    SystemNotification {
        /// Triggering event.
        event_id: EventId,
        /// Title.
        title: String,
        /// Body.
        message: String,
        /// When it was sent.
        issued_at: DateTime<Utc>,
    },
    /// Keepalive; answer with `pong`.
    Ping {
        /// Server timestamp (ms).
        timestamp: i64,
    },
    /// A request from this session failed.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
        /// Seconds to wait before retrying, for rate limits.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_after_seconds: Option<u64>,
        /// The `client_id` of the `send_message` that failed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },
}
