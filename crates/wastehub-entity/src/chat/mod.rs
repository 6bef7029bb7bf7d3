//! Chat message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wastehub_core::types::{MessageId, UserId};

use crate::user::UserRole;

/// Kind of chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "message_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Written by a user.
    #[default]
    Text,
    /// Operational notice posted by an admin or the server.
    System,
}

/// An immutable message posted to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    /// Server-assigned identifier.
    pub id: MessageId,
    /// Canonical room key.
    pub room: String,
    /// Author.
    pub sender_id: UserId,
    /// Author display name at the time of posting.
    pub sender_name: String,
    /// Author role at the time of posting.
    pub sender_role: UserRole,
    /// Message text.
    pub body: String,
    /// Message kind.
    pub kind: MessageKind,
    /// The sender's provisional id, echoed back so the client can reconcile.
    pub client_id: Option<String>,
    /// Server timestamp.
    pub created_at: DateTime<Utc>,
}
