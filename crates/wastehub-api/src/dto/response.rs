//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wastehub_core::types::{EventId, UserId};
use wastehub_entity::user::UserRole;
use wastehub_realtime::dispatch::DispatchReport;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Count response (unread badge, rows changed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// The count.
    pub count: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when the store is unreachable.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Store backend in use.
    pub backend: String,
    /// Open WebSocket sessions.
    pub ws_sessions: u64,
}

/// Result of `POST /api/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedTokenResponse {
    /// Token subject.
    pub user_id: UserId,
    /// Role claim.
    pub role: UserRole,
    /// Display name claim.
    pub name: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

/// Result of an admin broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResponse {
    /// Id of the published event.
    pub event_id: EventId,
    /// Live delivery counts.
    pub delivery: DispatchReport,
}

/// One page of chat history.
#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryResponse<T: Serialize> {
    /// Canonical room key.
    pub room: String,
    /// Messages, oldest first.
    pub messages: Vec<T>,
}
