//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum concurrent sessions per user; the oldest is closed when exceeded.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Capacity of each session's outbound queue.
    #[serde(default = "default_session_buffer")]
    pub session_buffer_size: usize,
    /// Heartbeat ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// A session whose last pong is older than this is reaped.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_seconds: u64,
    /// Maximum rooms a single session may be joined to.
    #[serde(default = "default_max_rooms_per_session")]
    pub max_rooms_per_session: usize,
    /// Maximum sessions a single room may hold.
    #[serde(default = "default_max_sessions_per_room")]
    pub max_sessions_per_room: usize,
    /// Decimal places kept when bucketing coordinates into area rooms.
    #[serde(default = "default_area_precision")]
    pub area_precision: u32,
    /// Chat messages replayed to a session when it joins a room.
    #[serde(default = "default_history_on_join")]
    pub chat_history_on_join: u64,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections_per_user: default_max_connections_per_user(),
            session_buffer_size: default_session_buffer(),
            ping_interval_seconds: default_ping_interval(),
            pong_timeout_seconds: default_pong_timeout(),
            max_rooms_per_session: default_max_rooms_per_session(),
            max_sessions_per_room: default_max_sessions_per_room(),
            area_precision: default_area_precision(),
            chat_history_on_join: default_history_on_join(),
            max_message_length: default_max_message_length(),
            max_frame_bytes: default_max_frame_bytes(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Durable notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Days after which a notification expires. `0` disables expiry.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
    /// How often expired notifications are purged, in seconds.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_session_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    25
}

fn default_pong_timeout() -> u64 {
    60
}

fn default_max_rooms_per_session() -> usize {
    50
}

fn default_max_sessions_per_room() -> usize {
    10_000
}

fn default_area_precision() -> u32 {
    2
}

fn default_history_on_join() -> u64 {
    50
}

fn default_max_message_length() -> usize {
    2000
}

fn default_max_frame_bytes() -> usize {
    64 * 1024
}

fn default_ttl_days() -> u32 {
    30
}

fn default_purge_interval() -> u64 {
    3600
}
