//! Individual WebSocket session handle.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use wastehub_auth::VerifiedSession;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::UserId;
use wastehub_entity::user::UserRole;
use wastehub_service::Actor;

use crate::message::Frame;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// What happened to a frame handed to [`SessionHandle::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the socket writer.
    Queued,
    /// The session's queue was full; the frame was dropped.
    Full,
    /// The session is gone.
    Closed,
}

/// A handle to a single WebSocket session.
///
/// Holds the bounded queue feeding the socket writer plus the identity
/// established at handshake.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this session
    pub user_id: UserId,
    /// User's role at handshake
    pub role: UserRole,
    /// Display name
    pub name: String,
    /// Client network identity, used as the rate limit key
    pub client_ip: String,
    /// When the session was established
    pub connected_at: DateTime<Utc>,
    /// Sender for outbound frames
    sender: mpsc::Sender<Frame>,
    /// Last pong, in milliseconds since the epoch
    last_pong_ms: AtomicI64,
    /// Whether the session is still alive
    alive: AtomicBool,
    /// Cancelled when the server closes the session
    closed: CancellationToken,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(session: &VerifiedSession, client_ip: String, sender: mpsc::Sender<Frame>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            role: session.role,
            name: session.name.clone(),
            client_ip,
            connected_at: now,
            sender,
            last_pong_ms: AtomicI64::new(now.timestamp_millis()),
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    /// Queue a frame without waiting. A full queue drops the frame; a closed
    /// queue marks the session dead.
    pub fn send(&self, frame: Frame) -> Delivery {
        if !self.is_alive() {
            return Delivery::Closed;
        }
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Session send buffer full, dropping frame");
                Delivery::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Delivery::Closed
            }
        }
    }

    /// Like [`send`](Self::send), but a closed session is a connection-lost
    /// error.
    pub fn deliver(&self, frame: Frame) -> AppResult<Delivery> {
        match self.send(frame) {
            Delivery::Closed => Err(AppError::connection_lost(format!(
                "Session {} is closed",
                self.id
            ))),
            delivery => Ok(delivery),
        }
    }

    /// The authenticated caller behind this session.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role, self.name.clone())
    }

    /// Check if session is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark session as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Mark dead and tell the socket task to close.
    pub fn close(&self) {
        self.mark_dead();
        self.closed.cancel();
    }

    /// Token cancelled when the server closes this session.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Record a pong response
    pub fn record_pong(&self) {
        self.last_pong_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// When the last pong arrived.
    pub fn last_pong(&self) -> DateTime<Utc> {
        let ms = self.last_pong_ms.load(Ordering::Relaxed);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(self.connected_at)
    }

    /// Whether no pong arrived within `timeout` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        (now - self.last_pong())
            .to_std()
            .is_ok_and(|elapsed| elapsed > timeout)
    }
}
