//! Session gateway: the only component that talks to sessions directly.
//!
//! Registers authenticated sessions, auto-joins their role and user rooms,
//! handles `join_room` / `leave_room` / `send_message` / `pong`, and removes
//! sessions on disconnect, eviction, or missed heartbeats.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wastehub_auth::{SessionVerifier, VerifiedSession};
use wastehub_core::config::realtime::RealtimeConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::PageRequest;
use wastehub_entity::chat::{ChatMessage, MessageKind};
use wastehub_entity::event::{DomainEvent, EventPayload};
use wastehub_service::{Actor, ChatService, RateLimitGuard, RateLimitTier, TaskService};

use super::authenticator::WsAuthenticator;
use super::handle::{ConnectionId, Delivery, SessionHandle};
use super::pool::SessionPool;
use crate::channel::access::{RoomAccess, check_room_access};
use crate::channel::registry::RoomRegistry;
use crate::channel::room::{AreaGrid, RoomId};
use crate::dispatch::EventDispatcher;
use crate::message::Frame;
use crate::message::builder::{encode, error_message, ping_message, rejected_send_message};
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::message::validator::{validate_inbound, validate_room_key};
use crate::metrics::RealtimeMetrics;

/// Terminates real-time sessions. One instance per engine.
#[derive(Debug)]
pub struct SessionGateway {
    config: RealtimeConfig,
    authenticator: WsAuthenticator,
    pool: Arc<SessionPool>,
    rooms: Arc<RoomRegistry>,
    grid: AreaGrid,
    dispatcher: Arc<EventDispatcher>,
    tasks: TaskService,
    chat: ChatService,
    guard: Arc<RateLimitGuard>,
    metrics: Arc<RealtimeMetrics>,
}

/// Collaborators of a [`SessionGateway`].
#[derive(Debug, Clone)]
pub struct GatewayParts {
    /// Shared session pool.
    pub pool: Arc<SessionPool>,
    /// Shared room registry.
    pub rooms: Arc<RoomRegistry>,
    /// Dispatcher for chat events.
    pub dispatcher: Arc<EventDispatcher>,
    /// Engine metrics.
    pub metrics: Arc<RealtimeMetrics>,
    /// Rate limit guard shared with the HTTP layer.
    pub guard: Arc<RateLimitGuard>,
}

impl SessionGateway {
    /// Creates a new session gateway.
    pub fn new(
        config: &RealtimeConfig,
        verifier: Arc<dyn SessionVerifier>,
        tasks: TaskService,
        chat: ChatService,
        parts: GatewayParts,
    ) -> Self {
        Self {
            config: config.clone(),
            authenticator: WsAuthenticator::new(verifier),
            pool: parts.pool,
            rooms: parts.rooms,
            grid: AreaGrid::new(config.area_precision),
            dispatcher: parts.dispatcher,
            tasks,
            chat,
            guard: parts.guard,
            metrics: parts.metrics,
        }
    }

    /// Verify a handshake `{token, user_id}`.
    pub async fn authenticate(&self, token: &str, user_id: &str) -> AppResult<VerifiedSession> {
        self.authenticator.authenticate(token, user_id).await
    }

    /// Register an authenticated session.
    ///
    /// When the user is at the per-user ceiling the oldest session is closed
    /// first. The new session is joined to `role:<role>` and `user:<id>` and
    /// receives a `connected` frame.
    pub fn register(
        &self,
        session: &VerifiedSession,
        client_ip: String,
    ) -> AppResult<(Arc<SessionHandle>, mpsc::Receiver<Frame>)> {
        let existing = self.pool.user_sessions(&session.user_id);
        let max = self.config.max_connections_per_user.max(1);
        if existing.len() >= max {
            let excess = existing.len() + 1 - max;
            for oldest in existing.iter().take(excess) {
                warn!(
                    conn_id = %oldest.id,
                    user_id = %session.user_id,
                    max,
                    "User at max sessions, closing oldest"
                );
                self.unregister(&oldest.id);
                self.metrics.session_evicted();
            }
        }

        let (tx, rx) = mpsc::channel(self.config.session_buffer_size.max(1));
        let handle = Arc::new(SessionHandle::new(session, client_ip, tx));
        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        let auto_rooms = [RoomId::Role(session.role), RoomId::User(session.user_id)];
        for room in auto_rooms {
            if let Err(e) = self.rooms.join(handle.id, room) {
                self.unregister(&handle.id);
                return Err(e);
            }
        }

        let connected = OutboundMessage::Connected {
            connection_id: handle.id,
            user_id: handle.user_id,
            role: handle.role,
            rooms: auto_rooms.iter().map(ToString::to_string).collect(),
            server_time: Utc::now(),
        };
        if let Err(e) = self.push(&handle, &connected) {
            self.unregister(&handle.id);
            return Err(e);
        }

        info!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            role = %handle.role,
            client_ip = %handle.client_ip,
            "WebSocket session registered"
        );
        Ok((handle, rx))
    }

    /// Remove a session from the pool and every room. Idempotent.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Arc<SessionHandle>> {
        let handle = self.pool.remove(conn_id)?;
        handle.close();
        let rooms = self.rooms.leave_all(*conn_id);
        self.metrics.connection_closed();
        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            rooms = rooms.len(),
            "WebSocket session unregistered"
        );
        Some(handle)
    }

    /// Processes one inbound text frame. Failures go back as `error` frames.
    ///
    /// Returns a connection-lost error once the session can no longer take
    /// replies; the caller should stop reading from its socket.
    pub async fn handle_inbound(&self, handle: &Arc<SessionHandle>, raw: &str) -> AppResult<()> {
        self.metrics.frame_received();

        if let Err(e) = validate_inbound(raw, self.config.max_frame_bytes) {
            return self.push(handle, &error_message(&e));
        }
        let msg: InboundMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                let err = AppError::validation(format!("Failed to parse message: {e}"));
                return self.push(handle, &error_message(&err));
            }
        };

        match msg {
            InboundMessage::JoinRoom { room } => match self.join_room(handle, &room).await {
                Ok(reply) => self.push(handle, &reply),
                Err(e) => {
                    debug!(conn_id = %handle.id, room = %room, error = %e, "Join refused");
                    self.push(handle, &error_message(&e))
                }
            },
            InboundMessage::LeaveRoom { room } => match self.leave_room(handle, &room) {
                Ok(reply) => self.push(handle, &reply),
                Err(e) => self.push(handle, &error_message(&e)),
            },
            InboundMessage::SendMessage {
                room,
                body,
                client_id,
            } => match self
                .send_message(handle, &room, &body, client_id.clone())
                .await
            {
                Ok(()) => Ok(()),
                Err(e) => {
                    debug!(conn_id = %handle.id, room = %room, error = %e, "Message refused");
                    self.push(handle, &rejected_send_message(&e, client_id))
                }
            },
            InboundMessage::Pong { .. } => {
                handle.record_pong();
                Ok(())
            }
        }
    }

    /// `join(sessionId, roomId)` with permission checks and history replay.
    pub async fn join_room(&self, handle: &SessionHandle, key: &str) -> AppResult<OutboundMessage> {
        let room = self.authorize_room(&handle.actor(), key).await?;
        self.rooms.join(handle.id, room)?;

        let canonical = room.to_string();
        let history = if room.accepts_chat() && self.config.chat_history_on_join > 0 {
            self.chat
                .history(&canonical, &PageRequest::new(1, self.config.chat_history_on_join))
                .await?
        } else {
            Vec::new()
        };

        Ok(OutboundMessage::RoomJoined {
            room: canonical,
            history,
        })
    }

    /// Parse `key` and check that `actor` may see the room.
    ///
    /// Task rooms are open to the task's participants and admins.
    pub async fn authorize_room(&self, actor: &Actor, key: &str) -> AppResult<RoomId> {
        let room = self.parse_room(key)?;
        match check_room_access(actor.user_id, actor.role, &room) {
            RoomAccess::Granted => {}
            RoomAccess::TaskParticipant(task_id) => {
                self.tasks.get(actor, task_id).await?;
            }
            RoomAccess::Denied(reason) => return Err(AppError::forbidden(reason)),
        }
        Ok(room)
    }

    /// One page of a room's chat history for a user allowed to see it.
    pub async fn room_history(
        &self,
        actor: &Actor,
        key: &str,
        page: &PageRequest,
    ) -> AppResult<(RoomId, Vec<ChatMessage>)> {
        let room = self.authorize_room(actor, key).await?;
        if !room.accepts_chat() {
            return Err(AppError::validation(format!(
                "Chat is not available in {} rooms",
                room.kind()
            )));
        }
        let history = self.chat.history(&room.to_string(), page).await?;
        Ok((room, history))
    }

    /// `leave(sessionId, roomId)`. Leaving a room never joined is not an error.
    pub fn leave_room(&self, handle: &SessionHandle, key: &str) -> AppResult<OutboundMessage> {
        let room = self.parse_room(key)?;
        self.rooms.leave(handle.id, &room);
        Ok(OutboundMessage::RoomLeft {
            room: room.to_string(),
        })
    }

    /// Rate-limit, persist, then dispatch a chat message to a joined room.
    pub async fn send_message(
        &self,
        handle: &SessionHandle,
        key: &str,
        body: &str,
        client_id: Option<String>,
    ) -> AppResult<()> {
        self.guard.acquire(RateLimitTier::Write, &handle.client_ip)?;

        let room = self.parse_room(key)?;
        if !room.accepts_chat() {
            return Err(AppError::validation(format!(
                "Chat is not available in {} rooms",
                room.kind()
            )));
        }
        if !self.rooms.is_member(handle.id, &room) {
            return Err(AppError::forbidden("Join the room before posting to it"));
        }

        let actor = handle.actor();
        let message = self
            .chat
            .post(&actor, &room.to_string(), body, MessageKind::Text, client_id)
            .await?;
        let event = DomainEvent::new(Some(actor.user_id), EventPayload::ChatPosted(message));
        self.dispatcher.dispatch(&event);
        Ok(())
    }

    /// Reap sessions that missed their pong window and ping the rest.
    ///
    /// Returns the number of sessions reaped.
    pub fn sweep_heartbeats(&self, pong_timeout: Duration) -> usize {
        let now = Utc::now();
        let ping = match encode(&ping_message()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode ping");
                return 0;
            }
        };

        let mut reaped = 0;
        for handle in self.pool.all_sessions() {
            if !handle.is_alive() || handle.is_stale(now, pong_timeout) {
                warn!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    last_pong = %handle.last_pong(),
                    "Reaping session after missed heartbeat"
                );
                if self.unregister(&handle.id).is_some() {
                    self.metrics.session_reaped();
                    reaped += 1;
                }
                continue;
            }
            let delivered = handle.send(ping.clone()) == Delivery::Queued;
            self.metrics.frame_sent(delivered);
        }
        reaped
    }

    /// Close every session.
    pub fn close_all(&self) -> usize {
        let sessions = self.pool.all_sessions();
        for handle in &sessions {
            self.unregister(&handle.id);
        }
        info!(count = sessions.len(), "All sessions closed");
        sessions.len()
    }

    /// The area grid rooms are bucketed on.
    pub fn grid(&self) -> &AreaGrid {
        &self.grid
    }

    /// Looks up a session by ID.
    pub fn session(&self, conn_id: &ConnectionId) -> Option<Arc<SessionHandle>> {
        self.pool.get(conn_id)
    }

    fn parse_room(&self, key: &str) -> AppResult<RoomId> {
        validate_room_key(key)?;
        RoomId::parse(key, &self.grid)
    }

    fn push(&self, handle: &SessionHandle, message: &OutboundMessage) -> AppResult<()> {
        match encode(message) {
            Ok(frame) => {
                let delivery = handle.deliver(frame);
                self.metrics
                    .frame_sent(matches!(delivery, Ok(Delivery::Queued)));
                delivery.map(|_| ())
            }
            Err(e) => {
                warn!(conn_id = %handle.id, error = %e, "Failed to encode reply");
                Ok(())
            }
        }
    }
}
