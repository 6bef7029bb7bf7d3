//! Room registry: which sessions are in which rooms.
//!
//! Two sharded maps hold the forward index (room to sessions) and the
//! reverse index (session to rooms). No operation holds a guard on both
//! maps at once.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

use wastehub_core::config::realtime::RealtimeConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;

use super::room::RoomId;
use crate::connection::handle::ConnectionId;

/// In-memory room membership. Safe to lose; clients re-join after reconnect.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Room → member sessions.
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    /// Session → joined rooms.
    memberships: DashMap<ConnectionId, HashSet<RoomId>>,
    /// Ceiling on rooms per session.
    max_rooms_per_session: usize,
    /// Ceiling on sessions per room.
    max_sessions_per_room: usize,
}

impl RoomRegistry {
    /// Creates a new room registry.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            max_rooms_per_session: config.max_rooms_per_session.max(1),
            max_sessions_per_room: config.max_sessions_per_room.max(1),
        }
    }

    /// Join a room. Returns `false` if the session was already a member.
    pub fn join(&self, conn_id: ConnectionId, room: RoomId) -> AppResult<bool> {
        {
            let mut joined = self.memberships.entry(conn_id).or_default();
            if joined.contains(&room) {
                return Ok(false);
            }
            if joined.len() >= self.max_rooms_per_session {
                return Err(AppError::validation(format!(
                    "A session may join at most {} rooms",
                    self.max_rooms_per_session
                )));
            }
            joined.insert(room);
        }

        let full = {
            let mut members = self.rooms.entry(room).or_default();
            if members.len() >= self.max_sessions_per_room {
                true
            } else {
                members.insert(conn_id);
                false
            }
        };
        if full {
            self.forget_membership(conn_id, &room);
            return Err(AppError::service_unavailable(format!(
                "Room {room} is full; try again later"
            )));
        }

        debug!(conn_id = %conn_id, room = %room, "Joined room");
        Ok(true)
    }

    /// Leave a room. Returns `false` if the session was not a member.
    pub fn leave(&self, conn_id: ConnectionId, room: &RoomId) -> bool {
        let was_member = self.forget_membership(conn_id, room);
        self.remove_member(room, conn_id);
        if was_member {
            debug!(conn_id = %conn_id, room = %room, "Left room");
        }
        was_member
    }

    /// Remove a session from every room it joined.
    pub fn leave_all(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        let rooms: Vec<RoomId> = self
            .memberships
            .remove(&conn_id)
            .map(|(_, rooms)| rooms.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            self.remove_member(room, conn_id);
        }
        rooms
    }

    /// Sessions currently in a room.
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Rooms a session has joined.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        self.memberships
            .get(&conn_id)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a session is in a room.
    pub fn is_member(&self, conn_id: ConnectionId, room: &RoomId) -> bool {
        self.memberships
            .get(&conn_id)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Number of sessions in a room.
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget_membership(&self, conn_id: ConnectionId, room: &RoomId) -> bool {
        let Some(mut joined) = self.memberships.get_mut(&conn_id) else {
            return false;
        };
        let removed = joined.remove(room);
        let empty = joined.is_empty();
        drop(joined);
        if empty {
            self.memberships.remove_if(&conn_id, |_, rooms| rooms.is_empty());
        }
        removed
    }

    fn remove_member(&self, room: &RoomId, conn_id: ConnectionId) {
        let Some(mut members) = self.rooms.get_mut(room) else {
            return;
        };
        members.remove(&conn_id);
        let empty = members.is_empty();
        drop(members);
        if empty {
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
    }
}
