//! Session pool tracking all live sessions, indexed by user ID.

use std::sync::Arc;

use dashmap::DashMap;

use wastehub_core::types::UserId;

use super::handle::{ConnectionId, SessionHandle};

/// Thread-safe pool of all live WebSocket sessions.
#[derive(Debug, Default)]
pub struct SessionPool {
    /// User ID → sessions, oldest first (one user can have several).
    by_user: DashMap<UserId, Vec<Arc<SessionHandle>>>,
    /// Connection ID → session handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<SessionHandle>>,
}

impl SessionPool {
    /// Creates a new empty session pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session to the pool.
    pub fn add(&self, handle: Arc<SessionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user.entry(handle.user_id).or_default().push(handle);
    }

    /// Removes a session from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<SessionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut sessions) = self.by_user.get_mut(&handle.user_id) {
            sessions.retain(|s| s.id != *conn_id);
            if sessions.is_empty() {
                drop(sessions);
                self.by_user
                    .remove_if(&handle.user_id, |_, sessions| sessions.is_empty());
            }
        }
        Some(handle)
    }

    /// Gets a specific session by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<SessionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all sessions for a user, oldest first.
    pub fn user_sessions(&self, user_id: &UserId) -> Vec<Arc<SessionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns total number of live sessions.
    pub fn session_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all session handles.
    pub fn all_sessions(&self) -> Vec<Arc<SessionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
