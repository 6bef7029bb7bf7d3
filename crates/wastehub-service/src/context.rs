//! The authenticated caller of a service operation.

use serde::{Deserialize, Serialize};

use wastehub_auth::VerifiedSession;
use wastehub_core::types::UserId;
use wastehub_entity::user::UserRole;

/// Who is acting. Built from a verified session by the HTTP extractor or the
/// WebSocket gateway and passed into every service method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// Display name.
    pub name: String,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(user_id: UserId, role: UserRole, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
        }
    }

    /// Returns whether the actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&VerifiedSession> for Actor {
    fn from(session: &VerifiedSession) -> Self {
        Self::new(session.user_id, session.role, session.name.clone())
    }
}
