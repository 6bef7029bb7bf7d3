//! Directory view of a user.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wastehub_core::types::UserId;

use super::role::UserRole;

/// The subset of a user record the engine needs: display name and role.
///
/// Owned by the identity service; read through the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: UserRole,
}
