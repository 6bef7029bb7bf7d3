//! Session verification seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use wastehub_core::config::auth::AuthConfig;
use wastehub_core::result::AppResult;
use wastehub_core::types::UserId;
use wastehub_entity::user::UserRole;

use crate::jwt::JwtDecoder;

/// Identity established from a session token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role.
    pub role: UserRole,
    /// Display name.
    pub name: String,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// `verifySession(token) -> {userId, role}`.
#[async_trait]
pub trait SessionVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Verify a token, failing with an authentication error.
    async fn verify(&self, token: &str) -> AppResult<VerifiedSession>;
}

/// Verifies JWTs signed with the shared secret.
#[derive(Debug, Clone)]
pub struct JwtSessionVerifier {
    decoder: JwtDecoder,
}

impl JwtSessionVerifier {
    /// Create a verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoder: JwtDecoder::new(config),
        }
    }
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
    async fn verify(&self, token: &str) -> AppResult<VerifiedSession> {
        let claims = self.decoder.decode(token)?;
        debug!(user_id = %claims.sub, role = %claims.role, "Session token verified");
        Ok(VerifiedSession {
            user_id: claims.sub,
            role: claims.role,
            name: claims.name.clone(),
            expires_at: claims.expires_at(),
        })
    }
}
