//! WebSocket handshake authentication.

use std::sync::Arc;

use tracing::warn;

use wastehub_auth::{SessionVerifier, VerifiedSession};
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::UserId;

/// Authenticates WebSocket handshakes carrying `{token, user_id}`.
#[derive(Debug, Clone)]
pub struct WsAuthenticator {
    verifier: Arc<dyn SessionVerifier>,
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(verifier: Arc<dyn SessionVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify the token and check it belongs to the claimed user.
    pub async fn authenticate(&self, token: &str, claimed_user: &str) -> AppResult<VerifiedSession> {
        if token.trim().is_empty() {
            return Err(AppError::authentication("Missing session token"));
        }
        let claimed: UserId = claimed_user
            .trim()
            .parse()
            .map_err(|_| AppError::authentication("Invalid user_id in handshake"))?;

        let session = self.verifier.verify(token).await?;
        if session.user_id != claimed {
            warn!(
                token_user = %session.user_id,
                claimed_user = %claimed,
                "Handshake user does not match token"
            );
            return Err(AppError::authentication("Token does not belong to this user"));
        }
        Ok(session)
    }
}
