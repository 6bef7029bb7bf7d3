//! `AuthUser` extractor: pulls the bearer token from the Authorization
//! header, verifies it, and injects the caller as an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use wastehub_core::error::AppError;
use wastehub_service::Actor;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl AuthUser {
    /// Returns the inner `Actor`.
    pub fn actor(&self) -> &Actor {
        &self.0
    }

    /// Fail with `Unauthorized` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(AppError::unauthorized("Admin role required").into())
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Actor;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The token in `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let session = state.verifier.verify(token).await?;
        Ok(AuthUser(Actor::from(&session)))
    }
}
