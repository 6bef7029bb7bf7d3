//! Token verification handler.
//!
//! Identity is issued elsewhere; this endpoint lets clients check a token
//! before opening a WebSocket. Failures count against the auth tier.

use axum::Json;
use axum::extract::State;

use crate::dto::request::VerifyTokenRequest;
use crate::dto::response::{ApiResponse, VerifiedTokenResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/auth/verify
pub async fn verify_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyTokenRequest>,
) -> Result<Json<ApiResponse<VerifiedTokenResponse>>, ApiError> {
    let session = state.verifier.verify(&req.token).await?;
    Ok(Json(ApiResponse::ok(VerifiedTokenResponse {
        user_id: session.user_id,
        role: session.role,
        name: session.name,
        expires_at: session.expires_at,
    })))
}
