//! Chat history handler.

use axum::Json;
use axum::extract::{Path, Query, State};

use wastehub_entity::chat::ChatMessage;

use crate::dto::response::{ApiResponse, ChatHistoryResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/chat/rooms/{room}/messages
///
/// Page 1 is the most recent page; messages within a page are oldest first.
pub async fn room_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(room): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<ChatHistoryResponse<ChatMessage>>>, ApiError> {
    let (room, messages) = state
        .realtime
        .gateway
        .room_history(&auth, &room, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(ChatHistoryResponse {
        room: room.to_string(),
        messages,
    })))
}
