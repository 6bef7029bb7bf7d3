//! Pickup task handlers.
//!
//! Every mutation publishes its domain event to the realtime engine once
//! the change is committed.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use wastehub_core::types::{PageResponse, TaskId};
use wastehub_database::store::TaskFilter;
use wastehub_entity::task::{PickupTask, TaskStatusChange};
use wastehub_service::TaskOutcome;

use crate::dto::request::{
    AssignTaskRequest, AttachImagesRequest, CancelTaskRequest, CompleteTaskRequest,
    RescheduleTaskRequest, StartTaskRequest,
};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, IfMatch, PaginationParams, ValidatedJson};
use crate::state::AppState;

async fn publish(state: &AppState, outcome: TaskOutcome) -> Json<ApiResponse<PickupTask>> {
    if let Some(event) = &outcome.event {
        state.realtime.publish(event).await;
    }
    Json(ApiResponse::ok(outcome.task))
}

/// POST /api/tasks
pub async fn assign_task(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<AssignTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PickupTask>>), ApiError> {
    let outcome = state.task_service.assign(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, publish(&state, outcome).await))
}

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<TaskFilter>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<PickupTask>>>, ApiError> {
    let page = state
        .task_service
        .list(&auth, filter, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let task = state.task_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(task)))
}

/// GET /api/tasks/{id}/history
pub async fn task_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
) -> Result<Json<ApiResponse<Vec<TaskStatusChange>>>, ApiError> {
    let history = state.task_service.history(&auth, id).await?;
    Ok(Json(ApiResponse::ok(history)))
}

/// POST /api/tasks/{id}/start?expected_version=
pub async fn start_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
    if_match: IfMatch,
    Query(req): Query<StartTaskRequest>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let outcome = state
        .task_service
        .start(&auth, id, if_match.or(req.expected_version))
        .await?;
    Ok(publish(&state, outcome).await)
}

/// POST /api/tasks/{id}/complete
pub async fn complete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
    if_match: IfMatch,
    ValidatedJson(req): ValidatedJson<CompleteTaskRequest>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let outcome = state
        .task_service
        .complete(&auth, id, req.notes, if_match.or(req.expected_version))
        .await?;
    Ok(publish(&state, outcome).await)
}

/// POST /api/tasks/{id}/cancel
pub async fn cancel_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
    if_match: IfMatch,
    ValidatedJson(req): ValidatedJson<CancelTaskRequest>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let outcome = state
        .task_service
        .cancel(&auth, id, req.reason, if_match.or(req.expected_version))
        .await?;
    Ok(publish(&state, outcome).await)
}

/// POST /api/tasks/{id}/reschedule
pub async fn reschedule_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
    if_match: IfMatch,
    ValidatedJson(req): ValidatedJson<RescheduleTaskRequest>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let outcome = state
        .task_service
        .reschedule(&auth, id, req.scheduled_date, if_match.or(req.expected_version))
        .await?;
    Ok(publish(&state, outcome).await)
}

/// POST /api/tasks/{id}/images
pub async fn attach_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TaskId>,
    if_match: IfMatch,
    ValidatedJson(req): ValidatedJson<AttachImagesRequest>,
) -> Result<Json<ApiResponse<PickupTask>>, ApiError> {
    let outcome = state
        .task_service
        .attach_images(&auth, id, req.images, if_match.or(req.expected_version))
        .await?;
    Ok(publish(&state, outcome).await)
}
