//! Admin broadcast and monitoring handlers.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use wastehub_core::types::ApplicationId;
use wastehub_entity::event::{DomainEvent, EventPayload};
use wastehub_realtime::metrics::MetricsSnapshot;

use crate::dto::request::{AnnouncementRequest, ApplicationDecisionRequest, EmergencyAlertRequest};
use crate::dto::response::{ApiResponse, BroadcastResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

async fn broadcast(state: &AppState, event: DomainEvent) -> Json<ApiResponse<BroadcastResponse>> {
    let delivery = state.realtime.publish(&event).await;
    info!(
        event_id = %event.id,
        event = event.name(),
        sessions = delivery.sessions,
        "Admin event published"
    );
    Json(ApiResponse::ok(BroadcastResponse {
        event_id: event.id,
        delivery,
    }))
}

/// POST /api/admin/alerts
pub async fn emergency_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<EmergencyAlertRequest>,
) -> Result<Json<ApiResponse<BroadcastResponse>>, ApiError> {
    auth.require_admin()?;
    let event = DomainEvent::new(
        Some(auth.user_id),
        EventPayload::EmergencyAlert {
            title: req.title,
            message: req.message,
            severity: req.severity,
            latitude: req.latitude,
            longitude: req.longitude,
        },
    );
    Ok(broadcast(&state, event).await)
}

/// POST /api/admin/applications/{id}/decision
pub async fn decide_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<ApplicationId>,
    ValidatedJson(req): ValidatedJson<ApplicationDecisionRequest>,
) -> Result<Json<ApiResponse<BroadcastResponse>>, ApiError> {
    auth.require_admin()?;
    let event = DomainEvent::new(
        Some(auth.user_id),
        EventPayload::ApplicationDecided {
            application_id,
            applicant_id: req.applicant_id,
            approved: req.approved,
            reason: req.reason,
        },
    );
    Ok(broadcast(&state, event).await)
}

/// POST /api/admin/announcements
pub async fn announcement(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<AnnouncementRequest>,
) -> Result<Json<ApiResponse<BroadcastResponse>>, ApiError> {
    auth.require_admin()?;
    let event = DomainEvent::new(
        Some(auth.user_id),
        EventPayload::SystemAnnouncement {
            audience: req.audience,
            title: req.title,
            message: req.message,
        },
    );
    Ok(broadcast(&state, event).await)
}

/// GET /api/admin/realtime
pub async fn realtime_metrics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MetricsSnapshot>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(ApiResponse::ok(state.realtime.metrics_snapshot())))
}
