//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use wastehub_core::types::{ReportId, UserId};
use wastehub_entity::event::{AlertSeverity, Audience};
use wastehub_service::task::AssignTask;

/// Assign a collector to a report (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignTaskRequest {
    /// Report to resolve.
    pub report_id: ReportId,
    /// Collector to assign.
    pub collector_id: UserId,
    /// Planned pickup time.
    pub scheduled_date: DateTime<Utc>,
    /// Planned duration in minutes.
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, max = 1440))]
    pub estimated_duration_minutes: i32,
    /// Notes for the collector.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

fn default_duration() -> i32 {
    60
}

impl From<AssignTaskRequest> for AssignTask {
    fn from(req: AssignTaskRequest) -> Self {
        Self {
            report_id: req.report_id,
            collector_id: req.collector_id,
            scheduled_date: req.scheduled_date,
            estimated_duration_minutes: req.estimated_duration_minutes,
            notes: req.notes,
        }
    }
}

/// Query of `POST /api/tasks/{id}/start`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StartTaskRequest {
    /// Fail with a conflict unless the task is still at this version.
    pub expected_version: Option<i64>,
}

/// Body of `POST /api/tasks/{id}/complete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompleteTaskRequest {
    /// Completion notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Optimistic concurrency guard.
    pub expected_version: Option<i64>,
}

/// Body of `POST /api/tasks/{id}/cancel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelTaskRequest {
    /// Why the task was cancelled.
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    /// Optimistic concurrency guard.
    pub expected_version: Option<i64>,
}

/// Body of `POST /api/tasks/{id}/reschedule`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleTaskRequest {
    /// New pickup time; must be in the future.
    pub scheduled_date: DateTime<Utc>,
    /// Optimistic concurrency guard.
    pub expected_version: Option<i64>,
}

/// Body of `POST /api/tasks/{id}/images`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachImagesRequest {
    /// Image URIs already uploaded to object storage.
    #[validate(length(min = 1, max = 10))]
    pub images: Vec<String>,
    /// Optimistic concurrency guard.
    pub expected_version: Option<i64>,
}

/// Body of `POST /api/admin/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmergencyAlertRequest {
    /// Alert title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Alert body.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// Severity.
    #[serde(default)]
    pub severity: AlertSeverity,
    /// Latitude of the incident.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    /// Longitude of the incident.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Body of `POST /api/admin/applications/{id}/decision`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplicationDecisionRequest {
    /// The applicant.
    pub applicant_id: UserId,
    /// Outcome.
    pub approved: bool,
    /// Reason shown to the applicant.
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Body of `POST /api/admin/announcements`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncementRequest {
    /// Recipients. Defaults to everyone.
    #[serde(default = "default_audience")]
    pub audience: Audience,
    /// Title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Body.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

fn default_audience() -> Audience {
    Audience::All
}

/// Body of `POST /api/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyTokenRequest {
    /// Session token to check.
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}
