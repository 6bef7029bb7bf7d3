//! Denormalized task view carried by task events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wastehub_core::types::{ReportId, TaskId, UserId};

use super::model::PickupTask;
use super::status::TaskStatus;
use crate::report::ReportSummary;
use crate::user::UserProfile;

/// Everything a client needs to render a task update without a follow-up fetch.
///
/// Report and collector details come from the directories and are `None`
/// when a lookup failed after the task was already saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub task_id: TaskId,
    /// Report identifier.
    pub report_id: ReportId,
    /// Assigned collector.
    pub collector_id: UserId,
    /// Reporting resident.
    pub resident_id: UserId,
    /// Status at rest after the change.
    pub status: TaskStatus,
    /// Planned pickup time.
    pub scheduled_date: DateTime<Utc>,
    /// Planned duration in minutes.
    pub estimated_duration_minutes: i32,
    /// When the pickup started.
    pub actual_start_time: Option<DateTime<Utc>>,
    /// When the pickup finished.
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Task version after the change.
    pub version: i64,
    /// Report title.
    pub report_title: Option<String>,
    /// Report address.
    pub address: Option<String>,
    /// Report latitude.
    pub latitude: Option<f64>,
    /// Report longitude.
    pub longitude: Option<f64>,
    /// Collector display name.
    pub collector_name: Option<String>,
}

impl TaskSnapshot {
    /// Build a snapshot from the stored task and whatever directory data is at hand.
    pub fn new(
        task: &PickupTask,
        report: Option<&ReportSummary>,
        collector: Option<&UserProfile>,
    ) -> Self {
        Self {
            task_id: task.id,
            report_id: task.report_id,
            collector_id: task.collector_id,
            resident_id: task.resident_id,
            status: task.status,
            scheduled_date: task.scheduled_date,
            estimated_duration_minutes: task.estimated_duration_minutes,
            actual_start_time: task.actual_start_time,
            actual_end_time: task.actual_end_time,
            version: task.version,
            report_title: report.map(|r| r.title.clone()),
            address: report.map(|r| r.address.clone()),
            latitude: report.map(|r| r.latitude),
            longitude: report.map(|r| r.longitude),
            collector_name: collector.map(|c| c.name.clone()),
        }
    }

    /// Short label used in notification text.
    pub fn label(&self) -> &str {
        self.report_title.as_deref().unwrap_or("your pickup")
    }
}
