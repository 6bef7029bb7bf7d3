//! Pickup task entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wastehub_core::types::{ReportId, TaskId, UserId};

use super::status::TaskStatus;

/// One scheduled collection job, tied to exactly one report and one collector.
///
/// A task only exists once an admin has assigned it, so `collector_id` is
/// never null. `version` starts at 1 and increases by one on every mutation;
/// stores use it for compare-and-swap updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PickupTask {
    /// Unique task identifier.
    pub id: TaskId,
    /// The report this pickup resolves.
    pub report_id: ReportId,
    /// The assigned collector.
    pub collector_id: UserId,
    /// The resident who filed the report.
    pub resident_id: UserId,
    /// Current status. Never `Rescheduled` at rest.
    pub status: TaskStatus,
    /// When the pickup is planned.
    pub scheduled_date: DateTime<Utc>,
    /// Planned duration in minutes.
    pub estimated_duration_minutes: i32,
    /// Set once when the task enters `in_progress`.
    pub actual_start_time: Option<DateTime<Utc>>,
    /// Set once when the task is `completed`.
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Free-form notes; cancellation reasons are appended here.
    pub notes: Option<String>,
    /// Notes left by the collector on completion.
    pub completion_notes: Option<String>,
    /// Image URIs attached by the collector.
    pub images: Vec<String>,
    /// Optimistic concurrency counter.
    pub version: i64,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last modified.
    pub updated_at: DateTime<Utc>,
}

impl PickupTask {
    /// Whether `user` is the collector assigned to this task.
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.collector_id == user
    }

    /// Whether `user` takes part in this task (collector or resident).
    pub fn involves(&self, user: UserId) -> bool {
        self.collector_id == user || self.resident_id == user
    }

    /// Append a line to the notes, keeping what is already there.
    pub fn append_note(&mut self, line: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        });
    }
}
