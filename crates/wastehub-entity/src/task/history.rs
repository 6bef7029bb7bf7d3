//! Task status history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use wastehub_core::types::{TaskId, UserId};

use super::status::TaskStatus;

/// One successful transition, appended alongside the task update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaskStatusChange {
    /// Row identifier.
    pub id: Uuid,
    /// The task that changed.
    pub task_id: TaskId,
    /// Status before the change; `None` for the creating assignment.
    pub from_status: Option<TaskStatus>,
    /// Status after the change.
    pub to_status: TaskStatus,
    /// Who made the change.
    pub actor_id: UserId,
    /// Reason or notes supplied with the change.
    pub note: Option<String>,
    /// When the change was made.
    pub changed_at: DateTime<Utc>,
}

impl TaskStatusChange {
    /// Build a history entry stamped with a fresh time-ordered id.
    pub fn new(
        task_id: TaskId,
        from_status: Option<TaskStatus>,
        to_status: TaskStatus,
        actor_id: UserId,
        note: Option<String>,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            task_id,
            from_status,
            to_status,
            actor_id,
            note,
            changed_at,
        }
    }
}
