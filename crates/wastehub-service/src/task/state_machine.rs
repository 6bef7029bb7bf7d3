//! Role-gated transitions of a [`PickupTask`].
//!
//! [`apply`] is pure: it checks who may act, then whether the edge exists,
//! then mutates the task in place. The caller persists the result.

use chrono::{DateTime, Utc};

use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{TaskId, UserId};
use wastehub_entity::task::{PickupTask, TaskStatus, TaskStatusChange};

use crate::context::Actor;

/// Maximum images a task can hold.
pub const MAX_IMAGES_PER_TASK: usize = 20;

/// A requested change to a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    /// Assigned collector begins the pickup.
    Start,
    /// Assigned collector finishes the pickup.
    Complete {
        /// Completion notes.
        notes: Option<String>,
    },
    /// Assigned collector or an admin abandons the pickup.
    Cancel {
        /// Why.
        reason: Option<String>,
    },
    /// An admin moves the pickup.
    Reschedule {
        /// The new date, strictly in the future.
        new_date: DateTime<Utc>,
    },
    /// Assigned collector attaches photos.
    AttachImages {
        /// Image URIs.
        uris: Vec<String>,
    },
}

impl TaskAction {
    /// Verb used in error messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete { .. } => "complete",
            Self::Cancel { .. } => "cancel",
            Self::Reschedule { .. } => "reschedule",
            Self::AttachImages { .. } => "attach images to",
        }
    }

    /// The lifecycle edge this action takes, if any.
    fn edge(&self) -> Option<TaskStatus> {
        match self {
            Self::Start => Some(TaskStatus::InProgress),
            Self::Complete { .. } => Some(TaskStatus::Completed),
            Self::Cancel { .. } => Some(TaskStatus::Cancelled),
            Self::Reschedule { .. } => Some(TaskStatus::Rescheduled),
            Self::AttachImages { .. } => None,
        }
    }
}

/// What [`apply`] did, for the history row and the emitted event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Status before.
    pub previous: TaskStatus,
    /// Edge taken. For a reschedule this is `Rescheduled` while the task rests in `Scheduled`.
    pub edge: TaskStatus,
    /// Reason or notes supplied with the action.
    pub note: Option<String>,
    /// Date before a reschedule.
    pub previous_scheduled_date: Option<DateTime<Utc>>,
}

impl Transition {
    /// History rows for this transition, in walk order.
    ///
    /// A reschedule records both `scheduled -> rescheduled` and
    /// `rescheduled -> scheduled`, so the history reads as a walk of the
    /// lifecycle graph ending in the status the task rests in.
    pub fn history_rows(
        &self,
        task_id: TaskId,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Vec<TaskStatusChange> {
        let mut rows = vec![TaskStatusChange::new(
            task_id,
            Some(self.previous),
            self.edge,
            actor_id,
            self.note.clone(),
            now,
        )];
        if self.edge == TaskStatus::Rescheduled {
            rows.push(TaskStatusChange::new(
                task_id,
                Some(TaskStatus::Rescheduled),
                TaskStatus::Scheduled,
                actor_id,
                None,
                now,
            ));
        }
        rows
    }
}

/// Check that `actor` may perform `action` on `task`.
pub fn authorize(task: &PickupTask, actor: &Actor, action: &TaskAction) -> AppResult<()> {
    let assigned = task.is_assigned_to(actor.user_id);
    let allowed = match action {
        TaskAction::Start | TaskAction::Complete { .. } | TaskAction::AttachImages { .. } => {
            assigned
        }
        TaskAction::Cancel { .. } => assigned || actor.is_admin(),
        TaskAction::Reschedule { .. } => actor.is_admin(),
    };
    if allowed {
        return Ok(());
    }
    Err(AppError::unauthorized(match action {
        TaskAction::Cancel { .. } => {
            "Only the assigned collector or an admin may cancel this task".to_string()
        }
        TaskAction::Reschedule { .. } => "Only an admin may reschedule this task".to_string(),
        other => format!("Only the assigned collector may {} this task", other.verb()),
    }))
}

/// Authorize, validate, and apply `action` to `task`.
///
/// On success the task's version is bumped and `updated_at` set to `now`.
/// Returns the transition taken, or `None` for actions that do not move
/// the task along its lifecycle.
pub fn apply(
    task: &mut PickupTask,
    actor: &Actor,
    action: &TaskAction,
    now: DateTime<Utc>,
) -> AppResult<Option<Transition>> {
    authorize(task, actor, action)?;

    let previous = task.status;
    if let Some(edge) = action.edge() {
        if !previous.can_transition_to(edge) {
            return Err(AppError::invalid_transition(format!(
                "Cannot {} a task that is {}",
                action.verb(),
                previous.as_str().replace('_', " ")
            )));
        }
    }

    let transition = match action {
        TaskAction::Start => {
            task.status = TaskStatus::InProgress;
            task.actual_start_time = Some(now);
            Some(Transition {
                previous,
                edge: TaskStatus::InProgress,
                note: None,
                previous_scheduled_date: None,
            })
        }
        TaskAction::Complete { notes } => {
            task.status = TaskStatus::Completed;
            task.actual_end_time = Some(now);
            task.completion_notes = notes.clone();
            Some(Transition {
                previous,
                edge: TaskStatus::Completed,
                note: notes.clone(),
                previous_scheduled_date: None,
            })
        }
        TaskAction::Cancel { reason } => {
            task.status = TaskStatus::Cancelled;
            if let Some(reason) = reason.as_deref().filter(|r| !r.trim().is_empty()) {
                task.append_note(&format!("Cancellation reason: {}", reason.trim()));
            }
            Some(Transition {
                previous,
                edge: TaskStatus::Cancelled,
                note: reason.clone(),
                previous_scheduled_date: None,
            })
        }
        TaskAction::Reschedule { new_date } => {
            if *new_date <= now {
                return Err(AppError::validation(
                    "The new pickup date must be in the future",
                ));
            }
            let previous_date = task.scheduled_date;
            task.scheduled_date = *new_date;
            task.status = TaskStatus::Scheduled;
            Some(Transition {
                previous,
                edge: TaskStatus::Rescheduled,
                note: Some(format!("Rescheduled to {}", new_date.to_rfc3339())),
                previous_scheduled_date: Some(previous_date),
            })
        }
        TaskAction::AttachImages { uris } => {
            if task.status == TaskStatus::Cancelled {
                return Err(AppError::invalid_transition(
                    "Cannot attach images to a cancelled task",
                ));
            }
            if uris.is_empty() {
                return Err(AppError::validation("At least one image is required"));
            }
            if uris.iter().any(|u| u.trim().is_empty() || u.len() > 2048) {
                return Err(AppError::validation("Image URIs must be 1 to 2048 characters"));
            }
            if task.images.len() + uris.len() > MAX_IMAGES_PER_TASK {
                return Err(AppError::validation(format!(
                    "A task holds at most {MAX_IMAGES_PER_TASK} images"
                )));
            }
            task.images.extend(uris.iter().cloned());
            None
        }
    };

    task.version += 1;
    task.updated_at = now;
    Ok(transition)
}
