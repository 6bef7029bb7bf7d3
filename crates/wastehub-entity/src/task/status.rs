//! Pickup task status and the legal edges between statuses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a [`PickupTask`](super::PickupTask).
///
/// ```text
/// scheduled ──▶ in_progress ──▶ completed
///     │  ▲            │
///     │  └ rescheduled│
///     └──────┬────────┘
///            ▼
///        cancelled
/// ```
///
/// `Rescheduled` is transient: it is recorded in history and emitted in
/// events, but a stored task comes back to rest in `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned and waiting for the scheduled date.
    Scheduled,
    /// The collector has started the pickup.
    InProgress,
    /// Pickup done.
    Completed,
    /// Abandoned by the collector or an admin.
    Cancelled,
    /// Moved to a new date by an admin.
    Rescheduled,
}

impl TaskStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::InProgress)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::Scheduled, Self::Rescheduled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
                | (Self::Rescheduled, Self::Scheduled)
        )
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = wastehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            _ => Err(wastehub_core::AppError::validation(format!(
                "Invalid task status: '{s}'"
            ))),
        }
    }
}
