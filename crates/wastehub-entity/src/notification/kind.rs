//! Notification type and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happened, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A collector received a new pickup.
    TaskAssigned,
    /// A resident's report got a pickup date.
    TaskScheduled,
    /// The collector is on the way.
    TaskStarted,
    /// Pickup done; the report is resolved.
    TaskCompleted,
    /// Pickup cancelled.
    TaskCancelled,
    /// Pickup moved to a new date.
    TaskRescheduled,
    /// A collector application was approved.
    ApplicationApproved,
    /// A collector application was rejected.
    ApplicationRejected,
}

impl NotificationType {
    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskScheduled => "task_scheduled",
            Self::TaskStarted => "task_started",
            Self::TaskCompleted => "task_completed",
            Self::TaskCancelled => "task_cancelled",
            Self::TaskRescheduled => "task_rescheduled",
            Self::ApplicationApproved => "application_approved",
            Self::ApplicationRejected => "application_rejected",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = wastehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task_assigned" => Ok(Self::TaskAssigned),
            "task_scheduled" => Ok(Self::TaskScheduled),
            "task_started" => Ok(Self::TaskStarted),
            "task_completed" => Ok(Self::TaskCompleted),
            "task_cancelled" => Ok(Self::TaskCancelled),
            "task_rescheduled" => Ok(Self::TaskRescheduled),
            "application_approved" => Ok(Self::ApplicationApproved),
            "application_rejected" => Ok(Self::ApplicationRejected),
            _ => Err(wastehub_core::AppError::validation(format!(
                "Invalid notification type: '{s}'"
            ))),
        }
    }
}

/// Delivery priority shown by clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Informational.
    Low,
    /// Default.
    Normal,
    /// Needs attention soon.
    High,
}
