//! Which events notify whom.
//!
//! | Event | Recipients |
//! |---|---|
//! | task assigned | collector (high priority), resident |
//! | task started | resident |
//! | task completed | resident |
//! | task cancelled / rescheduled | collector and resident, minus the actor |
//! | application decided | applicant |
//! | chat, emergency alert, announcement | nobody (live only) |

use serde_json::json;

use wastehub_core::types::UserId;
use wastehub_entity::event::{DomainEvent, EventPayload};
use wastehub_entity::notification::{NewNotification, NotificationPriority, NotificationType};
use wastehub_entity::task::{TaskSnapshot, TaskStatus};

/// Derive the notifications for one event. Pure; the caller stores them.
pub fn project(event: &DomainEvent) -> Vec<NewNotification> {
    match &event.payload {
        EventPayload::TaskAssigned { task, .. } => vec![
            task_notification(
                task,
                task.collector_id,
                NotificationType::TaskAssigned,
                NotificationPriority::High,
                "New pickup assigned",
                format!(
                    "{} at {} on {}",
                    task.label(),
                    task.address.as_deref().unwrap_or("the reported location"),
                    format_date(task)
                ),
            ),
            task_notification(
                task,
                task.resident_id,
                NotificationType::TaskScheduled,
                NotificationPriority::Normal,
                "Pickup scheduled",
                format!("A collector will pick up {} on {}", task.label(), format_date(task)),
            ),
        ],
        EventPayload::TaskStatusChanged {
            task,
            status,
            reason,
            ..
        } => match status {
            TaskStatus::InProgress => vec![task_notification(
                task,
                task.resident_id,
                NotificationType::TaskStarted,
                NotificationPriority::Normal,
                "Pickup started",
                format!(
                    "{} is on the way to collect {}",
                    task.collector_name.as_deref().unwrap_or("Your collector"),
                    task.label()
                ),
            )],
            TaskStatus::Completed => vec![task_notification(
                task,
                task.resident_id,
                NotificationType::TaskCompleted,
                NotificationPriority::Normal,
                "Pickup completed",
                format!("{} has been collected. Thank you for reporting it.", task.label()),
            )],
            TaskStatus::Cancelled => participants_except(task, event.actor_id)
                .map(|user| {
                    let message = match reason.as_deref().filter(|r| !r.trim().is_empty()) {
                        Some(r) => format!("The pickup for {} was cancelled: {}", task.label(), r.trim()),
                        None => format!("The pickup for {} was cancelled", task.label()),
                    };
                    task_notification(
                        task,
                        user,
                        NotificationType::TaskCancelled,
                        NotificationPriority::High,
                        "Pickup cancelled",
                        message,
                    )
                })
                .collect(),
            TaskStatus::Rescheduled => participants_except(task, event.actor_id)
                .map(|user| {
                    task_notification(
                        task,
                        user,
                        NotificationType::TaskRescheduled,
                        NotificationPriority::Normal,
                        "Pickup rescheduled",
                        format!("The pickup for {} moved to {}", task.label(), format_date(task)),
                    )
                })
                .collect(),
            TaskStatus::Scheduled => Vec::new(),
        },
        EventPayload::ApplicationDecided {
            application_id,
            applicant_id,
            approved,
            reason,
        } => {
            let (kind, title, base) = if *approved {
                (
                    NotificationType::ApplicationApproved,
                    "Application approved",
                    "Your collector application was approved",
                )
            } else {
                (
                    NotificationType::ApplicationRejected,
                    "Application rejected",
                    "Your collector application was not approved",
                )
            };
            let message = match reason.as_deref().filter(|r| !r.trim().is_empty()) {
                Some(r) => format!("{base}: {}", r.trim()),
                None => base.to_string(),
            };
            vec![NewNotification {
                user_id: *applicant_id,
                notification_type: kind,
                title: title.to_string(),
                message,
                priority: NotificationPriority::High,
                payload: Some(json!({ "application_id": application_id })),
            }]
        }
        EventPayload::ChatPosted(_)
        | EventPayload::EmergencyAlert { .. }
        | EventPayload::SystemAnnouncement { .. } => Vec::new(),
    }
}

fn participants_except(
    task: &TaskSnapshot,
    actor: Option<UserId>,
) -> impl Iterator<Item = UserId> + '_ {
    [task.collector_id, task.resident_id]
        .into_iter()
        .filter(move |user| Some(*user) != actor)
}

fn task_notification(
    task: &TaskSnapshot,
    user_id: UserId,
    notification_type: NotificationType,
    priority: NotificationPriority,
    title: &str,
    message: String,
) -> NewNotification {
    NewNotification {
        user_id,
        notification_type,
        title: title.to_string(),
        message,
        priority,
        payload: Some(json!({
            "task_id": task.task_id,
            "report_id": task.report_id,
            "status": task.status,
            "scheduled_date": task.scheduled_date,
        })),
    }
}

fn format_date(task: &TaskSnapshot) -> String {
    task.scheduled_date.format("%Y-%m-%d %H:%M UTC").to_string()
}
