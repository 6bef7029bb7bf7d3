//! Turns events and errors into outbound frames.

use chrono::Utc;

use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_entity::event::{DomainEvent, EventPayload};
use wastehub_entity::notification::Notification;

use super::Frame;
use super::types::OutboundMessage;

/// The client-facing message for a domain event.
pub fn event_message(event: &DomainEvent) -> OutboundMessage {
    match &event.payload {
        EventPayload::TaskAssigned { task, notes } => OutboundMessage::AssignTask {
            event_id: event.id,
            task: task.clone(),
            notes: notes.clone(),
        },
        EventPayload::TaskStatusChanged {
            task,
            previous,
            status,
            reason,
            previous_scheduled_date,
        } => OutboundMessage::TaskUpdate {
            event_id: event.id,
            actor_id: event.actor_id,
            task: task.clone(),
            previous_status: *previous,
            status: *status,
            reason: reason.clone(),
            previous_scheduled_date: *previous_scheduled_date,
        },
        EventPayload::ChatPosted(message) => OutboundMessage::NewMessage {
            message: message.clone(),
        },
        EventPayload::ApplicationDecided {
            application_id,
            applicant_id,
            approved: true,
            reason,
        } => OutboundMessage::ApplicationApproved {
            event_id: event.id,
            application_id: *application_id,
            applicant_id: *applicant_id,
            reason: reason.clone(),
        },
        EventPayload::ApplicationDecided {
            application_id,
            applicant_id,
            approved: false,
            reason,
        } => OutboundMessage::ApplicationRejected {
            event_id: event.id,
            application_id: *application_id,
            applicant_id: *applicant_id,
            reason: reason.clone(),
        },
        EventPayload::EmergencyAlert {
            title,
            message,
            severity,
            latitude,
            longitude,
        } => OutboundMessage::EmergencyAlert {
            event_id: event.id,
            title: title.clone(),
            message: message.clone(),
            severity: *severity,
            latitude: *latitude,
            longitude: *longitude,
            issued_at: event.occurred_at,
        },
        EventPayload::SystemAnnouncement { title, message, .. } => {
            OutboundMessage::SystemNotification {
                event_id: event.id,
                title: title.clone(),
                message: message.clone(),
                issued_at: event.occurred_at,
            }
        }
    }
}

/// `new_notification` for one stored notification.
pub fn notification_message(notification: &Notification) -> OutboundMessage {
    OutboundMessage::NewNotification {
        notification: notification.clone(),
    }
}

/// Error frame carrying the error code and any retry hint.
pub fn error_message(err: &AppError) -> OutboundMessage {
    rejected_send_message(err, None)
}

/// Error frame for a failed `send_message`, echoing its `client_id`.
pub fn rejected_send_message(err: &AppError, client_id: Option<String>) -> OutboundMessage {
    OutboundMessage::Error {
        code: err.kind.code().to_string(),
        message: err.message.clone(),
        retry_after_seconds: err.retry_after_seconds,
        client_id,
    }
}

/// Keepalive ping.
pub fn ping_message() -> OutboundMessage {
    OutboundMessage::Ping {
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// Serialize a message once for fan-out.
pub fn encode(message: &OutboundMessage) -> AppResult<Frame> {
    let text = serde_json::to_string(message)?;
    Ok(Frame::from(text))
}
