//! Target rooms of each domain event.

use tracing::warn;

use wastehub_entity::event::{Audience, DomainEvent, EventPayload};
use wastehub_entity::task::TaskSnapshot;
use wastehub_entity::user::UserRole;

use super::room::{AreaGrid, RoomId};

/// Resolve the rooms an event is pushed to. Pure; order is stable and
/// duplicates are removed.
pub fn resolve_rooms_for_event(event: &DomainEvent, grid: &AreaGrid) -> Vec<RoomId> {
    let rooms = match &event.payload {
        EventPayload::TaskAssigned { task, .. } | EventPayload::TaskStatusChanged { task, .. } => {
            task_rooms(task)
        }
        EventPayload::ChatPosted(message) => match RoomId::parse(&message.room, grid) {
            Ok(room) => vec![room],
            Err(e) => {
                warn!(room = %message.room, error = %e, "Chat message has an unroutable room");
                Vec::new()
            }
        },
        EventPayload::EmergencyAlert { .. } => {
            vec![RoomId::Role(UserRole::Collector), RoomId::Role(UserRole::Admin)]
        }
        EventPayload::ApplicationDecided { applicant_id, .. } => {
            vec![RoomId::User(*applicant_id), RoomId::Role(UserRole::Admin)]
        }
        EventPayload::SystemAnnouncement { audience, .. } => match audience {
            Audience::All => UserRole::ALL.into_iter().map(RoomId::Role).collect(),
            Audience::Role { role } => vec![RoomId::Role(*role)],
            Audience::Area {
                latitude,
                longitude,
            } => match grid.room_for(*latitude, *longitude) {
                Ok(room) => vec![room],
                Err(e) => {
                    warn!(error = %e, "Announcement area is out of range");
                    Vec::new()
                }
            },
        },
    };

    let mut unique = Vec::with_capacity(rooms.len());
    for room in rooms {
        if !unique.contains(&room) {
            unique.push(room);
        }
    }
    unique
}

/// The task room and the admin room, plus both participants' personal rooms
/// so they hear about the task before joining its room.
fn task_rooms(task: &TaskSnapshot) -> Vec<RoomId> {
    vec![
        RoomId::Task(task.task_id),
        RoomId::Role(UserRole::Admin),
        RoomId::User(task.collector_id),
        RoomId::User(task.resident_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wastehub_core::types::{ApplicationId, MessageId, ReportId, TaskId, UserId};
    use wastehub_entity::chat::{ChatMessage, MessageKind};
    use wastehub_entity::event::AlertSeverity;
    use wastehub_entity::task::TaskStatus;

    fn snapshot() -> TaskSnapshot {
        TaskSnapshot {
            task_id: TaskId::new(),
            report_id: ReportId::new(),
            collector_id: UserId::new(),
            resident_id: UserId::new(),
            status: TaskStatus::InProgress,
            scheduled_date: Utc::now(),
            estimated_duration_minutes: 30,
            actual_start_time: Some(Utc::now()),
            actual_end_time: None,
            version: 2,
            report_title: None,
            address: None,
            latitude: None,
            longitude: None,
            collector_name: None,
        }
    }

    #[test]
    fn test_task_status_reaches_task_admin_and_participants() {
        let task = snapshot();
        let event = DomainEvent::new(
            Some(task.collector_id),
            EventPayload::TaskStatusChanged {
                task: task.clone(),
                previous: TaskStatus::Scheduled,
                status: TaskStatus::InProgress,
                reason: None,
                previous_scheduled_date: None,
            },
        );
        let rooms = resolve_rooms_for_event(&event, &AreaGrid::default());
        assert_eq!(
            rooms,
            vec![
                RoomId::Task(task.task_id),
                RoomId::Role(UserRole::Admin),
                RoomId::User(task.collector_id),
                RoomId::User(task.resident_id),
            ]
        );
    }

    #[test]
    fn test_chat_goes_to_exactly_its_room() {
        let a = UserId::new();
        let b = UserId::new();
        let room = RoomId::dm(a, b);
        let event = DomainEvent::new(
            Some(a),
            EventPayload::ChatPosted(ChatMessage {
                id: MessageId::new(),
                room: room.to_string(),
                sender_id: a,
                sender_name: "Alice".into(),
                sender_role: UserRole::Resident,
                body: "hello".into(),
                kind: MessageKind::Text,
                client_id: None,
                created_at: Utc::now(),
            }),
        );
        assert_eq!(resolve_rooms_for_event(&event, &AreaGrid::default()), vec![room]);
    }

    #[test]
    fn test_emergency_alert_ignores_area() {
        let event = DomainEvent::new(
            None,
            EventPayload::EmergencyAlert {
                title: "Gas leak".into(),
                message: "Avoid Harbour St".into(),
                severity: AlertSeverity::Critical,
                latitude: Some(40.0),
                longitude: Some(-74.0),
            },
        );
        assert_eq!(
            resolve_rooms_for_event(&event, &AreaGrid::default()),
            vec![RoomId::Role(UserRole::Collector), RoomId::Role(UserRole::Admin)]
        );
    }

    #[test]
    fn test_application_decision_and_announcements() {
        let applicant = UserId::new();
        let decided = DomainEvent::new(
            None,
            EventPayload::ApplicationDecided {
                application_id: ApplicationId::new(),
                applicant_id: applicant,
                approved: true,
                reason: None,
            },
        );
        assert_eq!(
            resolve_rooms_for_event(&decided, &AreaGrid::default()),
            vec![RoomId::User(applicant), RoomId::Role(UserRole::Admin)]
        );

        let everyone = DomainEvent::new(
            None,
            EventPayload::SystemAnnouncement {
                audience: Audience::All,
                title: "Maintenance".into(),
                message: "Tonight 22:00".into(),
            },
        );
        assert_eq!(resolve_rooms_for_event(&everyone, &AreaGrid::default()).len(), 3);

        let area = DomainEvent::new(
            None,
            EventPayload::SystemAnnouncement {
                audience: Audience::Area {
                    latitude: 40.7128,
                    longitude: -74.006,
                },
                title: "Street closed".into(),
                message: "Use the side entrance".into(),
            },
        );
        let rooms = resolve_rooms_for_event(&area, &AreaGrid::default());
        assert_eq!(rooms[0].to_string(), "area:40.71,-74.00");
    }
}
