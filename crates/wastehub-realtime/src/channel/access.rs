//! Who may join which room.

use wastehub_core::types::{TaskId, UserId};
use wastehub_entity::user::UserRole;

use super::room::RoomId;

/// Outcome of a join permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAccess {
    /// The session may join.
    Granted,
    /// The session may join if it can see the task.
    TaskParticipant(TaskId),
    /// The session may not join.
    Denied(&'static str),
}

/// Decide whether `user_id` with `role` may join `room`.
///
/// Admins may listen in on any role room; everyone else only on their own.
/// Area rooms are open to every authenticated user. Task rooms need a task
/// lookup, which the caller performs.
pub fn check_room_access(user_id: UserId, role: UserRole, room: &RoomId) -> RoomAccess {
    match room {
        RoomId::Role(target) if *target == role || role.is_admin() => RoomAccess::Granted,
        RoomId::Role(_) => RoomAccess::Denied("You can only join your own role room"),
        RoomId::Area { .. } => RoomAccess::Granted,
        RoomId::Dm(a, b) if *a == user_id || *b == user_id => RoomAccess::Granted,
        RoomId::Dm(..) => RoomAccess::Denied("You are not part of this conversation"),
        RoomId::Task(task_id) => RoomAccess::TaskParticipant(*task_id),
        RoomId::User(owner) if *owner == user_id => RoomAccess::Granted,
        RoomId::User(_) => RoomAccess::Denied("You can only join your own user room"),
    }
}
