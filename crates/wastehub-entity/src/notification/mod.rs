//! Notification entities.

pub mod kind;
pub mod model;

pub use kind::{NotificationPriority, NotificationType};
pub use model::{NewNotification, Notification};
