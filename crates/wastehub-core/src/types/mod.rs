//! Shared value types: typed identifiers and pagination.

pub mod id;
pub mod pagination;

pub use id::{ApplicationId, EventId, MessageId, NotificationId, ReportId, TaskId, UserId};
pub use pagination::{PageRequest, PageResponse};
