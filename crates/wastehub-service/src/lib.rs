//! # wastehub-service
//!
//! Business logic for WasteHub. Services take their stores as `Arc<dyn _>`
//! at construction time and never touch the network: mutations return the
//! resulting [`DomainEvent`](wastehub_entity::event::DomainEvent) and the
//! realtime engine delivers it.

pub mod chat;
pub mod context;
pub mod directory;
pub mod notification;
pub mod rate_limit;
pub mod task;

pub use chat::ChatService;
pub use context::Actor;
pub use directory::DirectoryService;
pub use notification::NotificationService;
pub use rate_limit::{RateLimitGuard, RateLimitTier};
pub use task::{TaskOutcome, TaskService};
