//! In-memory store implementations.
//!
//! Each store keeps its rows in `DashMap`s so concurrent requests only
//! contend on the shard holding the row they touch. Semantics match the
//! PostgreSQL stores, including the version check and the
//! `(user_id, event_id)` uniqueness of notifications.

mod chat;
mod directory;
mod notification;
mod task;

pub use chat::MemoryChatStore;
pub use directory::MemoryDirectory;
pub use notification::MemoryNotificationStore;
pub use task::MemoryTaskStore;
