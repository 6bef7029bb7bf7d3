//! PostgreSQL store implementations.

mod chat;
mod directory;
mod notification;
mod task;

pub use chat::PgChatStore;
pub use directory::PgDirectory;
pub use notification::PgNotificationStore;
pub use task::PgTaskStore;

use wastehub_core::error::{AppError, ErrorKind};

/// Map a sqlx error into a database [`AppError`] with context.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, format!("{context}: {e}"), e)
}
