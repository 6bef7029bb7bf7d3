//! Store and directory traits.
//!
//! The service layer only sees these traits. Every store is
//! `Send + Sync + Debug + 'static` so it can be shared as `Arc<dyn _>`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use wastehub_core::config::database::{DatabaseConfig, StoreBackend};
use wastehub_core::result::AppResult;
use wastehub_core::types::{
    NotificationId, PageRequest, PageResponse, ReportId, TaskId, UserId,
};
use wastehub_entity::chat::ChatMessage;
use wastehub_entity::notification::{Notification, NotificationType};
use wastehub_entity::report::ReportSummary;
use wastehub_entity::task::{PickupTask, TaskStatus, TaskStatusChange};
use wastehub_entity::user::UserProfile;

use crate::connection::DatabasePool;
use crate::memory::{
    MemoryChatStore, MemoryDirectory, MemoryNotificationStore, MemoryTaskStore,
};
use crate::migration::run_migrations;
use crate::postgres::{PgChatStore, PgDirectory, PgNotificationStore, PgTaskStore};

/// Filter for task listings. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Only tasks assigned to this collector.
    pub collector_id: Option<UserId>,
    /// Only tasks for this resident's reports.
    pub resident_id: Option<UserId>,
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// Whether `task` passes the filter.
    pub fn matches(&self, task: &PickupTask) -> bool {
        self.collector_id.is_none_or(|c| task.collector_id == c)
            && self.resident_id.is_none_or(|r| task.resident_id == r)
            && self.status.is_none_or(|s| task.status == s)
    }
}

/// Filter for notification listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    /// Only read (`true`) or unread (`false`) notifications.
    pub is_read: Option<bool>,
    /// Only notifications of this type.
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

impl NotificationFilter {
    /// Whether `n` passes the filter. Expiry is checked separately.
    pub fn matches(&self, n: &Notification) -> bool {
        self.is_read.is_none_or(|r| n.is_read == r)
            && self.notification_type.is_none_or(|t| n.notification_type == t)
    }
}

/// Durable pickup tasks and their status history.
#[async_trait]
pub trait TaskStore: Send + Sync + fmt::Debug + 'static {
    /// Insert a new task together with its creating history entry.
    async fn insert(&self, task: &PickupTask, change: &TaskStatusChange) -> AppResult<()>;

    /// Find a task by id.
    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<PickupTask>>;

    /// Replace the stored task if its version still equals `expected_version`,
    /// appending `changes`, in order, to the history in the same unit of work.
    ///
    /// Returns `false` when another writer bumped the version first.
    async fn update_if_version(
        &self,
        task: &PickupTask,
        expected_version: i64,
        changes: &[TaskStatusChange],
    ) -> AppResult<bool>;

    /// List tasks, soonest scheduled first.
    async fn list(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PickupTask>>;

    /// Status history of a task, oldest first.
    async fn history(&self, id: TaskId) -> AppResult<Vec<TaskStatusChange>>;
}

/// Durable per-user notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + fmt::Debug + 'static {
    /// Insert unless a notification for the same `(user_id, event_id)` was
    /// ever stored. The key stays taken after the row is deleted or purged.
    ///
    /// Returns `true` if the row was inserted.
    async fn insert_if_absent(&self, notification: &Notification) -> AppResult<bool>;

    /// Find a notification by id.
    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// List a user's unexpired notifications, newest first.
    async fn list(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        now: DateTime<Utc>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count unread, unexpired notifications.
    async fn count_unread(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<u64>;

    /// Set `is_read` on one notification. Already-read rows keep their `read_at`.
    async fn mark_read(&self, id: NotificationId, read_at: DateTime<Utc>) -> AppResult<()>;

    /// Mark every unread notification of a user as read. Returns rows changed.
    async fn mark_all_read(&self, user_id: UserId, read_at: DateTime<Utc>) -> AppResult<u64>;

    /// Delete one notification. Returns `true` if it existed.
    async fn delete(&self, id: NotificationId) -> AppResult<bool>;

    /// Delete every notification of a user. Returns rows removed.
    async fn delete_all(&self, user_id: UserId) -> AppResult<u64>;

    /// Delete notifications that expired before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Chat history.
#[async_trait]
pub trait ChatStore: Send + Sync + fmt::Debug + 'static {
    /// Persist a message.
    async fn insert(&self, message: &ChatMessage) -> AppResult<()>;

    /// One page of a room's messages, most recent first.
    async fn recent(&self, room: &str, page: &PageRequest) -> AppResult<Vec<ChatMessage>>;
}

/// Read access to reports owned by the reporting service.
#[async_trait]
pub trait ReportDirectory: Send + Sync + fmt::Debug + 'static {
    /// Look up a report.
    async fn get_report(&self, id: ReportId) -> AppResult<Option<ReportSummary>>;
}

/// Read access to users owned by the identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync + fmt::Debug + 'static {
    /// Look up a user.
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserProfile>>;
}

/// All stores behind trait objects, built for the configured backend.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Task store.
    pub tasks: Arc<dyn TaskStore>,
    /// Notification store.
    pub notifications: Arc<dyn NotificationStore>,
    /// Chat history store.
    pub chat: Arc<dyn ChatStore>,
    /// Report directory.
    pub reports: Arc<dyn ReportDirectory>,
    /// User directory.
    pub users: Arc<dyn UserDirectory>,
    /// Present when the backend is PostgreSQL.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Build the stores for `config.backend`, connecting and migrating when
    /// the backend is PostgreSQL.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            StoreBackend::Postgres => {
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self::postgres(db))
            }
            StoreBackend::Memory => {
                info!("Using in-memory stores");
                Ok(Self::memory(Arc::new(MemoryDirectory::new())))
            }
        }
    }

    /// Stores backed by PostgreSQL.
    pub fn postgres(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        Self {
            tasks: Arc::new(PgTaskStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool.clone())),
            chat: Arc::new(PgChatStore::new(pool)),
            reports: directory.clone(),
            users: directory,
            pool: Some(db),
        }
    }

    /// Stores backed by process memory, sharing one seeded directory.
    pub fn memory(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            tasks: Arc::new(MemoryTaskStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            chat: Arc::new(MemoryChatStore::new()),
            reports: directory.clone(),
            users: directory,
            pool: None,
        }
    }
}
