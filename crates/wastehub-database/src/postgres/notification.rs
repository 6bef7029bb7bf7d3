//! PostgreSQL notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use wastehub_core::result::AppResult;
use wastehub_core::types::{NotificationId, PageRequest, PageResponse, UserId};
use wastehub_entity::notification::Notification;

use super::db_err;
use crate::store::{NotificationFilter, NotificationStore};

/// Notification store on the `notifications` table.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new notification store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    user_id: UserId,
    filter: &NotificationFilter,
    now: DateTime<Utc>,
) {
    qb.push(" WHERE user_id = ")
        .push_bind(user_id)
        .push(" AND (expires_at IS NULL OR expires_at > ")
        .push_bind(now)
        .push(")");
    if let Some(is_read) = filter.is_read {
        qb.push(" AND is_read = ").push_bind(is_read);
    }
    if let Some(kind) = filter.notification_type {
        qb.push(" AND type = ").push_bind(kind);
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert_if_absent(&self, n: &Notification) -> AppResult<bool> {
        // The receipt outlives the notification row, so a replayed event
        // stays deduplicated after the user deletes what it produced.
        let result = sqlx::query(
            "WITH receipt AS ( \
                 INSERT INTO notification_receipts (user_id, event_id, notification_id, delivered_at) \
                 VALUES ($2, $3, $1, $11) \
                 ON CONFLICT (user_id, event_id) DO NOTHING \
                 RETURNING 1 \
             ) \
             INSERT INTO notifications (id, user_id, event_id, type, title, message, priority, payload, \
             is_read, read_at, created_at, expires_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12 \
             WHERE EXISTS (SELECT 1 FROM receipt) \
             ON CONFLICT (user_id, event_id) DO NOTHING",
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(n.event_id)
        .bind(n.notification_type)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.priority)
        .bind(&n.payload)
        .bind(n.is_read)
        .bind(n.read_at)
        .bind(n.created_at)
        .bind(n.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to insert notification"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find notification"))
    }

    async fn list(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        now: DateTime<Utc>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notifications");
        push_filter(&mut count, user_id, filter, now);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count notifications"))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM notifications");
        push_filter(&mut select, user_id, filter, now);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list notifications"))?;

        Ok(PageResponse::new(rows, page, total as u64))
    }

    async fn count_unread(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND is_read = FALSE AND (expires_at IS NULL OR expires_at > $2)",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count unread notifications"))?;
        Ok(count as u64)
    }

    async fn mark_read(&self, id: NotificationId, read_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 WHERE id = $1 AND is_read = FALSE",
        )
        .bind(id)
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark notification read"))?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId, read_at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark notifications read"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete notification"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, user_id: UserId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to clear notifications"))?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge expired notifications"))?;
        Ok(result.rows_affected())
    }
}
