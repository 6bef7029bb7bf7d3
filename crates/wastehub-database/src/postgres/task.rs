//! PostgreSQL task store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use wastehub_core::result::AppResult;
use wastehub_core::types::{PageRequest, PageResponse, TaskId};
use wastehub_entity::task::{PickupTask, TaskStatusChange};

use super::db_err;
use crate::store::{TaskFilter, TaskStore};

/// Task store on the `pickup_tasks` and `task_status_history` tables.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    /// Create a new task store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_change<'e, E>(executor: E, change: &TaskStatusChange) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO task_status_history (id, task_id, from_status, to_status, actor_id, note, changed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(change.id)
    .bind(change.task_id)
    .bind(change.from_status)
    .bind(change.to_status)
    .bind(change.actor_id)
    .bind(&change.note)
    .bind(change.changed_at)
    .execute(executor)
    .await
    .map_err(db_err("Failed to record task status change"))?;
    Ok(())
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    qb.push(" WHERE TRUE");
    if let Some(collector_id) = filter.collector_id {
        qb.push(" AND collector_id = ").push_bind(collector_id);
    }
    if let Some(resident_id) = filter.resident_id {
        qb.push(" AND resident_id = ").push_bind(resident_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: &PickupTask, change: &TaskStatusChange) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        sqlx::query(
            "INSERT INTO pickup_tasks (id, report_id, collector_id, resident_id, status, scheduled_date, \
             estimated_duration_minutes, actual_start_time, actual_end_time, notes, completion_notes, images, \
             version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(task.id)
        .bind(task.report_id)
        .bind(task.collector_id)
        .bind(task.resident_id)
        .bind(task.status)
        .bind(task.scheduled_date)
        .bind(task.estimated_duration_minutes)
        .bind(task.actual_start_time)
        .bind(task.actual_end_time)
        .bind(&task.notes)
        .bind(&task.completion_notes)
        .bind(&task.images)
        .bind(task.version)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to insert task"))?;

        insert_change(&mut *tx, change).await?;

        tx.commit().await.map_err(db_err("Failed to commit task insert"))
    }

    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<PickupTask>> {
        sqlx::query_as::<_, PickupTask>("SELECT * FROM pickup_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find task"))
    }

    async fn update_if_version(
        &self,
        task: &PickupTask,
        expected_version: i64,
        changes: &[TaskStatusChange],
    ) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let result = sqlx::query(
            "UPDATE pickup_tasks SET status = $3, scheduled_date = $4, estimated_duration_minutes = $5, \
             actual_start_time = $6, actual_end_time = $7, notes = $8, completion_notes = $9, images = $10, \
             version = $11, updated_at = $12 \
             WHERE id = $1 AND version = $2",
        )
        .bind(task.id)
        .bind(expected_version)
        .bind(task.status)
        .bind(task.scheduled_date)
        .bind(task.estimated_duration_minutes)
        .bind(task.actual_start_time)
        .bind(task.actual_end_time)
        .bind(&task.notes)
        .bind(&task.completion_notes)
        .bind(&task.images)
        .bind(task.version)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to update task"))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back task update"))?;
            return Ok(false);
        }

        for change in changes {
            insert_change(&mut *tx, change).await?;
        }

        tx.commit()
            .await
            .map_err(db_err("Failed to commit task update"))?;
        Ok(true)
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PickupTask>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM pickup_tasks");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count tasks"))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM pickup_tasks");
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY scheduled_date ASC, id ASC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let tasks = select
            .build_query_as::<PickupTask>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list tasks"))?;

        Ok(PageResponse::new(tasks, page, total as u64))
    }

    async fn history(&self, id: TaskId) -> AppResult<Vec<TaskStatusChange>> {
        sqlx::query_as::<_, TaskStatusChange>(
            "SELECT * FROM task_status_history WHERE task_id = $1 ORDER BY changed_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load task history"))
    }
}
