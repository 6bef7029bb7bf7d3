//! In-memory task store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{PageRequest, PageResponse, TaskId};
use wastehub_entity::task::{PickupTask, TaskStatusChange};

use crate::store::{TaskFilter, TaskStore};

/// Task store on concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<TaskId, PickupTask>,
    history: DashMap<TaskId, Vec<TaskStatusChange>>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: &PickupTask, change: &TaskStatusChange) -> AppResult<()> {
        match self.tasks.entry(task.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!("Task {} already exists", task.id))),
            Entry::Vacant(slot) => {
                self.history.entry(task.id).or_default().push(change.clone());
                slot.insert(task.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<PickupTask>> {
        Ok(self.tasks.get(&id).map(|t| t.clone()))
    }

    async fn update_if_version(
        &self,
        task: &PickupTask,
        expected_version: i64,
        changes: &[TaskStatusChange],
    ) -> AppResult<bool> {
        // The task's shard lock is held until the history is appended, so
        // history order always matches commit order. Lock order: tasks, then history.
        let mut stored = self
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| AppError::not_found(format!("Task {} not found", task.id)))?;
        if stored.version != expected_version {
            return Ok(false);
        }
        if !changes.is_empty() {
            self.history
                .entry(task.id)
                .or_default()
                .extend(changes.iter().cloned());
        }
        *stored = task.clone();
        Ok(true)
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PickupTask>> {
        let mut matching: Vec<PickupTask> = self
            .tasks
            .iter()
            .filter(|t| filter.matches(t.value()))
            .map(|t| t.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            a.scheduled_date
                .cmp(&b.scheduled_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(PageResponse::from_vec(matching, page))
    }

    async fn history(&self, id: TaskId) -> AppResult<Vec<TaskStatusChange>> {
        Ok(self.history.get(&id).map(|h| h.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use wastehub_core::error::ErrorKind;
    use wastehub_core::types::{ReportId, UserId};
    use wastehub_entity::task::TaskStatus;

    use super::*;

    fn task() -> PickupTask {
        let now = Utc::now();
        PickupTask {
            id: TaskId::new(),
            report_id: ReportId::new(),
            collector_id: UserId::new(),
            resident_id: UserId::new(),
            status: TaskStatus::Scheduled,
            scheduled_date: now,
            estimated_duration_minutes: 30,
            actual_start_time: None,
            actual_end_time: None,
            notes: None,
            completion_notes: None,
            images: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn change(task: &PickupTask, from: Option<TaskStatus>, to: TaskStatus, note: &str) -> TaskStatusChange {
        TaskStatusChange::new(task.id, from, to, task.collector_id, Some(note.into()), Utc::now())
    }

    async fn seeded() -> (MemoryTaskStore, PickupTask) {
        let store = MemoryTaskStore::new();
        let task = task();
        store
            .insert(&task, &change(&task, None, TaskStatus::Scheduled, "assigned"))
            .await
            .unwrap();
        (store, task)
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts_without_history() {
        let (store, task) = seeded().await;
        let err = store
            .insert(&task, &change(&task, None, TaskStatus::Scheduled, "again"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.history(task.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_leaves_task_and_history_untouched() {
        let (store, task) = seeded().await;
        let mut next = task.clone();
        next.status = TaskStatus::InProgress;
        next.version = 2;

        let changes = [change(&task, Some(TaskStatus::Scheduled), TaskStatus::InProgress, "start")];
        assert!(!store.update_if_version(&next, 7, &changes).await.unwrap());

        let stored = store.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Scheduled);
        assert_eq!(stored.version, 1);
        assert_eq!(store.history(task.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_multiple_changes_are_appended_in_order() {
        let (store, task) = seeded().await;
        let mut next = task.clone();
        next.version = 2;
        let changes = [
            change(&task, Some(TaskStatus::Scheduled), TaskStatus::Rescheduled, "moved"),
            change(&task, Some(TaskStatus::Rescheduled), TaskStatus::Scheduled, "moved"),
        ];
        assert!(store.update_if_version(&next, 1, &changes).await.unwrap());

        let statuses: Vec<_> = store
            .history(task.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.to_status)
            .collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Scheduled, TaskStatus::Rescheduled, TaskStatus::Scheduled]
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_task_is_not_found() {
        let store = MemoryTaskStore::new();
        let task = task();
        let err = store.update_if_version(&task, 1, &[]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_record_history_in_version_order() {
        let (store, task) = seeded().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let id = task.id;
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    loop {
                        let current = store.find_by_id(id).await.unwrap().unwrap();
                        let mut next = current.clone();
                        next.version = current.version + 1;
                        let note = next.version.to_string();
                        let changes = [change(&current, Some(current.status), current.status, &note)];
                        if store
                            .update_if_version(&next, current.version, &changes)
                            .await
                            .unwrap()
                        {
                            break;
                        }
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let versions: Vec<i64> = store
            .history(task.id)
            .await
            .unwrap()
            .into_iter()
            .skip(1)
            .map(|c| c.note.unwrap().parse().unwrap())
            .collect();
        assert_eq!(versions, (2..=201).collect::<Vec<i64>>());
    }
}
