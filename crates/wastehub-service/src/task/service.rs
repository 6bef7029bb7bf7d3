//! Pickup task use cases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{PageRequest, PageResponse, ReportId, TaskId, UserId};
use wastehub_database::store::{TaskFilter, TaskStore};
use wastehub_entity::event::{DomainEvent, EventPayload};
use wastehub_entity::task::{PickupTask, TaskSnapshot, TaskStatus, TaskStatusChange};
use wastehub_entity::user::UserRole;

use super::state_machine::{self, TaskAction, Transition};
use crate::context::Actor;
use crate::directory::DirectoryService;

/// Input of [`TaskService::assign`].
#[derive(Debug, Clone, Deserialize)]
pub struct AssignTask {
    /// Report to resolve.
    pub report_id: ReportId,
    /// Collector to assign.
    pub collector_id: UserId,
    /// Planned pickup time.
    pub scheduled_date: DateTime<Utc>,
    /// Planned duration in minutes.
    pub estimated_duration_minutes: i32,
    /// Notes for the collector.
    pub notes: Option<String>,
}

/// Result of a task mutation: the stored task and the event to deliver.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// The task as stored.
    pub task: PickupTask,
    /// The event for the dispatcher; `None` for mutations that are not transitions.
    pub event: Option<DomainEvent>,
}

/// Owns the task lifecycle. Never sends anything over the network.
#[derive(Debug, Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    directory: DirectoryService,
}

impl TaskService {
    /// Creates a new task service.
    pub fn new(tasks: Arc<dyn TaskStore>, directory: DirectoryService) -> Self {
        Self { tasks, directory }
    }

    /// Create a `scheduled` task for a report (admin only).
    pub async fn assign(&self, actor: &Actor, input: AssignTask) -> AppResult<TaskOutcome> {
        if !actor.is_admin() {
            return Err(AppError::unauthorized("Only an admin may assign pickups"));
        }
        if input.estimated_duration_minutes <= 0 {
            return Err(AppError::validation(
                "Estimated duration must be a positive number of minutes",
            ));
        }

        let report = self
            .directory
            .report(input.report_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Report {} not found", input.report_id)))?;
        let collector = self
            .directory
            .user(input.collector_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Collector {} not found", input.collector_id))
            })?;
        if collector.role != UserRole::Collector {
            return Err(AppError::validation(format!(
                "User {} is not a collector",
                collector.id
            )));
        }

        let now = Utc::now();
        let notes = input.notes.filter(|n| !n.trim().is_empty());
        let task = PickupTask {
            id: TaskId::new(),
            report_id: report.id,
            collector_id: collector.id,
            resident_id: report.resident_id,
            status: TaskStatus::Scheduled,
            scheduled_date: input.scheduled_date,
            estimated_duration_minutes: input.estimated_duration_minutes,
            actual_start_time: None,
            actual_end_time: None,
            notes: notes.clone(),
            completion_notes: None,
            images: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let change = TaskStatusChange::new(
            task.id,
            None,
            TaskStatus::Scheduled,
            actor.user_id,
            notes.clone(),
            now,
        );
        self.tasks.insert(&task, &change).await?;

        info!(
            task_id = %task.id,
            report_id = %task.report_id,
            collector_id = %task.collector_id,
            "Pickup task assigned"
        );

        let snapshot = TaskSnapshot::new(&task, Some(&report), Some(&collector));
        let event = DomainEvent::new(
            Some(actor.user_id),
            EventPayload::TaskAssigned {
                task: snapshot,
                notes,
            },
        );
        Ok(TaskOutcome {
            task,
            event: Some(event),
        })
    }

    /// `startTask`: `scheduled -> in_progress` by the assigned collector.
    pub async fn start(
        &self,
        actor: &Actor,
        id: TaskId,
        expected_version: Option<i64>,
    ) -> AppResult<TaskOutcome> {
        self.mutate(actor, id, expected_version, TaskAction::Start).await
    }

    /// `completeTask`: `in_progress -> completed` by the assigned collector.
    pub async fn complete(
        &self,
        actor: &Actor,
        id: TaskId,
        notes: Option<String>,
        expected_version: Option<i64>,
    ) -> AppResult<TaskOutcome> {
        self.mutate(actor, id, expected_version, TaskAction::Complete { notes })
            .await
    }

    /// `cancelTask`: from `scheduled` or `in_progress`, by the assigned collector or an admin.
    pub async fn cancel(
        &self,
        actor: &Actor,
        id: TaskId,
        reason: Option<String>,
        expected_version: Option<i64>,
    ) -> AppResult<TaskOutcome> {
        self.mutate(actor, id, expected_version, TaskAction::Cancel { reason })
            .await
    }

    /// `rescheduleTask`: admin moves a `scheduled` task to a future date.
    pub async fn reschedule(
        &self,
        actor: &Actor,
        id: TaskId,
        new_date: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<TaskOutcome> {
        self.mutate(actor, id, expected_version, TaskAction::Reschedule { new_date })
            .await
    }

    /// Attach image URIs to a task (assigned collector).
    pub async fn attach_images(
        &self,
        actor: &Actor,
        id: TaskId,
        uris: Vec<String>,
        expected_version: Option<i64>,
    ) -> AppResult<TaskOutcome> {
        self.mutate(actor, id, expected_version, TaskAction::AttachImages { uris })
            .await
    }

    /// Fetch a task visible to the actor.
    pub async fn get(&self, actor: &Actor, id: TaskId) -> AppResult<PickupTask> {
        let task = self.load(id).await?;
        ensure_visible(&task, actor)?;
        Ok(task)
    }

    /// List tasks. Collectors and residents only ever see their own.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: TaskFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PickupTask>> {
        match actor.role {
            UserRole::Admin => {}
            UserRole::Collector => filter.collector_id = Some(actor.user_id),
            UserRole::Resident => filter.resident_id = Some(actor.user_id),
        }
        self.tasks.list(&filter, page).await
    }

    /// Status history of a task visible to the actor, oldest first.
    pub async fn history(&self, actor: &Actor, id: TaskId) -> AppResult<Vec<TaskStatusChange>> {
        let task = self.load(id).await?;
        ensure_visible(&task, actor)?;
        self.tasks.history(id).await
    }

    async fn load(&self, id: TaskId) -> AppResult<PickupTask> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Task {id} not found")))
    }

    /// Read, apply, and compare-and-swap on `version`.
    ///
    /// When another writer got there first the action is re-validated
    /// against the fresh row so the caller learns whether it is now
    /// illegal or merely lost the race. Nothing is retried.
    async fn mutate(
        &self,
        actor: &Actor,
        id: TaskId,
        expected_version: Option<i64>,
        action: TaskAction,
    ) -> AppResult<TaskOutcome> {
        let current = self.load(id).await?;
        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(AppError::conflict(format!(
                    "Task {id} was modified (version {} is newer than {expected}); reload and try again",
                    current.version
                )));
            }
        }

        let now = Utc::now();
        let mut next = current.clone();
        let transition = state_machine::apply(&mut next, actor, &action, now)?;
        let changes = transition
            .as_ref()
            .map(|t| t.history_rows(id, actor.user_id, now))
            .unwrap_or_default();

        if !self
            .tasks
            .update_if_version(&next, current.version, &changes)
            .await?
        {
            let fresh = self.load(id).await?;
            let mut candidate = fresh.clone();
            state_machine::apply(&mut candidate, actor, &action, Utc::now())?;
            warn!(task_id = %id, action = action.verb(), "Lost task update race");
            return Err(AppError::conflict(format!(
                "Task {id} was modified concurrently; reload and try again"
            )));
        }

        let event = match transition {
            Some(transition) => {
                info!(
                    task_id = %id,
                    actor_id = %actor.user_id,
                    from = %transition.previous,
                    to = %transition.edge,
                    "Task transitioned"
                );
                Some(self.status_event(&next, actor, transition).await)
            }
            None => None,
        };
        Ok(TaskOutcome { task: next, event })
    }

    /// Build the event after the write. Lookups that fail only thin the snapshot.
    async fn status_event(
        &self,
        task: &PickupTask,
        actor: &Actor,
        transition: Transition,
    ) -> DomainEvent {
        let report = self.directory.report_or_none(task.report_id).await;
        let collector = self.directory.user_or_none(task.collector_id).await;
        let snapshot = TaskSnapshot::new(task, report.as_ref(), collector.as_ref());
        DomainEvent::new(
            Some(actor.user_id),
            EventPayload::TaskStatusChanged {
                task: snapshot,
                previous: transition.previous,
                status: transition.edge,
                reason: transition.note,
                previous_scheduled_date: transition.previous_scheduled_date,
            },
        )
    }
}

fn ensure_visible(task: &PickupTask, actor: &Actor) -> AppResult<()> {
    if actor.is_admin() || task.involves(actor.user_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not have access to this task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::Barrier;
    use wastehub_core::config::directory::DirectoryConfig;
    use wastehub_core::error::ErrorKind;
    use wastehub_database::memory::{MemoryDirectory, MemoryTaskStore};
    use wastehub_entity::report::ReportSummary;
    use wastehub_entity::user::UserProfile;

    struct Fixture {
        service: TaskService,
        admin: Actor,
        collector: Actor,
        resident: Actor,
        report_id: ReportId,
    }

    fn fixture_with(tasks: Arc<dyn TaskStore>) -> Fixture {
        let directory = Arc::new(MemoryDirectory::new());
        let admin = Actor::new(UserId::new(), UserRole::Admin, "Ada");
        let collector = Actor::new(UserId::new(), UserRole::Collector, "Casey");
        let resident = Actor::new(UserId::new(), UserRole::Resident, "Rae");
        for actor in [&admin, &collector, &resident] {
            directory.upsert_user(UserProfile {
                id: actor.user_id,
                name: actor.name.clone(),
                role: actor.role,
            });
        }
        let report_id = ReportId::new();
        directory.upsert_report(ReportSummary {
            id: report_id,
            resident_id: resident.user_id,
            title: "Overflowing bin".into(),
            address: "12 Harbour St".into(),
            latitude: 40.7128,
            longitude: -74.0060,
            waste_type: "general".into(),
        });
        let service = TaskService::new(
            tasks,
            DirectoryService::new(directory.clone(), directory, &DirectoryConfig::default()),
        );
        Fixture {
            service,
            admin,
            collector,
            resident,
            report_id,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryTaskStore::new()))
    }

    impl Fixture {
        async fn assign(&self) -> PickupTask {
            self.service
                .assign(
                    &self.admin,
                    AssignTask {
                        report_id: self.report_id,
                        collector_id: self.collector.user_id,
                        scheduled_date: Utc::now() + Duration::hours(3),
                        estimated_duration_minutes: 30,
                        notes: None,
                    },
                )
                .await
                .unwrap()
                .task
        }
    }

    #[tokio::test]
    async fn test_assign_copies_resident_and_emits_event() {
        let f = fixture();
        let outcome = f
            .service
            .assign(
                &f.admin,
                AssignTask {
                    report_id: f.report_id,
                    collector_id: f.collector.user_id,
                    scheduled_date: Utc::now() + Duration::hours(1),
                    estimated_duration_minutes: 20,
                    notes: Some("Side gate".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.task.status, TaskStatus::Scheduled);
        assert_eq!(outcome.task.resident_id, f.resident.user_id);
        assert_eq!(outcome.task.version, 1);
        match outcome.event.unwrap().payload {
            EventPayload::TaskAssigned { task, notes } => {
                assert_eq!(task.report_title.as_deref(), Some("Overflowing bin"));
                assert_eq!(task.collector_name.as_deref(), Some("Casey"));
                assert_eq!(notes.as_deref(), Some("Side gate"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_assign_rejects_non_collector() {
        let f = fixture();
        let err = f
            .service
            .assign(
                &f.admin,
                AssignTask {
                    report_id: f.report_id,
                    collector_id: f.resident.user_id,
                    scheduled_date: Utc::now(),
                    estimated_duration_minutes: 20,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_assign_requires_admin() {
        let f = fixture();
        let err = f
            .service
            .assign(
                &f.collector,
                AssignTask {
                    report_id: f.report_id,
                    collector_id: f.collector.user_id,
                    scheduled_date: Utc::now(),
                    estimated_duration_minutes: 20,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_full_walk_records_history() {
        let f = fixture();
        let task = f.assign().await;

        let started = f.service.start(&f.collector, task.id, None).await.unwrap();
        assert!(started.task.actual_start_time.is_some());
        f.service
            .complete(&f.collector, task.id, Some("Done".into()), None)
            .await
            .unwrap();

        let history = f.service.history(&f.resident, task.id).await.unwrap();
        let walk: Vec<TaskStatus> = history.iter().map(|c| c.to_status).collect();
        assert_eq!(
            walk,
            vec![
                TaskStatus::Scheduled,
                TaskStatus::InProgress,
                TaskStatus::Completed
            ]
        );
    }

    #[tokio::test]
    async fn test_history_after_reschedule_is_a_valid_walk() {
        let f = fixture();
        let task = f.assign().await;
        f.service
            .reschedule(&f.admin, task.id, Utc::now() + Duration::days(3), None)
            .await
            .unwrap();
        f.service.start(&f.collector, task.id, None).await.unwrap();
        f.service.complete(&f.collector, task.id, None, None).await.unwrap();

        let history = f.service.history(&f.admin, task.id).await.unwrap();
        let walk: Vec<TaskStatus> = history.iter().map(|c| c.to_status).collect();
        assert_eq!(
            walk,
            vec![
                TaskStatus::Scheduled,
                TaskStatus::Rescheduled,
                TaskStatus::Scheduled,
                TaskStatus::InProgress,
                TaskStatus::Completed
            ]
        );
        assert_eq!(history[0].from_status, None);
        for pair in history.windows(2) {
            assert_eq!(pair[1].from_status, Some(pair[0].to_status));
            assert!(
                pair[0].to_status.can_transition_to(pair[1].to_status),
                "illegal edge {} -> {}",
                pair[0].to_status,
                pair[1].to_status
            );
        }
    }

    #[tokio::test]
    async fn test_double_start_succeeds_once() {
        let f = fixture();
        let task = f.assign().await;
        f.service.start(&f.collector, task.id, None).await.unwrap();
        let err = f.service.start(&f.collector, task.id, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let f = fixture();
        let task = f.assign().await;
        f.service
            .reschedule(&f.admin, task.id, Utc::now() + Duration::days(2), Some(1))
            .await
            .unwrap();
        let err = f
            .service
            .cancel(&f.collector, task.id, None, Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_reschedule_event_reports_rescheduled_edge() {
        let f = fixture();
        let task = f.assign().await;
        let outcome = f
            .service
            .reschedule(&f.admin, task.id, Utc::now() + Duration::days(1), None)
            .await
            .unwrap();
        assert_eq!(outcome.task.status, TaskStatus::Scheduled);
        match outcome.event.unwrap().payload {
            EventPayload::TaskStatusChanged {
                status, previous, previous_scheduled_date, ..
            } => {
                assert_eq!(status, TaskStatus::Rescheduled);
                assert_eq!(previous, TaskStatus::Scheduled);
                assert_eq!(previous_scheduled_date, Some(task.scheduled_date));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stranger_cannot_read_task() {
        let f = fixture();
        let task = f.assign().await;
        let stranger = Actor::new(UserId::new(), UserRole::Resident, "Sam");
        let err = f.service.get(&stranger, task.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_list_is_scoped_for_collectors() {
        let f = fixture();
        f.assign().await;
        let other = Actor::new(UserId::new(), UserRole::Collector, "Sam");
        let page = f
            .service
            .list(&other, TaskFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        let mine = f
            .service
            .list(&f.collector, TaskFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(mine.items.len(), 1);
    }

    /// Lets two readers observe the same version before either writes.
    #[derive(Debug)]
    struct LockstepStore {
        inner: MemoryTaskStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl TaskStore for LockstepStore {
        async fn insert(&self, task: &PickupTask, change: &TaskStatusChange) -> AppResult<()> {
            self.inner.insert(task, change).await
        }

        async fn find_by_id(&self, id: TaskId) -> AppResult<Option<PickupTask>> {
            let found = self.inner.find_by_id(id).await?;
            if found.as_ref().is_some_and(|t| t.version == 1) {
                self.barrier.wait().await;
            }
            Ok(found)
        }

        async fn update_if_version(
            &self,
            task: &PickupTask,
            expected_version: i64,
            changes: &[TaskStatusChange],
        ) -> AppResult<bool> {
            self.inner.update_if_version(task, expected_version, changes).await
        }

        async fn list(
            &self,
            filter: &TaskFilter,
            page: &PageRequest,
        ) -> AppResult<PageResponse<PickupTask>> {
            self.inner.list(filter, page).await
        }

        async fn history(&self, id: TaskId) -> AppResult<Vec<TaskStatusChange>> {
            self.inner.history(id).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_cancel_and_reschedule_exactly_one_wins() {
        let store = Arc::new(LockstepStore {
            inner: MemoryTaskStore::new(),
            barrier: Barrier::new(2),
        });
        let f = fixture_with(store.clone());

        let now = Utc::now();
        let task = PickupTask {
            id: TaskId::new(),
            report_id: f.report_id,
            collector_id: f.collector.user_id,
            resident_id: f.resident.user_id,
            status: TaskStatus::Scheduled,
            scheduled_date: now + Duration::hours(2),
            estimated_duration_minutes: 30,
            actual_start_time: None,
            actual_end_time: None,
            notes: None,
            completion_notes: None,
            images: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let change =
            TaskStatusChange::new(task.id, None, TaskStatus::Scheduled, f.admin.user_id, None, now);
        store.inner.insert(&task, &change).await.unwrap();

        let (cancel, reschedule) = tokio::join!(
            f.service.cancel(&f.collector, task.id, Some("Blocked".into()), None),
            f.service
                .reschedule(&f.admin, task.id, now + Duration::days(1), None),
        );

        let results = [cancel.map(|o| o.task), reschedule.map(|o| o.task)];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "{results:?}");
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(
            matches!(loser.kind, ErrorKind::Conflict | ErrorKind::InvalidTransition),
            "{loser:?}"
        );
    }
}
