//! Notification storage, listing, and read tracking.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use wastehub_core::config::realtime::NotificationConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{NotificationId, PageRequest, PageResponse};
use wastehub_database::store::{NotificationFilter, NotificationStore};
use wastehub_entity::event::DomainEvent;
use wastehub_entity::notification::Notification;

use super::rules::project;
use crate::context::Actor;

/// Projects events into per-user notifications and serves them back.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// Lifetime of a notification; `None` keeps them forever.
    ttl: Option<Duration>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, config: &NotificationConfig) -> Self {
        let ttl = (config.ttl_days > 0).then(|| Duration::days(i64::from(config.ttl_days)));
        Self { store, ttl }
    }

    /// Store the notifications an event implies.
    ///
    /// Returns only rows inserted by this call, so recording the same
    /// event twice yields nothing the second time.
    pub async fn record(&self, event: &DomainEvent) -> AppResult<Vec<Notification>> {
        let projected = project(event);
        if projected.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let expires_at = self.ttl.map(|ttl| now + ttl);
        let mut created = Vec::with_capacity(projected.len());
        for new in projected {
            let notification = new.into_notification(event.id, now, expires_at);
            if self.store.insert_if_absent(&notification).await? {
                created.push(notification);
            } else {
                debug!(
                    event_id = %event.id,
                    user_id = %notification.user_id,
                    "Notification already recorded for event"
                );
            }
        }

        if !created.is_empty() {
            info!(
                event_id = %event.id,
                event = event.name(),
                count = created.len(),
                "Notifications recorded"
            );
        }
        Ok(created)
    }

    /// Lists the actor's unexpired notifications, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.store
            .list(actor.user_id, filter, Utc::now(), page)
            .await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, actor: &Actor) -> AppResult<u64> {
        self.store.count_unread(actor.user_id, Utc::now()).await
    }

    /// Marks one of the actor's notifications as read. Repeating it is a no-op.
    pub async fn mark_read(&self, actor: &Actor, id: NotificationId) -> AppResult<Notification> {
        let mut notification = self.owned(actor, id).await?;
        if !notification.is_read {
            let now = Utc::now();
            self.store.mark_read(id, now).await?;
            notification.is_read = true;
            notification.read_at = Some(now);
        }
        Ok(notification)
    }

    /// Marks all of the actor's notifications as read.
    pub async fn mark_all_read(&self, actor: &Actor) -> AppResult<u64> {
        self.store.mark_all_read(actor.user_id, Utc::now()).await
    }

    /// Deletes one of the actor's notifications.
    pub async fn delete(&self, actor: &Actor, id: NotificationId) -> AppResult<()> {
        self.owned(actor, id).await?;
        if !self.store.delete(id).await? {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Deletes every notification of the actor.
    pub async fn clear_all(&self, actor: &Actor) -> AppResult<u64> {
        self.store.delete_all(actor.user_id).await
    }

    /// Removes expired notifications of every user.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.store.purge_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Purged expired notifications");
        }
        Ok(removed)
    }

    async fn owned(&self, actor: &Actor, id: NotificationId) -> AppResult<Notification> {
        let notification = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
        if notification.user_id != actor.user_id {
            return Err(AppError::forbidden("This notification belongs to another user"));
        }
        Ok(notification)
    }
}
