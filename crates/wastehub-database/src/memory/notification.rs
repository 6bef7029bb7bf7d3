//! In-memory notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use wastehub_core::result::AppResult;
use wastehub_core::types::{EventId, NotificationId, PageRequest, PageResponse, UserId};
use wastehub_entity::notification::Notification;

use crate::store::{NotificationFilter, NotificationStore};

/// Notification store on concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    rows: DashMap<NotificationId, Notification>,
    /// Every `(user, event)` ever delivered. Never shrinks.
    delivered: DashMap<(UserId, EventId), NotificationId>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn remove(&self, id: NotificationId) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn ids_of(&self, user_id: UserId) -> Vec<NotificationId> {
        self.rows
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.id)
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert_if_absent(&self, notification: &Notification) -> AppResult<bool> {
        match self
            .delivered
            .entry((notification.user_id, notification.event_id))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                self.rows.insert(notification.id, notification.clone());
                slot.insert(notification.id);
                Ok(true)
            }
        }
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        Ok(self.rows.get(&id).map(|n| n.clone()))
    }

    async fn list(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        now: DateTime<Utc>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut matching: Vec<Notification> = self
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_expired_at(now) && filter.matches(n))
            .map(|n| n.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(PageResponse::from_vec(matching, page))
    }

    async fn count_unread(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && n.counts_as_unread(now))
            .count() as u64)
    }

    async fn mark_read(&self, id: NotificationId, read_at: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut n) = self.rows.get_mut(&id) {
            if !n.is_read {
                n.is_read = true;
                n.read_at = Some(read_at);
            }
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId, read_at: DateTime<Utc>) -> AppResult<u64> {
        let mut changed = 0;
        for mut n in self.rows.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(read_at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: NotificationId) -> AppResult<bool> {
        Ok(self.remove(id))
    }

    async fn delete_all(&self, user_id: UserId) -> AppResult<u64> {
        Ok(self
            .ids_of(user_id)
            .into_iter()
            .filter(|id| self.remove(*id))
            .count() as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let expired: Vec<NotificationId> = self
            .rows
            .iter()
            .filter(|n| n.is_expired_at(now))
            .map(|n| n.id)
            .collect();
        Ok(expired.into_iter().filter(|id| self.remove(*id)).count() as u64)
    }
}
