//! Cached report and user lookups.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::warn;

use wastehub_core::config::directory::DirectoryConfig;
use wastehub_core::result::AppResult;
use wastehub_core::types::{ReportId, UserId};
use wastehub_database::store::{ReportDirectory, UserDirectory};
use wastehub_entity::report::ReportSummary;
use wastehub_entity::user::UserProfile;

/// Read-through cache in front of the report and user directories.
///
/// Only hits are cached, so a report created after a miss is found on the
/// next lookup.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    reports: Arc<dyn ReportDirectory>,
    users: Arc<dyn UserDirectory>,
    report_cache: Cache<ReportId, ReportSummary>,
    user_cache: Cache<UserId, UserProfile>,
}

impl DirectoryService {
    /// Creates a new directory service.
    pub fn new(
        reports: Arc<dyn ReportDirectory>,
        users: Arc<dyn UserDirectory>,
        config: &DirectoryConfig,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_seconds);
        Self {
            reports,
            users,
            report_cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(ttl)
                .build(),
            user_cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// `getReport(id)`.
    pub async fn report(&self, id: ReportId) -> AppResult<Option<ReportSummary>> {
        if let Some(hit) = self.report_cache.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.reports.get_report(id).await?;
        if let Some(report) = &found {
            self.report_cache.insert(id, report.clone()).await;
        }
        Ok(found)
    }

    /// `getUser(id)`.
    pub async fn user(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        if let Some(hit) = self.user_cache.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.users.get_user(id).await?;
        if let Some(user) = &found {
            self.user_cache.insert(id, user.clone()).await;
        }
        Ok(found)
    }

    /// Report lookup for enrichment after a write: failures degrade to `None`.
    pub async fn report_or_none(&self, id: ReportId) -> Option<ReportSummary> {
        self.report(id)
            .await
            .inspect_err(|e| warn!(report_id = %id, error = %e, "Report lookup failed"))
            .ok()
            .flatten()
    }

    /// User lookup for enrichment after a write: failures degrade to `None`.
    pub async fn user_or_none(&self, id: UserId) -> Option<UserProfile> {
        self.user(id)
            .await
            .inspect_err(|e| warn!(user_id = %id, error = %e, "User lookup failed"))
            .ok()
            .flatten()
    }
}
