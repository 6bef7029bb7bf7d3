//! In-memory report and user directory.

use async_trait::async_trait;
use dashmap::DashMap;

use wastehub_core::result::AppResult;
use wastehub_core::types::{ReportId, UserId};
use wastehub_entity::report::ReportSummary;
use wastehub_entity::user::UserProfile;

use crate::store::{ReportDirectory, UserDirectory};

/// Directory seeded by the caller; stands in for the identity and reporting services.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<UserId, UserProfile>,
    reports: DashMap<ReportId, ReportSummary>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn upsert_user(&self, user: UserProfile) {
        self.users.insert(user.id, user);
    }

    /// Add or replace a report.
    pub fn upsert_report(&self, report: ReportSummary) {
        self.reports.insert(report.id, report);
    }
}

#[async_trait]
impl ReportDirectory for MemoryDirectory {
    async fn get_report(&self, id: ReportId) -> AppResult<Option<ReportSummary>> {
        Ok(self.reports.get(&id).map(|r| r.clone()))
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }
}
