//! PostgreSQL report and user directory.

use async_trait::async_trait;
use sqlx::PgPool;

use wastehub_core::result::AppResult;
use wastehub_core::types::{ReportId, UserId};
use wastehub_entity::report::ReportSummary;
use wastehub_entity::user::UserProfile;

use super::db_err;
use crate::store::{ReportDirectory, UserDirectory};

/// Reads the `users` and `reports` tables maintained by the owning services.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Create a new directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportDirectory for PgDirectory {
    async fn get_report(&self, id: ReportId) -> AppResult<Option<ReportSummary>> {
        sqlx::query_as::<_, ReportSummary>(
            "SELECT id, resident_id, title, address, latitude, longitude, waste_type FROM reports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to look up report"))
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT id, name, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to look up user"))
    }
}
