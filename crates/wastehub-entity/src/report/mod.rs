//! Directory view of a waste report.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wastehub_core::types::{ReportId, UserId};

/// The subset of a waste report copied into task events.
///
/// Reports are created and verified by the reporting service; the engine
/// only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReportSummary {
    /// Report identifier.
    pub id: ReportId,
    /// The resident who filed the report.
    pub resident_id: UserId,
    /// Short title.
    pub title: String,
    /// Street address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Waste category label.
    pub waste_type: String,
}
