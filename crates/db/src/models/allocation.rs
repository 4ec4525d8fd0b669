//! Weekly resource allocation model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studioplan_core::import::AllocationDraft;
use studioplan_core::types::{DbId, Timestamp};

/// A row from the `resource_allocations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResourceAllocation {
    pub id: DbId,
    pub project_id: DbId,
    pub person_id: DbId,
    pub week_start: NaiveDate,
    pub hours: f64,
    pub resource_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for writing one allocation. Writes upsert on (project, person, week).
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAllocation {
    pub project_id: DbId,
    pub person_id: DbId,
    pub week_start: NaiveDate,
    pub hours: f64,
    /// Defaults to `active` if omitted.
    pub resource_type: Option<String>,
}

impl From<&AllocationDraft> for UpsertAllocation {
    fn from(draft: &AllocationDraft) -> Self {
        Self {
            project_id: draft.project_id,
            person_id: draft.person_id,
            week_start: draft.week_start,
            hours: draft.hours,
            resource_type: Some(draft.resource_type.clone()),
        }
    }
}

/// Hours summed per person per week, for utilization reports.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeeklyHours {
    pub person_id: DbId,
    pub week_start: NaiveDate,
    pub hours: f64,
}
