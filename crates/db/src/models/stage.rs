//! Project stage model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studioplan_core::timeline::StagePlacement;
use studioplan_core::types::{DbId, Timestamp};

/// A row from the `project_stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectStage {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub duration_weeks: i32,
    pub applicable: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectStage {
    /// The timeline view of this stage.
    pub fn placement(&self) -> StagePlacement {
        StagePlacement {
            stage_id: self.id,
            project_id: self.project_id,
            name: self.name.clone(),
            start_date: self.start_date,
            duration_weeks: self.duration_weeks,
            applicable: self.applicable,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectStage {
    pub project_id: DbId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    /// Defaults to 1 if omitted.
    pub duration_weeks: Option<i32>,
    /// Defaults to `true` if omitted.
    pub applicable: Option<bool>,
    /// Defaults to 0 if omitted.
    pub sort_order: Option<i32>,
}
