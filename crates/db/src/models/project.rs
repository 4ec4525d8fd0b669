//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studioplan_core::project::ProjectStatus;
use studioplan_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
///
/// `status` holds the canonical label (`"On Hold"`, not `"OnHold"`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub status: String,
    pub currency: String,
    pub target_profit_pct: f64,
    pub office_id: Option<DbId>,
    pub manager_id: Option<DbId>,
    pub stages: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub code: String,
    pub name: String,
    /// Defaults to Active if omitted.
    pub status: Option<ProjectStatus>,
    /// Defaults to USD if omitted.
    pub currency: Option<String>,
    /// Defaults to 15 if omitted.
    pub target_profit_pct: Option<f64>,
    pub office_id: Option<DbId>,
    pub manager_id: Option<DbId>,
    #[serde(default)]
    pub stages: Vec<String>,
}

/// DTO for updating a project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub currency: Option<String>,
    pub target_profit_pct: Option<f64>,
    pub office_id: Option<DbId>,
    pub manager_id: Option<DbId>,
}
