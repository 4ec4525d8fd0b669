//! Person entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studioplan_core::types::{DbId, Timestamp};

/// A row from the `people` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub office_id: Option<DbId>,
    pub weekly_capacity: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a person.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePerson {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub office_id: Option<DbId>,
    /// Defaults to 40 if omitted.
    pub weekly_capacity: Option<f64>,
}
