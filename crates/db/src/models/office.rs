//! Office entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studioplan_core::types::{DbId, Timestamp};

/// A row from the `offices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Office {
    pub id: DbId,
    pub name: String,
    pub country: Option<String>,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOffice {
    pub name: String,
    pub country: Option<String>,
    /// Defaults to USD if omitted.
    pub currency: Option<String>,
}
