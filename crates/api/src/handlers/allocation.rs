//! Handlers for weekly resource allocations.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use studioplan_core::error::CoreError;
use studioplan_core::import::RESOURCE_TYPE_ACTIVE;
use studioplan_core::timeline::week_start_of;
use studioplan_core::types::DbId;
use studioplan_db::models::allocation::{ResourceAllocation, UpsertAllocation};
use studioplan_db::repositories::AllocationRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Resource types an allocation may carry.
const RESOURCE_TYPES: &[&str] = &[RESOURCE_TYPE_ACTIVE, "pending"];

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertAllocationRequest {
    pub project_id: DbId,
    pub person_id: DbId,
    /// Any date in the target week; stored as that week's Monday.
    pub week_start: NaiveDate,
    #[validate(range(min = 0.0, max = 168.0))]
    pub hours: f64,
    pub resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub project_id: Option<DbId>,
    pub person_id: Option<DbId>,
}

/// PUT /api/v1/allocations
///
/// Insert or overwrite the hours for (project, person, week).
pub async fn upsert(
    State(state): State<AppState>,
    Json(input): Json<UpsertAllocationRequest>,
) -> AppResult<Json<DataResponse<ResourceAllocation>>> {
    input.validate()?;

    let resource_type = input
        .resource_type
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_else(|| RESOURCE_TYPE_ACTIVE.to_string());
    if !RESOURCE_TYPES.contains(&resource_type.as_str()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown resource type '{resource_type}'"
        ))));
    }

    let upsert = UpsertAllocation {
        project_id: input.project_id,
        person_id: input.person_id,
        week_start: week_start_of(input.week_start),
        hours: input.hours,
        resource_type: Some(resource_type),
    };
    let allocation = AllocationRepo::upsert(&state.pool, &upsert).await?;
    Ok(Json(DataResponse { data: allocation }))
}

/// GET /api/v1/allocations?from=&to=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<ResourceAllocation>>>> {
    if params.to < params.from {
        return Err(AppError::BadRequest("'to' must not be before 'from'".to_string()));
    }
    let allocations = AllocationRepo::list_range(
        &state.pool,
        week_start_of(params.from),
        params.to,
        params.project_id,
        params.person_id,
    )
    .await?;
    Ok(Json(DataResponse { data: allocations }))
}
