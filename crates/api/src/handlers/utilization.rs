//! Handler for the weekly utilization report.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use studioplan_core::types::DbId;
use studioplan_core::utilization::{
    weekly_utilization, weeks_between, AllocatedHours, PersonCapacity, UtilizationRow,
    MAX_REPORT_WEEKS,
};
use studioplan_db::repositories::{AllocationRepo, PersonRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UtilizationParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub office_id: Option<DbId>,
}

/// GET /api/v1/utilization?from=&to=
///
/// One row per person per week in the range.
pub async fn report(
    State(state): State<AppState>,
    Query(params): Query<UtilizationParams>,
) -> AppResult<Json<DataResponse<Vec<UtilizationRow>>>> {
    if params.to < params.from {
        return Err(AppError::BadRequest("'to' must not be before 'from'".to_string()));
    }
    let weeks = weeks_between(params.from, params.to);
    let (Some(&first), Some(&last)) = (weeks.first(), weeks.last()) else {
        return Ok(Json(DataResponse { data: Vec::new() }));
    };
    if (params.to - last).num_days() >= 7 {
        return Err(AppError::BadRequest(format!(
            "Reports cover at most {MAX_REPORT_WEEKS} weeks"
        )));
    }

    let people: Vec<PersonCapacity> = PersonRepo::list(&state.pool, params.office_id)
        .await?
        .into_iter()
        .map(|p| PersonCapacity {
            person_id: p.id,
            name: p.name,
            weekly_capacity: p.weekly_capacity,
        })
        .collect();

    let allocations: Vec<AllocatedHours> = AllocationRepo::weekly_totals(&state.pool, first, params.to)
        .await?
        .into_iter()
        .map(|w| AllocatedHours {
            person_id: w.person_id,
            week_start: w.week_start,
            hours: w.hours,
        })
        .collect();

    let rows = weekly_utilization(&people, &allocations, &weeks);
    Ok(Json(DataResponse { data: rows }))
}
