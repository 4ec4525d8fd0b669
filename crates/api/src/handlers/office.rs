//! Handlers for the `/offices` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use studioplan_core::error::CoreError;
use studioplan_core::project::normalize_currency;
use studioplan_db::models::office::{CreateOffice, Office};
use studioplan_db::repositories::OfficeRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfficeRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub country: Option<String>,
    pub currency: Option<String>,
}

/// POST /api/v1/offices
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateOfficeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Office>>)> {
    input.validate()?;

    let currency = input
        .currency
        .as_deref()
        .map(|c| {
            normalize_currency(c).ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!(
                    "Currency '{c}' is not a three-letter code"
                )))
            })
        })
        .transpose()?;

    let office = OfficeRepo::create(
        &state.pool,
        &CreateOffice {
            name: input.name.trim().to_string(),
            country: input.country,
            currency,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: office })))
}

/// GET /api/v1/offices
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Office>>>> {
    let offices = OfficeRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: offices }))
}
