//! Handlers for people and team roster extraction.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use studioplan_core::roster::RosterMember;
use studioplan_core::types::DbId;
use studioplan_db::models::person::{CreatePerson, Person};
use studioplan_db::repositories::PersonRepo;
use studioplan_functions::encode_image;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest roster image accepted for extraction.
const MAX_ROSTER_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePersonRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<String>,
    pub office_id: Option<DbId>,
    #[validate(range(min = 0.0, max = 168.0))]
    pub weekly_capacity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub office_id: Option<DbId>,
}

/// POST /api/v1/people
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePersonRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Person>>)> {
    input.validate()?;

    let person = PersonRepo::create(
        &state.pool,
        &CreatePerson {
            name: input.name,
            email: input.email,
            role: input.role,
            office_id: input.office_id,
            weekly_capacity: input
                .weekly_capacity
                .or(Some(state.config.import.default_weekly_capacity)),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: person })))
}

/// GET /api/v1/people
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Person>>>> {
    let people = PersonRepo::list(&state.pool, params.office_id).await?;
    Ok(Json(DataResponse { data: people }))
}

/// POST /api/v1/people/roster/extract
///
/// Multipart upload with a single `image` field (any `image/*` type). The
/// image is sent to the remote roster extractor and the normalised roster
/// is returned for review; nothing is saved.
pub async fn extract_roster(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<Vec<RosterMember>>>> {
    let functions = state.functions.clone().ok_or_else(|| {
        AppError::Unavailable("Roster extraction requires FUNCTIONS_URL to be configured".into())
    })?;

    let mut image: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if !matches!(field.name(), Some("image") | Some("file")) {
            continue;
        }
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;
        image = Some((mime, data.to_vec()));
    }

    let (mime, bytes) =
        image.ok_or_else(|| AppError::BadRequest("Missing 'image' upload field".to_string()))?;
    if !mime.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "Expected an image upload, got '{mime}'"
        )));
    }
    if bytes.is_empty() || bytes.len() > MAX_ROSTER_IMAGE_BYTES {
        return Err(AppError::BadRequest(format!(
            "Image must be between 1 byte and {MAX_ROSTER_IMAGE_BYTES} bytes"
        )));
    }

    let roster = functions
        .extract_team_roster(&encode_image(&bytes), &mime)
        .await?;
    tracing::info!(members = roster.len(), "Extracted team roster");
    Ok(Json(DataResponse { data: roster }))
}
