//! Handlers for project stages on the pipeline timeline.
//!
//! Every write loads the project's stages, checks the change against the
//! overlap resolver in `studioplan_core::timeline`, and only then persists.

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use studioplan_core::error::CoreError;
use studioplan_core::timeline::{
    drag_offset, partition_stages, schedule_from_tray, try_drag, StageBoard, StagePlacement,
};
use studioplan_core::types::DbId;
use studioplan_db::models::stage::ProjectStage;
use studioplan_db::repositories::{ProjectRepo, ProjectStageRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Stages of one project split the way the timeline draws them.
#[derive(Debug, Serialize)]
pub struct StageTimeline {
    pub project_id: DbId,
    /// Applicable stages with a start date, in display order.
    pub scheduled: Vec<StagePlacement>,
    /// Applicable stages waiting in the tray.
    pub unscheduled: Vec<StagePlacement>,
    /// Stages marked not applicable.
    pub hidden: Vec<StagePlacement>,
}

/// Body for `POST /stages/{id}/move`.
///
/// Either `offset_weeks`, or a pixel drag (`pixel_delta` + `week_width_px`)
/// that is rounded to whole weeks.
#[derive(Debug, Deserialize, Validate)]
pub struct MoveStageRequest {
    #[validate(range(min = -5200, max = 5200))]
    pub offset_weeks: Option<i64>,
    pub pixel_delta: Option<f64>,
    pub week_width_px: Option<f64>,
}

/// Body for `POST /stages/{id}/place`.
#[derive(Debug, Deserialize)]
pub struct PlaceStageRequest {
    pub target_date: NaiveDate,
}

/// Body for `PATCH /stages/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct EditStageRequest {
    pub start_date: Option<NaiveDate>,
    /// Send the stage back to the tray. Wins over `start_date`.
    #[serde(default)]
    pub unschedule: bool,
    #[validate(range(min = 1, max = 520))]
    pub duration_weeks: Option<i32>,
    pub applicable: Option<bool>,
}

async fn load_stage(state: &AppState, id: DbId) -> AppResult<ProjectStage> {
    ProjectStageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Stage",
            id,
        }))
}

async fn load_siblings(state: &AppState, project_id: DbId) -> AppResult<Vec<StagePlacement>> {
    Ok(ProjectStageRepo::list_by_project(&state.pool, project_id)
        .await?
        .iter()
        .map(ProjectStage::placement)
        .collect())
}

async fn persist_start(
    state: &AppState,
    stage: &ProjectStage,
    start: Option<NaiveDate>,
) -> AppResult<ProjectStage> {
    ProjectStageRepo::update_placement(&state.pool, stage.id, start, stage.duration_weeks)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Stage",
            id: stage.id,
        }))
}

/// GET /api/v1/projects/{id}/stages
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<StageTimeline>>> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    let stages = load_siblings(&state, project_id).await?;
    let (scheduled, unscheduled) = partition_stages(&stages);
    let timeline = StageTimeline {
        project_id,
        scheduled: scheduled.into_iter().cloned().collect(),
        unscheduled: unscheduled.into_iter().cloned().collect(),
        hidden: stages.iter().filter(|s| !s.applicable).cloned().collect(),
    };
    Ok(Json(DataResponse { data: timeline }))
}

/// POST /api/v1/stages/{id}/move
///
/// Shift a scheduled stage by whole weeks. A move that would overlap
/// another stage is rejected with 409 and nothing is written.
pub async fn move_stage(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveStageRequest>,
) -> AppResult<Json<DataResponse<ProjectStage>>> {
    input.validate()?;

    let offset = match (input.offset_weeks, input.pixel_delta, input.week_width_px) {
        (Some(weeks), _, _) => weeks,
        (None, Some(px), Some(width)) => drag_offset(px, width)?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide offset_weeks, or pixel_delta with week_width_px".to_string(),
            ))
        }
    };

    let stage = load_stage(&state, id).await?;
    let siblings = load_siblings(&state, stage.project_id).await?;
    let start = try_drag(id, offset, &siblings)?;

    let updated = persist_start(&state, &stage, Some(start)).await?;
    tracing::info!(stage_id = id, offset, start = %start, "Stage moved");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/stages/{id}/place
///
/// Drop a stage (from the tray or the timeline) on a date. When the target
/// week range is taken the stage slides to the nearest free slot.
pub async fn place_stage(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PlaceStageRequest>,
) -> AppResult<Json<DataResponse<ProjectStage>>> {
    let stage = load_stage(&state, id).await?;
    if !stage.applicable {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Stage '{}' is marked not applicable",
            stage.name
        ))));
    }
    let siblings = load_siblings(&state, stage.project_id).await?;
    let start = schedule_from_tray(id, input.target_date, &siblings)?;

    let updated = persist_start(&state, &stage, Some(start)).await?;
    tracing::info!(
        stage_id = id,
        target = %input.target_date,
        start = %start,
        "Stage placed"
    );
    Ok(Json(DataResponse { data: updated }))
}

/// PATCH /api/v1/stages/{id}
///
/// Edit start, duration or applicability. The edit is applied to an
/// in-memory board first; if persisting fails the board is rolled back and
/// the stored row restored to match it.
pub async fn edit_stage(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<EditStageRequest>,
) -> AppResult<Json<DataResponse<ProjectStage>>> {
    input.validate()?;

    let stage = load_stage(&state, id).await?;
    let applicable = input.applicable.unwrap_or(stage.applicable);
    // Check overlaps as the stage will be after the edit, including a stage
    // that is being switched back to applicable.
    let siblings = load_siblings(&state, stage.project_id)
        .await?
        .into_iter()
        .map(|mut s| {
            if s.stage_id == id {
                s.applicable = applicable;
            }
            s
        })
        .collect();
    let mut board = StageBoard::new(siblings);

    let start = if input.unschedule {
        None
    } else {
        input.start_date.or(stage.start_date)
    };
    let duration = input.duration_weeks.unwrap_or(stage.duration_weeks);
    let edit = board.apply_edit(id, start, duration)?;
    let placed = board.get(id).cloned().ok_or(AppError::Core(CoreError::NotFound {
        entity: "Stage",
        id,
    }))?;

    let saved = match save_edit(&state, &placed, input.applicable).await {
        Ok(saved) => saved,
        Err(err) => {
            board.rollback(edit);
            if let Some(previous) = board.get(id) {
                tracing::warn!(stage_id = id, error = %err, "Stage edit failed, restoring previous placement");
                if let Err(restore_err) = ProjectStageRepo::update_placement(
                    &state.pool,
                    id,
                    previous.start_date,
                    previous.duration_weeks,
                )
                .await
                {
                    tracing::error!(stage_id = id, error = %restore_err, "Failed to restore stage placement");
                }
            }
            return Err(err);
        }
    };

    Ok(Json(DataResponse { data: saved }))
}

async fn save_edit(
    state: &AppState,
    placed: &StagePlacement,
    applicable: Option<bool>,
) -> AppResult<ProjectStage> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Stage",
            id: placed.stage_id,
        })
    };

    let mut saved = ProjectStageRepo::update_placement(
        &state.pool,
        placed.stage_id,
        placed.start_date,
        placed.duration_weeks,
    )
    .await?
    .ok_or_else(not_found)?;

    if let Some(applicable) = applicable.filter(|a| *a != saved.applicable) {
        saved = ProjectStageRepo::set_applicable(&state.pool, placed.stage_id, applicable)
            .await?
            .ok_or_else(not_found)?;
    }
    Ok(saved)
}
