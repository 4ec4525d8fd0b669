//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use studioplan_core::error::CoreError;
use studioplan_core::project::{normalize_currency, CodeGenerator, ProjectStatus};
use studioplan_core::types::DbId;
use studioplan_db::models::project::{CreateProject, Project, UpdateProject};
use studioplan_db::repositories::{ProjectRepo, ProjectStageRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /projects`. A missing code is generated from the
/// configured prefix.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub status: Option<String>,
    pub currency: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub target_profit_pct: Option<f64>,
    pub office_id: Option<DbId>,
    pub manager_id: Option<DbId>,
    #[serde(default)]
    pub stages: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub target_profit_pct: Option<f64>,
    pub office_id: Option<DbId>,
    pub manager_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<ProjectStatus>> {
    raw.map(|s| {
        ProjectStatus::parse_loose(s)
            .ok_or_else(|| AppError::Core(CoreError::Validation(format!("Unknown status '{s}'"))))
    })
    .transpose()
}

fn parse_currency(raw: Option<&str>) -> AppResult<Option<String>> {
    raw.map(|c| {
        normalize_currency(c).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Currency '{c}' is not a three-letter code"
            )))
        })
    })
    .transpose()
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;

    let code = match input.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => code.to_string(),
        None => {
            let taken = ProjectRepo::list_codes(&state.pool).await?;
            CodeGenerator::new(&state.config.import.code_prefix, taken).next_code()
        }
    };

    let create = CreateProject {
        code,
        name: input.name.trim().to_string(),
        status: parse_status(input.status.as_deref())?,
        currency: parse_currency(input.currency.as_deref())?
            .or_else(|| Some(state.config.import.default_currency.clone())),
        target_profit_pct: input.target_profit_pct,
        office_id: input.office_id,
        manager_id: input.manager_id,
        stages: input.stages,
    };

    let project = ProjectRepo::create(&state.pool, &create).await?;
    if !project.stages.is_empty() {
        ProjectStageRepo::create_many(&state.pool, project.id, &project.stages).await?;
    }

    tracing::info!(project_id = project.id, code = %project.code, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let status = parse_status(params.status.as_deref())?;
    let projects = ProjectRepo::list(&state.pool, status).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.validate()?;

    let update = UpdateProject {
        name: input.name.map(|n| n.trim().to_string()),
        status: parse_status(input.status.as_deref())?,
        currency: parse_currency(input.currency.as_deref())?,
        target_profit_pct: input.target_profit_pct,
        office_id: input.office_id,
        manager_id: input.manager_id,
    };

    let project = ProjectRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}
