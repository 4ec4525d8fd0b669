//! Repository for the `projects` table.

use sqlx::PgPool;
use studioplan_core::project::{
    ProjectStatus, DEFAULT_CURRENCY, DEFAULT_TARGET_PROFIT_PCT,
};
use studioplan_core::types::DbId;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, code, name, status, currency, target_profit_pct, office_id, \
                       manager_id, stages, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Missing status, currency and target profit fall back to Active, USD
    /// and 15 respectively. A duplicate code violates `uq_projects_code`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (code, name, status, currency, target_profit_pct, office_id, manager_id, stages)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.code.trim())
            .bind(input.name.trim())
            .bind(input.status.unwrap_or_default().as_str())
            .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
            .bind(input.target_profit_pct.unwrap_or(DEFAULT_TARGET_PROFIT_PCT))
            .bind(input.office_id)
            .bind(input.manager_id)
            .bind(&input.stages)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Exact, case-insensitive lookup by code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE UPPER(code) = UPPER($1)");
        sqlx::query_as::<_, Project>(&query)
            .bind(code.trim())
            .fetch_optional(pool)
            .await
    }

    /// List projects, optionally filtered by status, newest first.
    pub async fn list(
        pool: &PgPool,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    /// Every code in use, for import de-duplication.
    pub async fn list_codes(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT code FROM projects ORDER BY code")
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                currency = COALESCE($4, currency),
                target_profit_pct = COALESCE($5, target_profit_pct),
                office_id = COALESCE($6, office_id),
                manager_id = COALESCE($7, manager_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.status.map(|s| s.as_str()))
            .bind(&input.currency)
            .bind(input.target_profit_pct)
            .bind(input.office_id)
            .bind(input.manager_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project and, by cascade, its stages and allocations.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
