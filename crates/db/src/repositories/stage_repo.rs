//! Repository for the `project_stages` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use studioplan_core::types::DbId;

use crate::models::stage::{CreateProjectStage, ProjectStage};

const COLUMNS: &str = "id, project_id, name, start_date, duration_weeks, applicable, sort_order, \
                       created_at, updated_at";

/// Provides stage listing and timeline placement updates.
pub struct ProjectStageRepo;

impl ProjectStageRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProjectStage,
    ) -> Result<ProjectStage, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_stages
                (project_id, name, start_date, duration_weeks, applicable, sort_order)
             VALUES ($1, $2, $3, COALESCE($4, 1), COALESCE($5, TRUE), COALESCE($6, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectStage>(&query)
            .bind(input.project_id)
            .bind(input.name.trim())
            .bind(input.start_date)
            .bind(input.duration_weeks)
            .bind(input.applicable)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Create one unscheduled stage per name, in order, inside a transaction.
    pub async fn create_many(
        pool: &PgPool,
        project_id: DbId,
        names: &[String],
    ) -> Result<Vec<ProjectStage>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(names.len());

        let query = format!(
            "INSERT INTO project_stages (project_id, name, sort_order)
             VALUES ($1, $2, $3)
             ON CONFLICT (project_id, name) DO UPDATE SET sort_order = EXCLUDED.sort_order
             RETURNING {COLUMNS}"
        );

        for (index, name) in names.iter().enumerate() {
            let row = sqlx::query_as::<_, ProjectStage>(&query)
                .bind(project_id)
                .bind(name.trim())
                .bind(index as i32)
                .fetch_one(&mut *tx)
                .await?;
            results.push(row);
        }

        tx.commit().await?;
        tracing::debug!(project_id, count = results.len(), "Created project stages");
        Ok(results)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectStage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_stages WHERE id = $1");
        sqlx::query_as::<_, ProjectStage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All stages of a project in display order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectStage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_stages
             WHERE project_id = $1
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, ProjectStage>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Persist a stage's start and duration. `start_date = None` moves the
    /// stage back to the unscheduled tray.
    pub async fn update_placement(
        pool: &PgPool,
        id: DbId,
        start_date: Option<NaiveDate>,
        duration_weeks: i32,
    ) -> Result<Option<ProjectStage>, sqlx::Error> {
        let query = format!(
            "UPDATE project_stages SET start_date = $2, duration_weeks = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectStage>(&query)
            .bind(id)
            .bind(start_date)
            .bind(duration_weeks)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_applicable(
        pool: &PgPool,
        id: DbId,
        applicable: bool,
    ) -> Result<Option<ProjectStage>, sqlx::Error> {
        let query = format!(
            "UPDATE project_stages SET applicable = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectStage>(&query)
            .bind(id)
            .bind(applicable)
            .fetch_optional(pool)
            .await
    }
}
