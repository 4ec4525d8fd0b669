//! Repository for the `resource_allocations` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use studioplan_core::import::RESOURCE_TYPE_ACTIVE;
use studioplan_core::types::DbId;

use crate::models::allocation::{ResourceAllocation, UpsertAllocation, WeeklyHours};

const COLUMNS: &str =
    "id, project_id, person_id, week_start, hours, resource_type, created_at, updated_at";

/// Weekly allocations. There is at most one row per (project, person, week);
/// writes replace the hours of an existing row.
pub struct AllocationRepo;

impl AllocationRepo {
    /// Insert or overwrite one allocation (last write wins).
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertAllocation,
    ) -> Result<ResourceAllocation, sqlx::Error> {
        let query = format!(
            "INSERT INTO resource_allocations (project_id, person_id, week_start, hours, resource_type)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_allocations_project_person_week
             DO UPDATE SET hours = EXCLUDED.hours, resource_type = EXCLUDED.resource_type
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceAllocation>(&query)
            .bind(input.project_id)
            .bind(input.person_id)
            .bind(input.week_start)
            .bind(input.hours)
            .bind(input.resource_type.as_deref().unwrap_or(RESOURCE_TYPE_ACTIVE))
            .fetch_one(pool)
            .await
    }

    /// Allocations with `from <= week_start <= to`, optionally for one
    /// project or one person.
    pub async fn list_range(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
        project_id: Option<DbId>,
        person_id: Option<DbId>,
    ) -> Result<Vec<ResourceAllocation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resource_allocations
             WHERE week_start BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR project_id = $3)
               AND ($4::BIGINT IS NULL OR person_id = $4)
             ORDER BY week_start, project_id, person_id"
        );
        sqlx::query_as::<_, ResourceAllocation>(&query)
            .bind(from)
            .bind(to)
            .bind(project_id)
            .bind(person_id)
            .fetch_all(pool)
            .await
    }

    /// Hours per person per week across all projects.
    pub async fn weekly_totals(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeeklyHours>, sqlx::Error> {
        sqlx::query_as::<_, WeeklyHours>(
            "SELECT person_id, week_start, SUM(hours)::DOUBLE PRECISION AS hours
             FROM resource_allocations
             WHERE week_start BETWEEN $1 AND $2
             GROUP BY person_id, week_start
             ORDER BY person_id, week_start",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Remove one allocation. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resource_allocations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
