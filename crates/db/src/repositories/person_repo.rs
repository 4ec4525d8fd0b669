//! Repository for the `people` table.

use sqlx::PgPool;
use studioplan_core::project::DEFAULT_WEEKLY_CAPACITY;
use studioplan_core::types::DbId;

use crate::models::person::{CreatePerson, Person};

const COLUMNS: &str = "id, name, email, role, office_id, weekly_capacity, created_at, updated_at";

/// Provides create and lookup operations for people.
pub struct PersonRepo;

impl PersonRepo {
    /// Insert a person. A missing capacity defaults to 40 hours.
    pub async fn create(pool: &PgPool, input: &CreatePerson) -> Result<Person, sqlx::Error> {
        let query = format!(
            "INSERT INTO people (name, email, role, office_id, weekly_capacity)
             VALUES ($1, $2, $3, $4, COALESCE($5, $6))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(input.name.trim())
            .bind(&input.email)
            .bind(&input.role)
            .bind(input.office_id)
            .bind(input.weekly_capacity)
            .bind(DEFAULT_WEEKLY_CAPACITY)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM people WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by display name. Returns the oldest match.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM people WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(name.trim())
            .fetch_optional(pool)
            .await
    }

    /// List everyone, optionally restricted to one office, ordered by name.
    pub async fn list(pool: &PgPool, office_id: Option<DbId>) -> Result<Vec<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM people
             WHERE ($1::BIGINT IS NULL OR office_id = $1)
             ORDER BY name, id"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(office_id)
            .fetch_all(pool)
            .await
    }
}
