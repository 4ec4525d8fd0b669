//! Repository for the `offices` table.

use sqlx::PgPool;
use studioplan_core::project::DEFAULT_CURRENCY;
use studioplan_core::types::DbId;

use crate::models::office::{CreateOffice, Office};

const COLUMNS: &str = "id, name, country, currency, created_at, updated_at";

pub struct OfficeRepo;

impl OfficeRepo {
    pub async fn create(pool: &PgPool, input: &CreateOffice) -> Result<Office, sqlx::Error> {
        let query = format!(
            "INSERT INTO offices (name, country, currency)
             VALUES ($1, $2, COALESCE($3, $4))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Office>(&query)
            .bind(&input.name)
            .bind(&input.country)
            .bind(&input.currency)
            .bind(DEFAULT_CURRENCY)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Office>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offices WHERE id = $1");
        sqlx::query_as::<_, Office>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Office>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offices WHERE LOWER(name) = LOWER($1)");
        sqlx::query_as::<_, Office>(&query)
            .bind(name.trim())
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Office>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offices ORDER BY name");
        sqlx::query_as::<_, Office>(&query).fetch_all(pool).await
    }
}
