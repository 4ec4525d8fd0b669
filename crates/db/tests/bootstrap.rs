use sqlx::PgPool;

/// Connect, migrate, verify every planner table exists.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    studioplan_db::health_check(&pool).await.unwrap();

    let tables = [
        "offices",
        "people",
        "projects",
        "project_stages",
        "resource_allocations",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Every unique constraint follows the `uq_` naming convention the API
/// relies on to report conflicts.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_constraints_are_prefixed(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT constraint_name
         FROM information_schema.table_constraints
         WHERE constraint_type = 'UNIQUE' AND table_schema = 'public'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!names.is_empty());
    for (name,) in names {
        assert!(name.starts_with("uq_"), "constraint {name} should start with uq_");
    }
}
