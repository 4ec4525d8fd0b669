//! HTTP-level integration tests for the planning endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, patch_json, post_json, post_multipart, put_json};
use serde_json::json;
use sqlx::PgPool;

async fn create_project(pool: &PgPool, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/projects", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn create_person(pool: &PgPool, name: &str, capacity: f64) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/people",
        json!({ "name": name, "weekly_capacity": capacity }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn stage_ids(pool: &PgPool, project_id: i64) -> Vec<i64> {
    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}/stages"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["unscheduled"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stage_id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_project_applies_defaults_and_generates_code(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Riverside Library" })).await;

    assert_eq!(project["code"], "PROJ-001");
    assert_eq!(project["status"], "Active");
    assert_eq!(project["currency"], "USD");
    assert_eq!(project["target_profit_pct"], 15.0);

    let second = create_project(&pool, json!({ "name": "Harbour Pavilion" })).await;
    assert_eq!(second["code"], "PROJ-002");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_project_normalizes_status_and_currency(pool: PgPool) {
    let project = create_project(
        &pool,
        json!({ "code": "P-7", "name": "Civic Centre", "status": "on-hold", "currency": "gbp" }),
    )
    .await;

    assert_eq!(project["status"], "On Hold");
    assert_eq!(project["currency"], "GBP");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_project_code_returns_409(pool: PgPool) {
    create_project(&pool, json!({ "code": "P-1", "name": "First" })).await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/projects",
        json!({ "code": "P-1", "name": "Second" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_project_fields_return_400(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/projects",
        json!({ "name": "Too Profitable", "target_profit_pct": 150.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/projects",
        json!({ "name": "Odd Status", "status": "sideways" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn project_update_and_delete(pool: PgPool) {
    let project = create_project(&pool, json!({ "code": "P-2", "name": "Original" })).await;
    let id = project["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{id}"),
        json!({ "name": "Renamed", "status": "done" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["status"], "Completed");
    assert_eq!(json["data"]["code"], "P-2");

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(common::build_test_app(pool), &format!("/api/v1/projects/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_project_stages_start_in_the_tray(pool: PgPool) {
    let project = create_project(
        &pool,
        json!({ "name": "Staged", "stages": ["Concept", "Design", "Build"] }),
    )
    .await;
    let id = project["id"].as_i64().unwrap();

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{id}/stages"),
    )
    .await;
    let json = body_json(response).await;

    assert_eq!(json["data"]["scheduled"].as_array().unwrap().len(), 0);
    let tray = json["data"]["unscheduled"].as_array().unwrap();
    let names: Vec<&str> = tray.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Concept", "Design", "Build"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn placing_on_a_taken_week_slides_to_nearest_free_week(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Slide", "stages": ["A", "B"] })).await;
    let ids = stage_ids(&pool, project["id"].as_i64().unwrap()).await;

    // Wednesday snaps to its Monday.
    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/place", ids[0]),
        json!({ "target_date": "2026-03-04" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["start_date"], "2026-03-02");

    // Same week is taken; the week before and after are equally close and
    // the earlier one wins.
    let response = post_json(
        common::build_test_app(pool),
        &format!("/api/v1/stages/{}/place", ids[1]),
        json!({ "target_date": "2026-03-02" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["start_date"], "2026-02-23");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlapping_move_is_rejected_and_not_saved(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Clash", "stages": ["A", "B"] })).await;
    let project_id = project["id"].as_i64().unwrap();
    let ids = stage_ids(&pool, project_id).await;

    for (id, date) in [(ids[0], "2026-03-02"), (ids[1], "2026-03-16")] {
        let response = post_json(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/stages/{id}/place"),
            json!({ "target_date": date }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/move", ids[1]),
        json!({ "offset_weeks": -2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "STAGE_OVERLAP");

    // A pixel drag of 1.4 weeks rounds to one week and lands in the gap.
    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/move", ids[1]),
        json!({ "pixel_delta": -56.0, "week_width_px": 40.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["start_date"], "2026-03-09");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_moves_return_400_and_leave_the_stage(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Far", "stages": ["A"] })).await;
    let ids = stage_ids(&pool, project["id"].as_i64().unwrap()).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/place", ids[0]),
        json!({ "target_date": "2026-03-02" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/move", ids[0]),
        json!({ "offset_weeks": 100_000_000 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}/move", ids[0]),
        json!({ "pixel_delta": 1e300, "week_width_px": 1.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TIMELINE_EDIT");

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{}/stages", project["id"].as_i64().unwrap()),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["scheduled"][0]["start_date"], "2026-03-02");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn edit_stage_duration_and_applicability(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Edit", "stages": ["A", "B"] })).await;
    let project_id = project["id"].as_i64().unwrap();
    let ids = stage_ids(&pool, project_id).await;

    for (id, date) in [(ids[0], "2026-03-02"), (ids[1], "2026-03-09")] {
        post_json(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/stages/{id}/place"),
            json!({ "target_date": date }),
        )
        .await;
    }

    // Growing A to two weeks would run into B.
    let response = patch_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}", ids[0]),
        json!({ "duration_weeks": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Hiding B frees the week, after which A can grow.
    let response = patch_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}", ids[1]),
        json!({ "applicable": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["applicable"], false);

    let response = patch_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}", ids[0]),
        json!({ "duration_weeks": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["duration_weeks"], 2);

    // Bringing B back would now overlap A.
    let response = patch_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stages/{}", ids[1]),
        json!({ "applicable": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{project_id}/stages"),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["hidden"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["scheduled"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn zero_week_duration_is_rejected(pool: PgPool) {
    let project = create_project(&pool, json!({ "name": "Zero", "stages": ["A"] })).await;
    let ids = stage_ids(&pool, project["id"].as_i64().unwrap()).await;

    let response = patch_json(
        common::build_test_app(pool),
        &format!("/api/v1/stages/{}", ids[0]),
        json!({ "duration_weeks": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Allocations and utilization
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn allocations_upsert_and_feed_utilization(pool: PgPool) {
    let project = create_project(&pool, json!({ "code": "P-9", "name": "Busy" })).await;
    let project_id = project["id"].as_i64().unwrap();
    let person_id = create_person(&pool, "Ana Lima", 40.0).await;

    for hours in [30.0, 50.0] {
        let response = put_json(
            common::build_test_app(pool.clone()),
            "/api/v1/allocations",
            json!({
                "project_id": project_id,
                "person_id": person_id,
                "week_start": "2026-03-05",
                "hours": hours,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["week_start"], "2026-03-02");
        assert_eq!(json["data"]["resource_type"], "active");
    }

    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/allocations?from=2026-03-02&to=2026-03-08",
    )
    .await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hours"], 50.0);

    let response = get(
        common::build_test_app(pool),
        "/api/v1/utilization?from=2026-03-02&to=2026-03-15",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["allocated_hours"], 50.0);
    assert_eq!(rows[0]["utilization_pct"], 125.0);
    assert_eq!(rows[0]["over_allocated"], true);
    assert_eq!(rows[1]["allocated_hours"], 0.0);
    assert_eq!(rows[1]["over_allocated"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_resource_type_and_reversed_ranges_return_400(pool: PgPool) {
    let response = put_json(
        common::build_test_app(pool.clone()),
        "/api/v1/allocations",
        json!({
            "project_id": 1,
            "person_id": 1,
            "week_start": "2026-03-02",
            "hours": 8.0,
            "resource_type": "freelance",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/allocations?from=2026-03-09&to=2026-03-02",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(
        common::build_test_app(pool),
        "/api/v1/utilization?from=2026-01-05&to=2028-06-05",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

const PROJECTS_CSV: &[u8] = b"Project Code,Project Name,Status,Currency\n\
P-100,Alpha,WIP,GBP\n\
,Beta,Active,\n";

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_preview_validates_without_writing(pool: PgPool) {
    let response = post_multipart(
        common::build_test_app(pool.clone()),
        "/api/v1/imports/preview",
        "projects.csv",
        PROJECTS_CSV,
        &[("transpose", "false")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["layout"], "standard");
    assert_eq!(data["transposed"], false);
    assert_eq!(data["rows"].as_array().unwrap().len(), 2);
    assert_eq!(data["summary"]["success"], true);
    assert_eq!(data["summary"]["success_count"], 2);
    assert_eq!(data["rows"][1]["draft"]["code"], "PROJ-001");

    let response = get(common::build_test_app(pool), "/api/v1/projects").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_commit_persists_rows_and_reports_existing_codes(pool: PgPool) {
    let response = post_multipart(
        common::build_test_app(pool.clone()),
        "/api/v1/imports/commit",
        "projects.csv",
        PROJECTS_CSV,
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["success_count"], 2);

    let response = get(common::build_test_app(pool.clone()), "/api/v1/projects").await;
    let json = body_json(response).await;
    let mut codes: Vec<String> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap().to_string())
        .collect();
    codes.sort();
    assert_eq!(codes, vec!["P-100", "PROJ-001"]);

    // Re-importing the same file: the explicit code now exists.
    let response = post_multipart(
        common::build_test_app(pool),
        "/api/v1/imports/commit",
        "projects.csv",
        PROJECTS_CSV,
        &[],
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["success_count"], 1);
    let errors = json["data"]["errors"].as_array().unwrap();
    assert!(errors[0].as_str().unwrap().contains("already exists"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn matrix_import_creates_projects_and_allocations(pool: PgPool) {
    let person_id = create_person(&pool, "Ana Lima", 40.0).await;
    let csv = b"Project Code,Project Name,Ana Lima\n1.1,Riverside,0.5\n1.2,Harbour,\n";

    let response = post_multipart(
        common::build_test_app(pool.clone()),
        "/api/v1/imports/commit",
        "matrix.csv",
        csv,
        &[("week_start", "2026-03-04")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success_count"], 1);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/allocations?from=2026-03-02&to=2026-03-08&person_id={person_id}"),
    )
    .await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hours"], 20.0);
    assert_eq!(rows[0]["week_start"], "2026-03-02");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn matrix_preview_suggests_close_names(pool: PgPool) {
    create_person(&pool, "Ana Lima", 40.0).await;
    let csv = b"Project Code,Project Name,Anna Lima\n1.1,Riverside,0.5\n1.2,Harbour,0.25\n";

    let response = post_multipart(
        common::build_test_app(pool),
        "/api/v1/imports/preview",
        "matrix.csv",
        csv,
        &[],
    )
    .await;
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["layout"], "matrix");
    assert_eq!(data["summary"]["success"], false);
    let suggestions = data["summary"]["suggestions"].as_array().unwrap();
    assert!(suggestions
        .iter()
        .any(|s| s.as_str().unwrap().contains("'Ana Lima'")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn matrix_cells_outside_a_week_are_reported_and_not_saved(pool: PgPool) {
    let person_id = create_person(&pool, "Ana Lima", 40.0).await;
    let csv = b"Project Code,Project Name,Ana Lima\n1.1,Riverside,5000\n1.2,Harbour,NaN\n1.3,Depot,500%\n1.4,Quay,0.5\n";

    let response = post_multipart(
        common::build_test_app(pool.clone()),
        "/api/v1/imports/preview",
        "matrix.csv",
        csv,
        &[],
    )
    .await;
    let json = body_json(response).await;
    let summary = &json["data"]["summary"];
    assert_eq!(summary["success"], false);
    assert_eq!(summary["success_count"], 1);
    let errors: Vec<&str> = summary["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Row 2: 5000 hours"));
    assert!(errors[1].starts_with("Row 4: 200 hours"));
    let warnings = summary["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap().contains("'NaN'")));

    let response = post_multipart(
        common::build_test_app(pool.clone()),
        "/api/v1/imports/commit",
        "matrix.csv",
        csv,
        &[("week_start", "2026-03-02")],
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["success_count"], 1);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/allocations?from=2026-03-02&to=2026-03-08&person_id={person_id}"),
    )
    .await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hours"], 20.0);
}
