pub mod allocations;
pub mod health;
pub mod imports;
pub mod offices;
pub mod people;
pub mod projects;
pub mod stages;
pub mod utilization;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` planning routes. `/imports` is mounted separately
/// by the app router because it carries its own limits.
///
/// Route hierarchy:
///
/// ```text
/// /offices                                list, create
///
/// /people                                 list (?office_id), create
/// /people/roster/extract                  extract a roster from an image (POST)
///
/// /projects                               list (?status), create
/// /projects/{id}                          get, update, delete
/// /projects/{id}/stages                   stage timeline (GET)
///
/// /stages/{id}                            edit date / duration / applicability (PATCH)
/// /stages/{id}/move                       drag by whole weeks (POST)
/// /stages/{id}/place                      drop from the tray onto a date (POST)
///
/// /allocations                            list (?from&to&project_id&person_id), upsert (PUT)
///
/// /utilization                            weekly utilization report (GET)
///
/// /imports/preview                        analyze an upload without writing (POST)
/// /imports/commit                         import an upload (POST)
/// /imports/templates/{kind}               CSV template download (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/offices", offices::router())
        .nest("/people", people::router())
        .nest("/projects", projects::router())
        .nest("/stages", stages::router())
        .nest("/allocations", allocations::router())
        .nest("/utilization", utilization::router())
}
