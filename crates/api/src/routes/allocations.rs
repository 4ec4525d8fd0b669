//! Route definitions for the `/allocations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::allocation;
use crate::state::AppState;

/// Routes mounted at `/allocations`.
///
/// ```text
/// GET    /                        -> list
/// PUT    /                        -> upsert
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(allocation::list).put(allocation::upsert))
}
