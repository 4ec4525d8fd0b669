//! Route definitions for the `/utilization` report.

use axum::routing::get;
use axum::Router;

use crate::handlers::utilization;
use crate::state::AppState;

/// Routes mounted at `/utilization`.
///
/// ```text
/// GET    /                        -> report
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(utilization::report))
}
