//! Route definitions for the `/offices` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::office;
use crate::state::AppState;

/// Routes mounted at `/offices`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(office::list).post(office::create))
}
