//! Route definitions for the `/stages` resource.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::stage;
use crate::state::AppState;

/// Routes mounted at `/stages`.
///
/// ```text
/// PATCH  /{id}                    -> edit_stage
/// POST   /{id}/move               -> move_stage
/// POST   /{id}/place              -> place_stage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(stage::edit_stage))
        .route("/{id}/move", post(stage::move_stage))
        .route("/{id}/place", post(stage::place_stage))
}
