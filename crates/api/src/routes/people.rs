//! Route definitions for the `/people` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::person;
use crate::state::AppState;

/// Upload ceiling for roster images, slightly above the handler's own
/// image size check so that check produces the error.
const ROSTER_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Routes mounted at `/people`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// POST   /roster/extract          -> extract_roster (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(person::list).post(person::create))
        .route(
            "/roster/extract",
            post(person::extract_roster).layer(DefaultBodyLimit::max(ROSTER_BODY_LIMIT)),
        )
}
