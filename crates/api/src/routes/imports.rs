//! Route definitions for spreadsheet imports.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Routes mounted at `/imports`. The upload size limit and the longer
/// import timeout are applied by the app router from configuration.
///
/// ```text
/// POST   /preview                 -> preview (multipart)
/// POST   /commit                  -> commit (multipart)
/// GET    /templates/{kind}        -> template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/preview", post(import::preview))
        .route("/commit", post(import::commit))
        .route("/templates/{kind}", get(import::template))
}
