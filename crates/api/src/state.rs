use std::sync::Arc;

use studioplan_core::import::ColumnAnalyzer;
use studioplan_functions::FunctionsApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: studioplan_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Remote functions client; `None` when `FUNCTIONS_URL` is unset.
    pub functions: Option<Arc<FunctionsApi>>,
}

impl AppState {
    /// The remote column analyser, when one is configured.
    pub fn analyzer(&self) -> Option<&dyn ColumnAnalyzer> {
        self.functions
            .as_deref()
            .map(|api| api as &dyn ColumnAnalyzer)
    }
}
