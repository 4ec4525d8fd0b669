//! Spreadsheet import pipeline.
//!
//! The flow is: decode the upload ([`crate::spreadsheet`]), decide the
//! layout, map columns ([`analysis`]), validate rows ([`validation`]) or
//! parse the allocation matrix ([`matrix`]), then persist row by row through
//! an [`runner::ImportSink`]. Every stage reports problems into the same
//! three buckets of [`result::ImportResult`]: errors block a row, warnings
//! and suggestions do not.

pub mod analysis;
pub mod matching;
pub mod matrix;
pub mod result;
pub mod runner;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::project::{
    ProjectStatus, DEFAULT_CODE_PREFIX, DEFAULT_CURRENCY, DEFAULT_WEEKLY_CAPACITY,
};
use crate::types::WeekStart;

pub use analysis::{
    analyze_with_fallback, AnalysisError, AnalysisSource, ColumnAnalyzer, ColumnMapping,
    HeuristicAnalyzer, ProjectField,
};
pub use matrix::{interpret_allocation, parse_matrix, MatrixEntry, MatrixParse};
pub use result::{ImportProgress, ImportResult};
pub use runner::{run_matrix_import, run_project_import, ImportSink, PersonRef};
pub use validation::{validate_rows, ReferenceData, RowValidation};

/// Resource type recorded on allocations created by an import.
pub const RESOURCE_TYPE_ACTIVE: &str = "active";

/// Batch-level knobs for an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Prefix for synthesized project codes.
    pub code_prefix: String,
    /// Currency applied to rows that leave it blank or invalid.
    pub default_currency: String,
    /// Capacity used to turn matrix fractions/percentages into hours when the
    /// person has no capacity of their own.
    pub default_weekly_capacity: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_weekly_capacity: DEFAULT_WEEKLY_CAPACITY,
        }
    }
}

/// A validated project row ready to persist. Office and manager are names;
/// the sink resolves them to ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub code: String,
    pub name: String,
    pub status: ProjectStatus,
    pub currency: String,
    pub target_profit_pct: f64,
    pub office: Option<String>,
    pub manager: Option<String>,
    pub stages: Vec<String>,
}

/// One week of hours for one person on one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDraft {
    pub project_id: crate::types::DbId,
    pub person_id: crate::types::DbId,
    pub week_start: WeekStart,
    pub hours: f64,
    pub resource_type: String,
}
