//! Request and response bodies for the remote functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use studioplan_core::import::{AnalysisSource, ColumnMapping, ProjectField};
use studioplan_core::roster::RosterMember;
use studioplan_core::spreadsheet::Layout;

/// Rows sent for structure analysis.
pub const ANALYSIS_SAMPLE_ROWS: usize = 20;

/// Confidence assumed when the classifier omits one.
const DEFAULT_REMOTE_CONFIDENCE: f64 = 0.8;

/// `POST /analyze-excel-structure` body.
#[derive(Debug, Serialize)]
pub struct AnalyzeStructureRequest {
    pub rows: Vec<Vec<String>>,
}

/// One column assignment from the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteColumn {
    pub index: usize,
    pub field: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// `POST /analyze-excel-structure` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeStructureResponse {
    #[serde(default)]
    pub header_row: usize,
    #[serde(default)]
    pub columns: Vec<RemoteColumn>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub layout: Option<String>,
}

impl AnalyzeStructureResponse {
    /// Convert to a [`ColumnMapping`] for a sheet `width` columns wide.
    ///
    /// Columns outside the sheet and unknown field names are dropped. When
    /// the classifier assigns one field to several columns, the most
    /// confident assignment wins (earliest column on ties).
    pub fn into_mapping(self, width: usize) -> ColumnMapping {
        let mut columns = vec![None; width];
        let mut confidence: BTreeMap<ProjectField, f64> = BTreeMap::new();

        for column in self.columns {
            let Some(field) = ProjectField::from_name(&column.field) else {
                tracing::debug!(field = %column.field, "Ignoring unknown remote field");
                continue;
            };
            if column.index >= width {
                continue;
            }
            let score = column
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_REMOTE_CONFIDENCE)
                .clamp(0.0, 1.0);

            if confidence.get(&field).is_some_and(|&existing| existing >= score) {
                continue;
            }
            for slot in columns.iter_mut() {
                if *slot == Some(field) {
                    *slot = None;
                }
            }
            columns[column.index] = Some(field);
            confidence.insert(field, score);
        }

        // A column may have been claimed twice; keep only fields still present.
        confidence.retain(|field, _| columns.contains(&Some(*field)));

        let layout = match self.layout.as_deref().map(str::to_lowercase).as_deref() {
            Some("matrix") => Layout::Matrix,
            _ => Layout::Standard,
        };

        ColumnMapping {
            header_row: self.header_row,
            columns,
            confidence,
            suggestions: self.suggestions,
            layout,
            source: AnalysisSource::Remote,
        }
    }
}

/// `POST /extract-team-roster` body.
#[derive(Debug, Serialize)]
pub struct ExtractRosterRequest<'a> {
    pub image: &'a str,
    pub mime_type: &'a str,
}

/// `POST /extract-team-roster` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRosterResponse {
    #[serde(default)]
    pub members: Vec<RosterMember>,
}
