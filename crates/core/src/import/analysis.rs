//! Column-to-field mapping for standard project sheets.
//!
//! Two analysers implement [`ColumnAnalyzer`]: the local
//! [`HeuristicAnalyzer`] and a remote AI classifier living in the
//! `studioplan-functions` crate. [`analyze_with_fallback`] prefers the remote
//! one and quietly degrades to heuristics when it errors.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::project::{is_generated_code, is_project_code, ProjectStatus};
use crate::spreadsheet::{detect_layout, Layout, Sheet};

/// Confidence assigned to a column matched on its header text.
pub const HEADER_MATCH_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to a column matched by sniffing its values.
pub const CONTENT_MATCH_CONFIDENCE: f64 = 0.6;

/// Data rows sampled when sniffing column contents.
const CONTENT_SAMPLE_ROWS: usize = 20;

/// Share of sampled non-empty values that must agree before sniffing
/// assigns a field.
const CONTENT_AGREEMENT: f64 = 0.6;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Project attribute a column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Code,
    Name,
    Status,
    Currency,
    TargetProfit,
    Office,
    Manager,
    Stages,
}

impl ProjectField {
    pub const ALL: [ProjectField; 8] = [
        Self::Code,
        Self::Name,
        Self::Status,
        Self::Currency,
        Self::TargetProfit,
        Self::Office,
        Self::Manager,
        Self::Stages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Status => "status",
            Self::Currency => "currency",
            Self::TargetProfit => "target_profit",
            Self::Office => "office",
            Self::Manager => "manager",
            Self::Stages => "stages",
        }
    }

    /// Parse the snake_case field name used on the wire.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// Exact header spellings (after normalisation) for this field.
    fn header_synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Code => &[
                "code", "project code", "job code", "job number", "job no", "project number",
                "project no", "project #", "job #", "ref", "reference",
            ],
            Self::Name => &["name", "project name", "project", "job name", "job", "title"],
            Self::Status => &["status", "project status", "state"],
            Self::Currency => &["currency", "ccy", "curr", "currency code"],
            Self::TargetProfit => &[
                "target profit", "target profit %", "profit", "profit %", "margin",
                "target margin", "target profit percentage",
            ],
            Self::Office => &["office", "location", "studio", "country", "region"],
            Self::Manager => &[
                "manager", "project manager", "pm", "lead", "project lead", "director",
            ],
            Self::Stages => &["stages", "stage", "phases", "stage list", "project stages"],
        }
    }

    /// Looser fragments tried after exact synonyms fail, in priority order
    /// (see [`CONTAINS_ORDER`]).
    fn header_fragments(&self) -> &'static [&'static str] {
        match self {
            Self::Code => &["code", "number"],
            Self::Name => &["name", "title"],
            Self::Status => &["status"],
            Self::Currency => &["currenc"],
            Self::TargetProfit => &["profit", "margin"],
            Self::Office => &["office", "location"],
            Self::Manager => &["manager"],
            Self::Stages => &["stage", "phase"],
        }
    }
}

/// Fragment matching order; `Code` precedes `Name` so "project code" is not
/// swallowed by the looser name fragments.
const CONTAINS_ORDER: [ProjectField; 8] = [
    ProjectField::Code,
    ProjectField::TargetProfit,
    ProjectField::Currency,
    ProjectField::Status,
    ProjectField::Office,
    ProjectField::Manager,
    ProjectField::Stages,
    ProjectField::Name,
];

/// Where a mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Heuristic,
    Remote,
}

/// Column-to-field assignment for a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Row holding the column headers; data starts on the next row.
    pub header_row: usize,
    /// One entry per sheet column; `None` means the column is ignored.
    pub columns: Vec<Option<ProjectField>>,
    pub confidence: BTreeMap<ProjectField, f64>,
    pub suggestions: Vec<String>,
    pub layout: Layout,
    pub source: AnalysisSource,
}

impl ColumnMapping {
    /// Index of the column mapped to `field`, if any.
    pub fn column_of(&self, field: ProjectField) -> Option<usize> {
        self.columns.iter().position(|f| *f == Some(field))
    }

    pub fn is_mapped(&self, field: ProjectField) -> bool {
        self.column_of(field).is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The remote classifier could not be reached or returned an error.
    #[error("Structure analysis request failed: {0}")]
    Remote(String),

    /// The classifier answered, but not with a usable mapping.
    #[error("Structure analysis returned an unusable mapping: {0}")]
    InvalidResponse(String),
}

/// Something that can map a sheet's columns to project fields.
#[async_trait]
pub trait ColumnAnalyzer: Send + Sync {
    async fn analyze(&self, sheet: &Sheet) -> Result<ColumnMapping, AnalysisError>;
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '%' || c == '#' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn match_header(header: &str, taken: &HashSet<ProjectField>) -> Option<ProjectField> {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return None;
    }

    let exact = ProjectField::ALL
        .into_iter()
        .filter(|f| !taken.contains(f))
        .find(|f| f.header_synonyms().contains(&normalized.as_str()));
    if exact.is_some() {
        return exact;
    }

    CONTAINS_ORDER
        .into_iter()
        .filter(|f| !taken.contains(f))
        .find(|f| f.header_fragments().iter().any(|frag| normalized.contains(frag)))
}

fn sniff_column(sheet: &Sheet, header_row: usize, col: usize) -> Option<ProjectField> {
    let values: Vec<String> = (header_row + 1..sheet.height())
        .filter_map(|r| sheet.get(r, col).as_text())
        .take(CONTENT_SAMPLE_ROWS)
        .collect();
    if values.is_empty() {
        return None;
    }

    let agrees = |pred: &dyn Fn(&str) -> bool| {
        let hits = values.iter().filter(|v| pred(v.as_str())).count();
        hits as f64 / values.len() as f64 >= CONTENT_AGREEMENT
    };

    if agrees(&|v| is_project_code(v) || is_generated_code(v)) {
        Some(ProjectField::Code)
    } else if agrees(&|v| v.len() == 3 && v.chars().all(|c| c.is_ascii_uppercase())) {
        Some(ProjectField::Currency)
    } else if agrees(&|v| ProjectStatus::parse_loose(v).is_some()) {
        Some(ProjectField::Status)
    } else if agrees(&|v| {
        v.trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .is_ok_and(|n| (0.0..=100.0).contains(&n))
    }) {
        Some(ProjectField::TargetProfit)
    } else {
        None
    }
}

/// Local, rule-based column analyser.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    /// Map columns using header synonyms first, then content sniffing for
    /// columns whose header matched nothing.
    pub fn analyze_sheet(&self, sheet: &Sheet) -> ColumnMapping {
        let header_row = 0;
        let mut columns: Vec<Option<ProjectField>> = vec![None; sheet.width()];
        let mut confidence = BTreeMap::new();
        let mut taken = HashSet::new();

        for (col, slot) in columns.iter_mut().enumerate() {
            let Some(header) = sheet.get(header_row, col).as_text() else {
                continue;
            };
            if let Some(field) = match_header(&header, &taken) {
                taken.insert(field);
                confidence.insert(field, HEADER_MATCH_CONFIDENCE);
                *slot = Some(field);
            }
        }

        for col in 0..columns.len() {
            if columns[col].is_some() {
                continue;
            }
            if let Some(field) = sniff_column(sheet, header_row, col) {
                if taken.insert(field) {
                    confidence.insert(field, CONTENT_MATCH_CONFIDENCE);
                    columns[col] = Some(field);
                }
            }
        }

        let mut suggestions = Vec::new();
        if !taken.contains(&ProjectField::Code) {
            suggestions.push(
                "No project code column found; codes will be generated for every row"
                    .to_string(),
            );
        }
        if !taken.contains(&ProjectField::Name) {
            suggestions.push(
                "No project name column found; add a 'Project Name' header so rows can be imported"
                    .to_string(),
            );
        }
        if !taken.contains(&ProjectField::Currency) {
            suggestions
                .push("No currency column found; the default currency will be used".to_string());
        }

        ColumnMapping {
            header_row,
            columns,
            confidence,
            suggestions,
            layout: detect_layout(sheet),
            source: AnalysisSource::Heuristic,
        }
    }
}

#[async_trait]
impl ColumnAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, sheet: &Sheet) -> Result<ColumnMapping, AnalysisError> {
        Ok(self.analyze_sheet(sheet))
    }
}

/// Analyse with the remote classifier when one is configured, falling back to
/// [`HeuristicAnalyzer`] on any error.
pub async fn analyze_with_fallback(
    remote: Option<&dyn ColumnAnalyzer>,
    sheet: &Sheet,
) -> ColumnMapping {
    let Some(remote) = remote else {
        return HeuristicAnalyzer.analyze_sheet(sheet);
    };

    match remote.analyze(sheet).await {
        Ok(mut mapping) => {
            mapping.columns.resize(sheet.width(), None);
            mapping
        }
        Err(err) => {
            tracing::warn!(error = %err, "Remote structure analysis failed, using heuristics");
            let mut mapping = HeuristicAnalyzer.analyze_sheet(sheet);
            mapping.suggestions.insert(
                0,
                "AI column detection was unavailable; columns were mapped by header names"
                    .to_string(),
            );
            mapping
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
