//! Downloadable CSV templates for the importer.
//!
//! Output is fixed text: the same bytes on every call, so the files can be
//! cached and diffed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const PROJECT_TEMPLATE_HEADER: [&str; 8] = [
    "Project Code",
    "Project Name",
    "Status",
    "Currency",
    "Target Profit %",
    "Office",
    "Project Manager",
    "Stages",
];

const PROJECT_TEMPLATE_SAMPLES: [[&str; 8]; 2] = [
    [
        "PROJ-001",
        "Riverside Library",
        "Active",
        "USD",
        "15",
        "London",
        "Jane Smith",
        "Concept Design; Design Development; Construction Documents",
    ],
    [
        "",
        "Harbour Pavilion",
        "Planning",
        "GBP",
        "20",
        "",
        "",
        "Concept Design",
    ],
];

pub const MATRIX_TEMPLATE_HEADER: [&str; 4] = ["Project Code", "Project Name", "Person A", "Person B"];

/// Matrix samples show the three value conventions: fraction, percent, hours.
const MATRIX_TEMPLATE_SAMPLES: [[&str; 4]; 3] = [
    ["1.1", "Riverside Library", "0.5", "25%"],
    ["1.2", "Harbour Pavilion", "40", ""],
    ["2.1", "Civic Centre", "", "120"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Projects,
    Matrix,
}

impl TemplateKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Projects => "project-import-template.csv",
            Self::Matrix => "allocation-matrix-template.csv",
        }
    }

    /// Render this template.
    pub fn render(&self) -> Result<String, CoreError> {
        match self {
            Self::Projects => project_template_csv(),
            Self::Matrix => matrix_template_csv(),
        }
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "projects" | "project" | "standard" => Ok(Self::Projects),
            "matrix" | "allocations" => Ok(Self::Matrix),
            other => Err(CoreError::Validation(format!("Unknown template '{other}'"))),
        }
    }
}

fn write_csv<const N: usize>(header: &[&str; N], rows: &[[&str; N]]) -> Result<String, CoreError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(header)
        .map_err(|e| CoreError::Internal(format!("Template write failed: {e}")))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| CoreError::Internal(format!("Template write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("Template flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(e.to_string()))
}

/// Standard one-project-per-row template.
pub fn project_template_csv() -> Result<String, CoreError> {
    write_csv(&PROJECT_TEMPLATE_HEADER, &PROJECT_TEMPLATE_SAMPLES)
}

/// People-by-project allocation matrix template.
pub fn matrix_template_csv() -> Result<String, CoreError> {
    write_csv(&MATRIX_TEMPLATE_HEADER, &MATRIX_TEMPLATE_SAMPLES)
}
