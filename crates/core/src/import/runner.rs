//! Row-at-a-time persistence of validated import data.
//!
//! Rows are written one by one through an [`ImportSink`]. A failing row is
//! recorded and skipped; nothing already written is rolled back and nothing
//! is retried.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::matching::closest_match;
use super::matrix::MatrixParse;
use super::result::{ImportProgress, ImportResult};
use super::validation::RowValidation;
use super::{AllocationDraft, ImportOptions, ProjectDraft, RESOURCE_TYPE_ACTIVE};
use crate::error::CoreError;
use crate::project::{ProjectStatus, DEFAULT_TARGET_PROFIT_PCT};
use crate::roster::MAX_WEEKLY_CAPACITY;
use crate::timeline::week_start_of;
use crate::types::{DbId, WeekStart};

/// Persistence seam for the importer.
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// Create a project and return its id.
    async fn create_project(&self, draft: &ProjectDraft) -> Result<DbId, CoreError>;

    async fn find_project_by_code(&self, code: &str) -> Result<Option<DbId>, CoreError>;

    /// Insert or overwrite the allocation for (project, person, week).
    async fn upsert_allocation(&self, draft: &AllocationDraft) -> Result<(), CoreError>;
}

/// Minimal person record the matrix importer resolves header names against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: DbId,
    pub name: String,
    pub weekly_capacity: Option<f64>,
}

/// Persist validated project rows.
///
/// Rows with validation errors are reported and skipped; their warnings and
/// suggestions are carried into the result either way.
pub async fn run_project_import(
    rows: &[RowValidation],
    sink: &dyn ImportSink,
    mut progress: impl FnMut(ImportProgress) + Send,
) -> ImportResult {
    let mut result = ImportResult::new();
    let total = rows.len();

    for (index, row) in rows.iter().enumerate() {
        result.warnings.extend(row.warnings.iter().cloned());
        for s in &row.suggestions {
            result.suggestion(s.clone());
        }

        match (&row.draft, row.errors.is_empty()) {
            (Some(draft), true) => match sink.create_project(draft).await {
                Ok(id) => {
                    tracing::debug!(row = row.row_number, project_id = id, code = %draft.code, "Imported project row");
                    result.success_count += 1;
                }
                Err(err) => {
                    tracing::warn!(row = row.row_number, error = %err, "Project row failed to persist");
                    result.error(format!(
                        "Row {}: failed to create project '{}': {err}",
                        row.row_number, draft.code
                    ));
                }
            },
            _ => {
                for e in &row.errors {
                    result.error(e.clone());
                }
            }
        }

        progress(ImportProgress {
            processed: index + 1,
            total,
        });
    }

    result.finish()
}

fn default_project_draft(code: &str, name: Option<&str>, options: &ImportOptions) -> ProjectDraft {
    ProjectDraft {
        code: code.to_string(),
        name: name.unwrap_or(code).to_string(),
        status: ProjectStatus::default(),
        currency: options.default_currency.clone(),
        target_profit_pct: DEFAULT_TARGET_PROFIT_PCT,
        office: None,
        manager: None,
        stages: Vec::new(),
    }
}

/// Persist a parsed allocation matrix for the week containing `week`.
///
/// Unknown project codes are created with default attributes. Header names
/// that match no person are reported once each, with a closest-match
/// suggestion, and their cells are skipped.
pub async fn run_matrix_import(
    parsed: &MatrixParse,
    people: &[PersonRef],
    week: WeekStart,
    options: &ImportOptions,
    sink: &dyn ImportSink,
    mut progress: impl FnMut(ImportProgress) + Send,
) -> ImportResult {
    let mut result = ImportResult::new();
    result.warnings.extend(parsed.warnings.iter().cloned());
    for err in &parsed.errors {
        result.error(err.clone());
    }
    let week_start = week_start_of(week);

    // --- Resolve projects ---
    let mut project_ids: HashMap<&str, DbId> = HashMap::new();
    for (code, name) in &parsed.projects {
        let resolved = match sink.find_project_by_code(code).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => {
                let draft = default_project_draft(code, name.as_deref(), options);
                let created = sink.create_project(&draft).await;
                if created.is_ok() {
                    result.suggestion(format!(
                        "Project {code} did not exist and was created with default settings"
                    ));
                }
                created
            }
            Err(err) => Err(err),
        };
        match resolved {
            Ok(id) => {
                project_ids.insert(code.as_str(), id);
            }
            Err(err) => result.error(format!("Project {code}: could not be resolved: {err}")),
        }
    }

    // --- Resolve people ---
    let by_name: HashMap<String, &PersonRef> = people
        .iter()
        .map(|p| (p.name.trim().to_lowercase(), p))
        .collect();
    let known_names: Vec<String> = people.iter().map(|p| p.name.clone()).collect();
    let mut missing_people: BTreeMap<&str, usize> = BTreeMap::new();

    // --- Allocations ---
    let total = parsed.entries.len();
    for (index, entry) in parsed.entries.iter().enumerate() {
        let person = by_name.get(&entry.person.trim().to_lowercase());
        match (project_ids.get(entry.project_code.as_str()), person) {
            (Some(&project_id), Some(person)) => {
                let capacity = person
                    .weekly_capacity
                    .filter(|c| *c > 0.0)
                    .unwrap_or(options.default_weekly_capacity);
                let hours = entry.hours(capacity);
                if !(0.0..=MAX_WEEKLY_CAPACITY).contains(&hours) {
                    result.error(format!(
                        "Row {}: {hours} hours for {} on {} exceeds the {MAX_WEEKLY_CAPACITY} hour week",
                        entry.row_number, entry.person, entry.project_code
                    ));
                } else {
                    let draft = AllocationDraft {
                        project_id,
                        person_id: person.id,
                        week_start,
                        hours,
                        resource_type: RESOURCE_TYPE_ACTIVE.to_string(),
                    };
                    match sink.upsert_allocation(&draft).await {
                        Ok(()) => result.success_count += 1,
                        Err(err) => result.error(format!(
                            "Row {}: failed to save {} on {}: {err}",
                            entry.row_number, entry.person, entry.project_code
                        )),
                    }
                }
            }
            (_, None) => {
                *missing_people.entry(entry.person.as_str()).or_default() += 1;
            }
            // Project resolution failure was already reported above.
            (None, Some(_)) => {}
        }

        progress(ImportProgress {
            processed: index + 1,
            total,
        });
    }

    for (name, skipped) in missing_people {
        result.error(format!(
            "Person '{name}' was not found; {skipped} allocation(s) skipped"
        ));
        if let Some(candidate) = closest_match(name, &known_names) {
            result.suggestion(format!("Did you mean '{candidate}' instead of '{name}'?"));
        }
    }

    result.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
