//! Per-row validation of standard project sheets.
//!
//! Hard errors (missing name, bad or out-of-range profit, duplicate code)
//! block the row. Everything else degrades to a warning plus a default, with
//! a closest-match suggestion when reference data offers one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::analysis::{ColumnMapping, ProjectField};
use super::matching::{closest_match, contains_ignore_case};
use super::{ImportOptions, ProjectDraft};
use crate::project::{
    is_placeholder, normalize_currency, CodeGenerator, ProjectStatus, DEFAULT_TARGET_PROFIT_PCT,
    MAX_TARGET_PROFIT_PCT, MIN_TARGET_PROFIT_PCT,
};
use crate::spreadsheet::Sheet;

/// Valid values the importer checks row contents against.
///
/// Empty lists disable the corresponding check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub offices: Vec<String>,
    pub managers: Vec<String>,
    pub currencies: Vec<String>,
    pub existing_codes: Vec<String>,
}

/// Outcome of validating one sheet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowValidation {
    /// 1-based row number as the user sees it in their spreadsheet.
    pub row_number: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    /// Present only when the row has no errors.
    pub draft: Option<ProjectDraft>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.draft.is_some()
    }
}

fn text_at(sheet: &Sheet, mapping: &ColumnMapping, row: usize, field: ProjectField) -> Option<String> {
    mapping
        .column_of(field)
        .and_then(|col| sheet.get(row, col).as_text())
        .filter(|v| !is_placeholder(v))
}

fn split_stages(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a target profit cell. Accepts `15` and `15%`; fractions such as
/// `0.15` are taken literally.
fn parse_profit(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Resolve a reference-data column (office / manager): returns the
/// canonical spelling when known; otherwise records a warning and a
/// suggestion and returns `None`.
fn resolve_reference(
    value: Option<String>,
    known: &[String],
    label: &str,
    row_number: usize,
    out: &mut RowValidation,
) -> Option<String> {
    let value = value?;
    if known.is_empty() {
        return Some(value);
    }
    if let Some(canonical) = known
        .iter()
        .find(|k| k.trim().eq_ignore_ascii_case(value.trim()))
    {
        return Some(canonical.clone());
    }

    out.warnings
        .push(format!("Row {row_number}: unknown {label} '{value}' was left unassigned"));
    match closest_match(&value, known) {
        Some(candidate) => out
            .suggestions
            .push(format!("Row {row_number}: did you mean {label} '{candidate}'?")),
        None => out.suggestions.push(format!(
            "Row {row_number}: valid {label} values are {}",
            known.join(", ")
        )),
    }
    None
}

/// Validate every data row below the mapping's header row.
///
/// Fully blank rows are skipped. Codes are synthesized for rows without one,
/// in row order, so generated codes increase down the sheet.
pub fn validate_rows(
    sheet: &Sheet,
    mapping: &ColumnMapping,
    reference: &ReferenceData,
    options: &ImportOptions,
) -> Vec<RowValidation> {
    let mut generator = CodeGenerator::new(&options.code_prefix, reference.existing_codes.clone());

    // Reserve every explicit code first so generated ones never collide with
    // a code that appears further down the sheet.
    if let Some(col) = mapping.column_of(ProjectField::Code) {
        for row in mapping.header_row + 1..sheet.height() {
            if let Some(code) = sheet.get(row, col).as_text().filter(|v| !is_placeholder(v)) {
                generator.reserve(&code);
            }
        }
    }

    let existing: HashSet<String> = reference
        .existing_codes
        .iter()
        .map(|c| c.trim().to_uppercase())
        .collect();
    let mut seen_codes: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for row in mapping.header_row + 1..sheet.height() {
        if sheet.row(row).iter().all(|c| c.is_empty()) {
            continue;
        }
        let row_number = row + 1;
        let mut out = RowValidation {
            row_number,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            draft: None,
        };

        // --- Code ---
        let code = match text_at(sheet, mapping, row, ProjectField::Code) {
            Some(code) => {
                let code = code.trim().to_uppercase();
                if existing.contains(&code) {
                    out.errors
                        .push(format!("Row {row_number}: project code '{code}' already exists"));
                } else if !seen_codes.insert(code.clone()) {
                    out.errors.push(format!(
                        "Row {row_number}: duplicate project code '{code}' in this file"
                    ));
                }
                code
            }
            None => {
                let generated = generator.next_code();
                out.suggestions.push(format!(
                    "Row {row_number}: no project code supplied, generated '{generated}'"
                ));
                seen_codes.insert(generated.clone());
                generated
            }
        };

        // --- Name ---
        let name = text_at(sheet, mapping, row, ProjectField::Name);
        if name.is_none() {
            out.errors
                .push(format!("Row {row_number}: missing required project name"));
        }

        // --- Status ---
        let status = match text_at(sheet, mapping, row, ProjectField::Status) {
            None => ProjectStatus::default(),
            Some(raw) => ProjectStatus::parse_loose(&raw).unwrap_or_else(|| {
                out.warnings.push(format!(
                    "Row {row_number}: unrecognised status '{raw}', using '{}'",
                    ProjectStatus::default()
                ));
                let labels: Vec<String> =
                    ProjectStatus::ALL.iter().map(|s| s.as_str().to_string()).collect();
                if let Some(candidate) = closest_match(&raw, &labels) {
                    out.suggestions
                        .push(format!("Row {row_number}: did you mean status '{candidate}'?"));
                }
                ProjectStatus::default()
            }),
        };

        // --- Currency ---
        let currency = match text_at(sheet, mapping, row, ProjectField::Currency) {
            None => options.default_currency.clone(),
            Some(raw) => match normalize_currency(&raw) {
                Some(code)
                    if reference.currencies.is_empty()
                        || contains_ignore_case(&reference.currencies, &code) =>
                {
                    code
                }
                _ => {
                    out.warnings.push(format!(
                        "Row {row_number}: unknown currency '{raw}', using '{}'",
                        options.default_currency
                    ));
                    if let Some(candidate) = closest_match(&raw, &reference.currencies) {
                        out.suggestions.push(format!(
                            "Row {row_number}: did you mean currency '{candidate}'?"
                        ));
                    }
                    options.default_currency.clone()
                }
            },
        };

        // --- Target profit ---
        let target_profit_pct = match text_at(sheet, mapping, row, ProjectField::TargetProfit) {
            None => DEFAULT_TARGET_PROFIT_PCT,
            Some(raw) => match parse_profit(&raw) {
                Some(pct) if (MIN_TARGET_PROFIT_PCT..=MAX_TARGET_PROFIT_PCT).contains(&pct) => pct,
                Some(pct) => {
                    out.errors.push(format!(
                        "Row {row_number}: target profit {pct}% is outside {MIN_TARGET_PROFIT_PCT}-{MAX_TARGET_PROFIT_PCT}"
                    ));
                    DEFAULT_TARGET_PROFIT_PCT
                }
                None => {
                    out.errors.push(format!(
                        "Row {row_number}: target profit '{raw}' is not a number"
                    ));
                    DEFAULT_TARGET_PROFIT_PCT
                }
            },
        };

        // --- Office / manager ---
        let office = resolve_reference(
            text_at(sheet, mapping, row, ProjectField::Office),
            &reference.offices,
            "office",
            row_number,
            &mut out,
        );
        let manager = resolve_reference(
            text_at(sheet, mapping, row, ProjectField::Manager),
            &reference.managers,
            "manager",
            row_number,
            &mut out,
        );

        let stages = text_at(sheet, mapping, row, ProjectField::Stages)
            .map(|raw| split_stages(&raw))
            .unwrap_or_default();

        if out.errors.is_empty() {
            out.draft = name.map(|name| ProjectDraft {
                code,
                name,
                status,
                currency,
                target_profit_pct,
                office,
                manager,
                stages,
            });
        }
        results.push(out);
    }

    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::analysis::HeuristicAnalyzer;

    fn validate(rows: &[&[&str]], reference: &ReferenceData) -> Vec<RowValidation> {
        let sheet = Sheet::from_strings(rows.iter().map(|r| r.iter().copied()));
        let mapping = HeuristicAnalyzer.analyze_sheet(&sheet);
        validate_rows(&sheet, &mapping, reference, &ImportOptions::default())
    }

    const HEADER: &[&str] = &[
        "Project Code",
        "Project Name",
        "Status",
        "Currency",
        "Target Profit %",
        "Office",
        "Stages",
    ];

    #[test]
    fn complete_row_is_valid() {
        let rows = validate(
            &[HEADER, &["a-1", "Tower", "WIP", "gbp", "20", "London", "Concept; Design"]],
            &ReferenceData::default(),
        );
        assert_eq!(rows.len(), 1);
        let draft = rows[0].draft.as_ref().unwrap();
        assert_eq!(draft.code, "A-1");
        assert_eq!(draft.status, ProjectStatus::Active);
        assert_eq!(draft.currency, "GBP");
        assert_eq!(draft.target_profit_pct, 20.0);
        assert_eq!(draft.office.as_deref(), Some("London"));
        assert_eq!(draft.stages, vec!["Concept", "Design"]);
    }

    #[test]
    fn profit_150_is_rejected() {
        let rows = validate(&[HEADER, &["A-1", "Tower", "", "", "150", "", ""]], &ReferenceData::default());
        assert!(!rows[0].is_valid());
        assert!(rows[0].errors[0].contains("150"));
    }

    #[test]
    fn profit_15_and_blank_are_accepted() {
        let rows = validate(
            &[
                HEADER,
                &["A-1", "Tower", "", "", "15", "", ""],
                &["A-2", "Bridge", "", "", "", "", ""],
            ],
            &ReferenceData::default(),
        );
        assert_eq!(rows[0].draft.as_ref().unwrap().target_profit_pct, 15.0);
        assert_eq!(rows[1].draft.as_ref().unwrap().target_profit_pct, DEFAULT_TARGET_PROFIT_PCT);
    }

    #[test]
    fn non_numeric_profit_is_rejected() {
        let rows = validate(&[HEADER, &["A-1", "Tower", "", "", "lots", "", ""]], &ReferenceData::default());
        assert!(rows[0].errors[0].contains("not a number"));
    }

    #[test]
    fn missing_codes_are_generated_in_order() {
        let rows = validate(
            &[
                HEADER,
                &["", "Tower", "", "", "", "", ""],
                &["PROJ-002", "Bridge", "", "", "", "", ""],
                &["", "Pier", "", "", "", "", ""],
            ],
            &ReferenceData {
                existing_codes: vec!["PROJ-001".into()],
                ..Default::default()
            },
        );
        let codes: Vec<&str> = rows
            .iter()
            .map(|r| r.draft.as_ref().unwrap().code.as_str())
            .collect();
        assert_eq!(codes, vec!["PROJ-003", "PROJ-002", "PROJ-004"]);
        assert!(rows[0].suggestions[0].contains("PROJ-003"));
    }

    #[test]
    fn missing_name_is_an_error() {
        let rows = validate(&[HEADER, &["A-1", "", "Active", "", "", "", ""]], &ReferenceData::default());
        assert!(rows[0].draft.is_none());
        assert!(rows[0].errors[0].contains("missing required project name"));
    }

    #[test]
    fn duplicate_and_existing_codes_are_errors() {
        let rows = validate(
            &[
                HEADER,
                &["A-1", "Tower", "", "", "", "", ""],
                &["a-1", "Tower again", "", "", "", "", ""],
                &["B-9", "Old", "", "", "", "", ""],
            ],
            &ReferenceData {
                existing_codes: vec!["b-9".into()],
                ..Default::default()
            },
        );
        assert!(rows[0].is_valid());
        assert!(rows[1].errors[0].contains("duplicate"));
        assert!(rows[2].errors[0].contains("already exists"));
    }

    #[test]
    fn unknown_office_warns_with_suggestion() {
        let reference = ReferenceData {
            offices: vec!["London".into(), "New York".into()],
            ..Default::default()
        };
        let rows = validate(&[HEADER, &["A-1", "Tower", "", "", "", "Londn", ""]], &reference);
        assert!(rows[0].is_valid());
        assert_eq!(rows[0].draft.as_ref().unwrap().office, None);
        assert!(rows[0].warnings[0].contains("unknown office 'Londn'"));
        assert!(rows[0].suggestions[0].contains("'London'"));
    }

    #[test]
    fn known_office_uses_canonical_spelling() {
        let reference = ReferenceData {
            offices: vec!["New York".into()],
            ..Default::default()
        };
        let rows = validate(&[HEADER, &["A-1", "Tower", "", "", "", "new york", ""]], &reference);
        assert_eq!(rows[0].draft.as_ref().unwrap().office.as_deref(), Some("New York"));
    }

    #[test]
    fn country_placeholder_is_treated_as_blank() {
        let reference = ReferenceData {
            offices: vec!["London".into()],
            ..Default::default()
        };
        let rows = validate(&[HEADER, &["A-1", "Tower", "", "", "", "Select Country", ""]], &reference);
        assert!(rows[0].warnings.is_empty());
        assert_eq!(rows[0].draft.as_ref().unwrap().office, None);
    }

    #[test]
    fn bad_currency_and_status_fall_back_with_warnings() {
        let reference = ReferenceData {
            currencies: vec!["GBP".into(), "USD".into()],
            ..Default::default()
        };
        let rows = validate(&[HEADER, &["A-1", "Tower", "Sideways", "GBX", "", "", ""]], &reference);
        let draft = rows[0].draft.as_ref().unwrap();
        assert_eq!(draft.currency, "USD");
        assert_eq!(draft.status, ProjectStatus::Active);
        assert_eq!(rows[0].warnings.len(), 2);
        assert!(rows[0].suggestions.iter().any(|s| s.contains("'GBP'")));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let rows = validate(
            &[HEADER, &["", "", "", "", "", "", ""], &["A-1", "Tower", "", "", "", "", ""]],
            &ReferenceData::default(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 3);
    }
}
