//! Allocation-matrix parsing: project codes down the side, people across the
//! top, hours (or fractions, or percentages) in the cells.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::is_project_code;
use crate::roster::MAX_WEEKLY_CAPACITY;
use crate::spreadsheet::layout::first_code_cell;
use crate::spreadsheet::{Cell, Sheet};

/// Header words that mark a project-name column next to the code column.
const NAME_HEADER_HINTS: &[&str] = &["name", "project", "description", "title", "job"];

/// Header words for summary columns that are not people.
const NON_PERSON_HEADERS: &[&str] = &["total", "sum", "subtotal", "notes", "comments"];

/// One non-zero matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// 1-based spreadsheet row.
    pub row_number: usize,
    pub project_code: String,
    pub project_name: Option<String>,
    pub person: String,
    /// Raw numeric value as typed.
    pub value: f64,
    /// `true` when the cell carried an explicit `%` sign.
    pub explicit_percent: bool,
}

impl MatrixEntry {
    /// Hours this entry represents for a person with `capacity` weekly hours.
    pub fn hours(&self, capacity: f64) -> f64 {
        interpret_allocation(self.value, self.explicit_percent, capacity)
    }
}

/// Everything pulled out of a matrix sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixParse {
    /// People named in the header row, in column order.
    pub people: Vec<String>,
    /// Distinct project codes with the first name seen for each.
    pub projects: Vec<(String, Option<String>)>,
    pub entries: Vec<MatrixEntry>,
    pub warnings: Vec<String>,
    /// Cells that can never be a valid weekly allocation.
    pub errors: Vec<String>,
}

/// Convert a matrix cell value to hours.
///
/// - explicit `%` → percent of capacity
/// - `0 < v <= 1` → fraction of capacity
/// - `1 < v <= 100` → percent of capacity
/// - `v > 100` → literal hours
///
/// A literal `1` therefore means a full week, not one hour. Results are
/// rounded to two decimals. Callers reject anything above
/// [`MAX_WEEKLY_CAPACITY`].
pub fn interpret_allocation(value: f64, explicit_percent: bool, capacity: f64) -> f64 {
    let hours = if explicit_percent {
        capacity * value / 100.0
    } else if value <= 1.0 {
        capacity * value
    } else if value <= 100.0 {
        capacity * value / 100.0
    } else {
        value
    };
    (hours * 100.0).round() / 100.0
}

/// Numeric value of a cell and whether it carried a `%` sign. NaN and
/// infinities read as non-numeric.
fn parse_value(cell: &Cell) -> Option<(f64, bool)> {
    let parsed = match cell {
        Cell::Number(n) => Some((*n, false)),
        Cell::Text(s) => {
            let trimmed = s.trim();
            match trimmed.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok().map(|v| (v, true)),
                None => cell.as_number().map(|v| (v, false)),
            }
        }
        _ => None,
    };
    parsed.filter(|(v, _)| v.is_finite())
}

fn looks_like_name_header(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NAME_HEADER_HINTS.iter().any(|h| lowered.contains(h))
}

/// Parse a matrix sheet.
///
/// The header row is the closest row above the first code row that has text
/// to the right of the code column. A column directly right of the codes is
/// treated as project names when its header says so, or when its cells on
/// code rows are text rather than numbers.
pub fn parse_matrix(sheet: &Sheet) -> Result<MatrixParse, CoreError> {
    let (first_code_row, code_col) = first_code_cell(sheet).ok_or_else(|| {
        CoreError::Validation("No project codes (e.g. 12.3) found in the first rows".into())
    })?;

    let header_row = (0..first_code_row)
        .rev()
        .find(|&r| {
            (code_col + 1..sheet.width()).any(|c| {
                matches!(sheet.get(r, c), Cell::Text(t) if !t.trim().is_empty())
            })
        })
        .ok_or_else(|| {
            CoreError::Validation(
                "No header row with person names found above the first project code".into(),
            )
        })?;

    let code_rows: Vec<usize> = (first_code_row..sheet.height())
        .filter(|&r| {
            sheet
                .get(r, code_col)
                .as_text()
                .is_some_and(|t| is_project_code(&t))
        })
        .collect();

    let candidate = code_col + 1;
    let name_col = (candidate < sheet.width())
        .then(|| {
            let header_says_name = sheet
                .get(header_row, candidate)
                .as_text()
                .is_some_and(|h| looks_like_name_header(&h));
            let text_cells = code_rows
                .iter()
                .filter(|&&r| {
                    matches!(sheet.get(r, candidate), Cell::Text(_))
                        && parse_value(sheet.get(r, candidate)).is_none()
                })
                .count();
            header_says_name || text_cells * 2 > code_rows.len()
        })
        .unwrap_or(false)
        .then_some(candidate);

    let first_person_col = name_col.map_or(code_col + 1, |c| c + 1);
    let person_cols: Vec<(usize, String)> = (first_person_col..sheet.width())
        .filter_map(|c| {
            let header = sheet.get(header_row, c).as_text()?;
            let lowered = header.to_lowercase();
            if NON_PERSON_HEADERS.iter().any(|h| lowered == *h) {
                return None;
            }
            if header.parse::<f64>().is_ok() {
                return None;
            }
            Some((c, header))
        })
        .collect();

    let mut parsed = MatrixParse {
        people: person_cols.iter().map(|(_, p)| p.clone()).collect(),
        ..Default::default()
    };
    let mut seen_projects: HashSet<String> = HashSet::new();
    let mut seen_cells: HashSet<(String, String)> = HashSet::new();

    for row in header_row + 1..sheet.height() {
        let row_number = row + 1;
        let Some(code) = sheet
            .get(row, code_col)
            .as_text()
            .filter(|t| is_project_code(t))
        else {
            let has_values = person_cols
                .iter()
                .any(|(c, _)| parse_value(sheet.get(row, *c)).is_some_and(|(v, _)| v > 0.0));
            if has_values {
                parsed.warnings.push(format!(
                    "Row {row_number}: values ignored because the row has no project code"
                ));
            }
            continue;
        };

        let project_name = name_col.and_then(|c| sheet.get(row, c).as_text());
        if seen_projects.insert(code.clone()) {
            parsed.projects.push((code.clone(), project_name.clone()));
        }

        for (col, person) in &person_cols {
            let cell = sheet.get(row, *col);
            if cell.is_empty() {
                continue;
            }
            let Some((value, explicit_percent)) = parse_value(cell) else {
                parsed.warnings.push(format!(
                    "Row {row_number}: ignored non-numeric value '{}' for {person}",
                    cell.as_text().unwrap_or_default()
                ));
                continue;
            };
            if value <= 0.0 {
                continue;
            }
            if !explicit_percent && value > MAX_WEEKLY_CAPACITY {
                parsed.errors.push(format!(
                    "Row {row_number}: {value} hours for {person} on {code} exceeds the {MAX_WEEKLY_CAPACITY} hour week"
                ));
                continue;
            }
            if !seen_cells.insert((code.clone(), person.clone())) {
                parsed.warnings.push(format!(
                    "Row {row_number}: {person} appears more than once on project {code}; the last value wins"
                ));
            }
            parsed.entries.push(MatrixEntry {
                row_number,
                project_code: code.clone(),
                project_name: project_name.clone(),
                person: person.clone(),
                value,
                explicit_percent,
            });
        }
    }

    tracing::debug!(
        people = parsed.people.len(),
        projects = parsed.projects.len(),
        entries = parsed.entries.len(),
        "Parsed allocation matrix"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn fraction_percent_and_hours() {
        assert_eq!(interpret_allocation(0.5, false, 40.0), 20.0);
        assert_eq!(interpret_allocation(25.0, false, 40.0), 10.0);
        assert_eq!(interpret_allocation(120.0, false, 40.0), 120.0);
        assert_eq!(interpret_allocation(50.0, true, 30.0), 15.0);
    }

    #[test]
    fn one_is_read_as_a_full_week() {
        assert_eq!(interpret_allocation(1.0, false, 37.5), 37.5);
    }

    #[test]
    fn parses_matrix_with_name_column() {
        let sheet = Sheet::from_strings([
            vec!["Resource plan", "", "", "", ""],
            vec!["Code", "Project Name", "Alice", "Bob", "Total"],
            vec!["1.1", "Tower", "0.5", "", "0.5"],
            vec!["1.2", "Bridge", "25%", "80", "105"],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.people, vec!["Alice", "Bob"]);
        assert_eq!(
            parsed.projects,
            vec![
                ("1.1".to_string(), Some("Tower".to_string())),
                ("1.2".to_string(), Some("Bridge".to_string())),
            ]
        );
        assert_eq!(parsed.entries.len(), 3);
        let bridge_alice = &parsed.entries[1];
        assert_eq!(bridge_alice.person, "Alice");
        assert!(bridge_alice.explicit_percent);
        assert_eq!(bridge_alice.hours(40.0), 10.0);
        assert_eq!(bridge_alice.row_number, 4);
    }

    #[test]
    fn parses_matrix_without_name_column() {
        let sheet = Sheet::from_strings([
            vec!["", "Alice", "Bob"],
            vec!["2.1", "40", "0.25"],
            vec!["2.2", "", "150"],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.people, vec!["Alice", "Bob"]);
        assert_eq!(parsed.projects[0].1, None);
        assert_eq!(parsed.entries.len(), 3);
        assert_eq!(parsed.entries[2].hours(40.0), 150.0);
    }

    #[test]
    fn non_numeric_cells_and_codeless_rows_warn() {
        let sheet = Sheet::from_strings([
            vec!["", "Alice"],
            vec!["1.1", "half"],
            vec!["1.2", "0.2"],
            vec!["Subtotal", "0.7"],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.warnings.len(), 2);
        assert!(parsed.warnings[0].contains("'half'"));
        assert!(parsed.warnings[1].contains("no project code"));
    }

    #[test]
    fn repeated_person_on_project_warns() {
        let sheet = Sheet::from_strings([
            vec!["", "Alice"],
            vec!["1.1", "0.2"],
            vec!["1.1", "0.4"],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.projects.len(), 1);
        assert!(parsed.warnings[0].contains("last value wins"));
    }

    #[test]
    fn non_finite_cells_warn_and_are_skipped() {
        let sheet = Sheet::from_strings([
            vec!["", "Alice", "Bob", "Cara"],
            vec!["1.1", "NaN", "inf", "-inf"],
            vec!["1.2", "0.5", "", ""],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].project_code, "1.2");
        assert_eq!(parsed.warnings.len(), 3);
        assert!(parsed.warnings.iter().all(|w| w.contains("non-numeric")));
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn numeric_nan_cell_is_skipped() {
        let sheet = Sheet::new(vec![
            vec![Cell::Empty, Cell::Text("Alice".into())],
            vec![Cell::Text("1.1".into()), Cell::Number(f64::NAN)],
            vec![Cell::Text("1.2".into()), Cell::Number(f64::INFINITY)],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.warnings.len(), 2);
    }

    #[test]
    fn hours_beyond_a_week_are_row_errors() {
        let sheet = Sheet::from_strings([
            vec!["", "Alice", "Bob"],
            vec!["1.1", "5000", "160"],
            vec!["1.2", "168", "250%"],
        ]);
        let parsed = parse_matrix(&sheet).unwrap();
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("Row 2:"));
        assert!(parsed.errors[0].contains("5000 hours for Alice on 1.1"));
        let values: Vec<f64> = parsed.entries.iter().map(|e| e.value).collect();
        // Percentages depend on capacity and are checked once it is known.
        assert_eq!(values, vec![160.0, 168.0, 250.0]);
    }

    #[test]
    fn missing_codes_is_a_validation_error() {
        let sheet = Sheet::from_strings([["Name", "Alice"], ["Tower", "0.5"]]);
        assert_matches!(parse_matrix(&sheet), Err(CoreError::Validation(_)));
    }

    #[test]
    fn missing_header_is_a_validation_error() {
        let sheet = Sheet::from_strings([["1.1", "0.5"], ["1.2", "0.5"]]);
        assert_matches!(parse_matrix(&sheet), Err(CoreError::Validation(_)));
    }
}
