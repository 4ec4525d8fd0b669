//! Orientation and layout detection.
//!
//! Studios send two very different spreadsheets: a standard table with one
//! project per row, and an allocation matrix with project codes down the
//! side and people across the top. Some also send either one sideways.

use serde::{Deserialize, Serialize};

use super::grid::{Cell, Sheet};
use crate::project::is_project_code;

/// Rows inspected when looking for matrix project codes.
pub const MATRIX_SCAN_ROWS: usize = 20;

/// Minimum number of `x.y` code rows before a sheet is treated as a matrix.
pub const MIN_MATRIX_CODE_ROWS: usize = 2;

/// Columns inspected for a project code on each scanned row.
const MATRIX_CODE_COLUMNS: usize = 2;

/// Words that indicate a header cell in a standard project sheet.
const HEADER_KEYWORDS: &[&str] = &[
    "code", "project", "name", "status", "currency", "profit", "office", "manager", "stage",
    "job", "client",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Field names across the first row, one record per row.
    Rows,
    /// Field names down the first column, one record per column.
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Project codes per row, people per column.
    Matrix,
    /// One project record per row.
    #[default]
    Standard,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matrix => "matrix",
            Self::Standard => "standard",
        }
    }
}

fn header_score<'a>(cells: impl Iterator<Item = &'a Cell>) -> usize {
    cells
        .filter_map(|c| c.as_text())
        .filter(|text| {
            let lowered = text.to_lowercase();
            HEADER_KEYWORDS.iter().any(|k| lowered.contains(k))
        })
        .count()
}

/// Guess whether field names run along the first row or down the first
/// column. Ties resolve to [`Orientation::Rows`].
pub fn detect_orientation(sheet: &Sheet) -> Orientation {
    let row_score = header_score(sheet.row(0).iter());
    let col_score = header_score((0..sheet.height()).map(|r| sheet.get(r, 0)));
    if col_score > row_score {
        Orientation::Columns
    } else {
        Orientation::Rows
    }
}

/// Return the sheet as-is, or transposed when the caller asked for it.
pub fn orient(sheet: Sheet, transpose: bool) -> Sheet {
    if transpose {
        sheet.transpose()
    } else {
        sheet
    }
}

/// Index of the first row in the scan window carrying an `x.y` code, with
/// the column it was found in.
pub fn first_code_cell(sheet: &Sheet) -> Option<(usize, usize)> {
    (0..sheet.height().min(MATRIX_SCAN_ROWS)).find_map(|r| {
        (0..MATRIX_CODE_COLUMNS.min(sheet.width())).find_map(|c| {
            sheet
                .get(r, c)
                .as_text()
                .filter(|t| is_project_code(t))
                .map(|_| (r, c))
        })
    })
}

/// Decide between matrix and standard layout by scanning the first
/// [`MATRIX_SCAN_ROWS`] rows for `x.y` project codes.
pub fn detect_layout(sheet: &Sheet) -> Layout {
    let code_rows = (0..sheet.height().min(MATRIX_SCAN_ROWS))
        .filter(|&r| {
            (0..MATRIX_CODE_COLUMNS.min(sheet.width())).any(|c| {
                sheet
                    .get(r, c)
                    .as_text()
                    .is_some_and(|t| is_project_code(&t))
            })
        })
        .count();

    if code_rows >= MIN_MATRIX_CODE_ROWS {
        Layout::Matrix
    } else {
        Layout::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_means_rows_orientation() {
        let sheet = Sheet::from_strings([
            ["Project Code", "Project Name", "Status"],
            ["A-1", "Tower", "Active"],
        ]);
        assert_eq!(detect_orientation(&sheet), Orientation::Rows);
    }

    #[test]
    fn header_column_means_columns_orientation() {
        let sheet = Sheet::from_strings([
            ["Project Code", "A-1", "A-2"],
            ["Project Name", "Tower", "Bridge"],
            ["Status", "Active", "WIP"],
        ]);
        assert_eq!(detect_orientation(&sheet), Orientation::Columns);
        let oriented = orient(sheet, true);
        assert_eq!(detect_orientation(&oriented), Orientation::Rows);
    }

    #[test]
    fn codes_in_first_column_mean_matrix() {
        let sheet = Sheet::from_strings([
            ["", "Alice", "Bob"],
            ["1.1", "0.5", ""],
            ["1.2", "", "20"],
        ]);
        assert_eq!(detect_layout(&sheet), Layout::Matrix);
        assert_eq!(first_code_cell(&sheet), Some((1, 0)));
    }

    #[test]
    fn single_code_row_is_not_enough() {
        let sheet = Sheet::from_strings([["Code", "Name"], ["1.1", "Tower"], ["B", "Bridge"]]);
        assert_eq!(detect_layout(&sheet), Layout::Standard);
    }

    #[test]
    fn codes_beyond_scan_window_are_ignored() {
        let mut rows: Vec<Vec<String>> = (0..MATRIX_SCAN_ROWS)
            .map(|i| vec![format!("row {i}"), String::new()])
            .collect();
        rows.push(vec!["1.1".into(), "x".into()]);
        rows.push(vec!["1.2".into(), "y".into()]);
        let sheet = Sheet::from_strings(rows);
        assert_eq!(detect_layout(&sheet), Layout::Standard);
    }
}
