//! Rectangular cell grid shared by every import path.

use serde::{Deserialize, Serialize};

static EMPTY: Cell = Cell::Empty;

/// A single spreadsheet cell after format-specific decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Build a cell from raw text, mapping blank strings to [`Cell::Empty`].
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form of the cell, or `None` when empty.
    ///
    /// Integral numbers render without a fractional part so that a numeric
    /// `2024` cell reads as `"2024"` rather than `"2024.0"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Self::Bool(b) => Some(b.to_string()),
        }
    }

    /// Numeric value of the cell. Text is parsed after trimming and removing
    /// thousands separators.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// Row-major grid. Every row has the same width; short rows are padded with
/// [`Cell::Empty`] and trailing blank rows are dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Sheet {
    pub fn new(mut rows: Vec<Vec<Cell>>) -> Self {
        while rows
            .last()
            .is_some_and(|row| row.iter().all(Cell::is_empty))
        {
            rows.pop();
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    /// Convenience constructor for text-only grids (CSV input, tests).
    pub fn from_strings<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| Cell::from_text(s.as_ref())).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[Cell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at `(row, col)`, or [`Cell::Empty`] when out of range.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        let rows = (0..self.width)
            .map(|c| (0..self.rows.len()).map(|r| self.get(r, c).clone()).collect())
            .collect();
        Self::new(rows)
    }

    /// The first `limit` rows rendered as strings, used as the payload for
    /// remote structure analysis.
    pub fn preview(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| row.iter().map(|c| c.as_text().unwrap_or_default()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_and_trailing_blanks_dropped() {
        let sheet = Sheet::new(vec![
            vec![Cell::from_text("a"), Cell::from_text("b")],
            vec![Cell::from_text("c")],
            vec![Cell::Empty, Cell::from_text("  ")],
        ]);
        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.width(), 2);
        assert_eq!(sheet.get(1, 1), &Cell::Empty);
    }

    #[test]
    fn transpose_swaps_axes() {
        let sheet = Sheet::from_strings([["Code", "1.1", "1.2"], ["Name", "Alpha", "Beta"]]);
        let t = sheet.transpose();
        assert_eq!(t.height(), 3);
        assert_eq!(t.get(0, 1).as_text().as_deref(), Some("Name"));
        assert_eq!(t.get(2, 0).as_text().as_deref(), Some("1.2"));
    }

    #[test]
    fn numbers_render_as_text() {
        assert_eq!(Cell::Number(2024.0).as_text().as_deref(), Some("2024"));
        assert_eq!(Cell::Number(12.5).as_text().as_deref(), Some("12.5"));
        assert_eq!(Cell::from_text(" 1,200 ").as_number(), Some(1200.0));
    }

    #[test]
    fn out_of_range_reads_empty() {
        let sheet = Sheet::from_strings([["x"]]);
        assert!(sheet.get(5, 5).is_empty());
        assert!(sheet.row(9).is_empty());
    }
}
