//! Decoding uploaded bytes into a [`Sheet`].
//!
//! `.csv` goes through the `csv` crate; `.xlsx` and `.xls` go through
//! `calamine`, reading only the first worksheet.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::grid::{Cell, Sheet};

/// File extensions accepted by the importer.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Unsupported file type '{0}'; expected .xlsx, .xls or .csv")]
    UnsupportedFormat(String),

    #[error("The uploaded file contains no data")]
    Empty,

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook parse error: {0}")]
    Workbook(String),
}

/// Lower-cased extension of `file_name`, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.trim().to_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// Decode an uploaded file into a grid.
pub fn read_workbook(file_name: &str, bytes: &[u8]) -> Result<Sheet, SpreadsheetError> {
    let ext = file_extension(file_name).unwrap_or_default();
    let sheet = match ext.as_str() {
        "csv" => read_csv(bytes)?,
        "xlsx" | "xls" => read_excel(bytes)?,
        _ => return Err(SpreadsheetError::UnsupportedFormat(file_name.to_string())),
    };
    if sheet.is_empty() {
        return Err(SpreadsheetError::Empty);
    }
    tracing::debug!(
        file_name,
        rows = sheet.height(),
        cols = sheet.width(),
        "Decoded spreadsheet"
    );
    Ok(sheet)
}

fn read_csv(bytes: &[u8]) -> Result<Sheet, SpreadsheetError> {
    // Excel-exported CSVs often start with a UTF-8 BOM.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(Sheet::new(rows))
}

fn read_excel(bytes: &[u8]) -> Result<Sheet, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| SpreadsheetError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::Empty)?
        .map_err(|e| SpreadsheetError::Workbook(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(Sheet::new(rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::from_text(&other.to_string()),
    }
}
