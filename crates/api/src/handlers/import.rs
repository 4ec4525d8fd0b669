//! Handlers for spreadsheet imports and template downloads.
//!
//! Preview and commit take the same multipart upload and run the same
//! decode, orient, detect and validate steps; commit then persists row by
//! row and returns the accumulated [`ImportResult`].

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use studioplan_core::import::matching::closest_match;
use studioplan_core::import::{
    analyze_with_fallback, parse_matrix, run_matrix_import, run_project_import, validate_rows,
    ColumnMapping, ImportOptions, ImportProgress, ImportResult, MatrixParse, RowValidation,
};
use studioplan_core::roster::MAX_WEEKLY_CAPACITY;
use studioplan_core::spreadsheet::{
    detect_layout, detect_orientation, orient, read_workbook, Layout, Orientation, Sheet,
};
use studioplan_core::template::TemplateKind;
use studioplan_core::timeline::week_start_of;

use crate::error::{AppError, AppResult};
use crate::import_sink::DbImportSink;
use crate::response::DataResponse;
use crate::state::AppState;

/// Rows echoed back in a preview.
const PREVIEW_ROWS: usize = 20;

/// Parsed multipart form shared by preview and commit.
///
/// | Field        | Meaning                                                  |
/// |--------------|----------------------------------------------------------|
/// | `file`       | the `.xlsx` / `.xls` / `.csv` upload (required)          |
/// | `transpose`  | `true`/`false`; omitted means detect from the headers    |
/// | `use_ai`     | ask the remote classifier to map columns (default false) |
/// | `week_start` | `YYYY-MM-DD`, week for matrix allocations (default now)  |
#[derive(Debug)]
pub struct ImportUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub transpose: Option<bool>,
    pub use_ai: bool,
    pub week_start: Option<NaiveDate>,
}

/// What the importer would do with an upload.
#[derive(Debug, Serialize)]
pub struct ImportPreview {
    pub file_name: String,
    pub layout: Layout,
    pub transposed: bool,
    /// First rows of the (oriented) sheet as text.
    pub preview: Vec<Vec<String>>,
    /// Column mapping for standard sheets.
    pub mapping: Option<ColumnMapping>,
    /// Per-row validation for standard sheets.
    pub rows: Vec<RowValidation>,
    /// Parsed allocations for matrix sheets.
    pub matrix: Option<MatrixParse>,
    /// Everything above rolled up; nothing has been written.
    pub summary: ImportResult,
}

/// Decoded and classified upload.
enum Prepared {
    Standard {
        mapping: ColumnMapping,
        rows: Vec<RowValidation>,
    },
    Matrix(MatrixParse),
}

fn parse_flag(name: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Field '{name}' must be true or false, got '{other}'"
        ))),
    }
}

async fn read_upload(mut multipart: Multipart) -> AppResult<ImportUpload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut transpose = None;
    let mut use_ai = false;
    let mut week_start = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let data = field.bytes().await?;
                file = Some((file_name, data.to_vec()));
            }
            "transpose" | "use_ai" | "week_start" => {
                let text = field.text().await?;
                match name.as_str() {
                    "transpose" => transpose = Some(parse_flag(&name, &text)?),
                    "use_ai" => use_ai = parse_flag(&name, &text)?,
                    _ => {
                        let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(
                            |_| AppError::BadRequest(format!("Invalid week_start '{text}'")),
                        )?;
                        week_start = Some(date);
                    }
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing 'file' upload field".to_string()))?;
    Ok(ImportUpload {
        file_name,
        bytes,
        transpose,
        use_ai,
        week_start,
    })
}

/// Decode and orient the upload. Returns the sheet and whether it was
/// transposed.
fn load_sheet(upload: &ImportUpload) -> AppResult<(Sheet, bool)> {
    let sheet = read_workbook(&upload.file_name, &upload.bytes)?;
    let transpose = upload
        .transpose
        .unwrap_or_else(|| detect_orientation(&sheet) == Orientation::Columns);
    Ok((orient(sheet, transpose), transpose))
}

async fn prepare(
    state: &AppState,
    sink: &DbImportSink,
    upload: &ImportUpload,
    sheet: &Sheet,
) -> AppResult<Prepared> {
    match detect_layout(sheet) {
        Layout::Matrix => Ok(Prepared::Matrix(parse_matrix(sheet)?)),
        Layout::Standard => {
            let remote = if upload.use_ai { state.analyzer() } else { None };
            if upload.use_ai && remote.is_none() {
                tracing::debug!("use_ai requested but no remote functions are configured");
            }
            let mapping = analyze_with_fallback(remote, sheet).await;
            let reference = sink.reference_data().await?;
            let rows = validate_rows(sheet, &mapping, &reference, &state.config.import);
            Ok(Prepared::Standard { mapping, rows })
        }
    }
}

fn summarize_rows(mapping: &ColumnMapping, rows: &[RowValidation]) -> ImportResult {
    let mut summary = ImportResult::new();
    for s in &mapping.suggestions {
        summary.suggestion(s.clone());
    }
    for row in rows {
        summary.errors.extend(row.errors.iter().cloned());
        summary.warnings.extend(row.warnings.iter().cloned());
        for s in &row.suggestions {
            summary.suggestion(s.clone());
        }
        if row.is_valid() {
            summary.success_count += 1;
        }
    }
    summary.finish()
}

fn summarize_matrix(
    parsed: &MatrixParse,
    sink: &DbImportSink,
    options: &ImportOptions,
) -> ImportResult {
    let mut summary = ImportResult::new();
    summary.warnings.extend(parsed.warnings.iter().cloned());
    for err in &parsed.errors {
        summary.error(err.clone());
    }

    let people = sink.people();
    let known: Vec<String> = people.iter().map(|p| p.name.clone()).collect();
    for person in &parsed.people {
        let exists = known
            .iter()
            .any(|k| k.trim().eq_ignore_ascii_case(person.trim()));
        if exists {
            continue;
        }
        summary.error(format!("Person '{person}' was not found"));
        if let Some(candidate) = closest_match(person, &known) {
            summary.suggestion(format!("Did you mean '{candidate}' instead of '{person}'?"));
        }
    }

    for entry in &parsed.entries {
        let Some(person) = people
            .iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(entry.person.trim()))
        else {
            continue;
        };
        let capacity = person
            .weekly_capacity
            .filter(|c| *c > 0.0)
            .unwrap_or(options.default_weekly_capacity);
        let hours = entry.hours(capacity);
        if hours > MAX_WEEKLY_CAPACITY {
            summary.error(format!(
                "Row {}: {hours} hours for {} on {} exceeds the {MAX_WEEKLY_CAPACITY} hour week",
                entry.row_number, entry.person, entry.project_code
            ));
        } else {
            summary.success_count += 1;
        }
    }
    summary.finish()
}

fn log_progress(progress: ImportProgress) {
    tracing::debug!(
        processed = progress.processed,
        total = progress.total,
        percent = progress.percent(),
        "Import progress"
    );
}

/// POST /api/v1/imports/preview
///
/// Decode, classify and validate an upload without writing anything.
pub async fn preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<ImportPreview>>> {
    let upload = read_upload(multipart).await?;
    let (sheet, transposed) = load_sheet(&upload)?;
    let sink = DbImportSink::load(&state.pool).await?;

    let mut preview = ImportPreview {
        file_name: upload.file_name.clone(),
        layout: Layout::Standard,
        transposed,
        preview: sheet.preview(PREVIEW_ROWS),
        mapping: None,
        rows: Vec::new(),
        matrix: None,
        summary: ImportResult::new(),
    };

    match prepare(&state, &sink, &upload, &sheet).await? {
        Prepared::Standard { mapping, rows } => {
            preview.summary = summarize_rows(&mapping, &rows);
            preview.mapping = Some(mapping);
            preview.rows = rows;
        }
        Prepared::Matrix(parsed) => {
            preview.layout = Layout::Matrix;
            preview.summary = summarize_matrix(&parsed, &sink, &state.config.import);
            preview.matrix = Some(parsed);
        }
    }

    tracing::info!(
        file_name = %preview.file_name,
        layout = preview.layout.as_str(),
        errors = preview.summary.errors.len(),
        warnings = preview.summary.warnings.len(),
        "Import previewed"
    );
    Ok(Json(DataResponse { data: preview }))
}

/// POST /api/v1/imports/commit
///
/// Re-run the preview pipeline on the upload and persist every valid row.
/// Rows are written one at a time; failures are reported and skipped, and
/// earlier rows stay written.
pub async fn commit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<ImportResult>>> {
    let upload = read_upload(multipart).await?;
    let (sheet, _) = load_sheet(&upload)?;
    let sink = DbImportSink::load(&state.pool).await?;

    let result = match prepare(&state, &sink, &upload, &sheet).await? {
        Prepared::Standard { mapping, rows } => {
            let mut result = run_project_import(&rows, &sink, log_progress).await;
            for s in mapping.suggestions {
                result.suggestion(s);
            }
            result
        }
        Prepared::Matrix(parsed) => {
            let week = week_start_of(
                upload
                    .week_start
                    .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            );
            run_matrix_import(
                &parsed,
                &sink.people(),
                week,
                &state.config.import,
                &sink,
                log_progress,
            )
            .await
        }
    };

    tracing::info!(
        file_name = %upload.file_name,
        success = result.success,
        success_count = result.success_count,
        errors = result.errors.len(),
        "Import committed"
    );
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/imports/templates/{kind}
///
/// Download a CSV template (`projects` or `matrix`).
pub async fn template(Path(kind): Path<String>) -> AppResult<impl IntoResponse> {
    let kind: TemplateKind = kind.parse()?;
    let csv = kind.render()?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        csv,
    ))
}
