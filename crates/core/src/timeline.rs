//! Week-grid placement of project stages.
//!
//! A project's stages occupy half-open week ranges `[start, start + weeks)`
//! on a Monday-based week axis and must never overlap. This module converts
//! between dates, week indices and pixel drags, rejects overlapping moves,
//! and finds the nearest free slot when a stage is dropped onto an occupied
//! position (including stages dragged in from the unscheduled tray).

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{DbId, WeekStart};

/// Shortest contracted duration a stage may have.
pub const MIN_STAGE_WEEKS: i64 = 1;

/// Longest contracted duration accepted for a stage (ten years).
pub const MAX_STAGE_WEEKS: i64 = 520;

/// Furthest a single drag or placement may move a stage, in weeks either way.
pub const MAX_OFFSET_WEEKS: i64 = 5200;

// ---------------------------------------------------------------------------
// Week arithmetic
// ---------------------------------------------------------------------------

/// Monday of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> WeekStart {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whole weeks from `origin`'s week to `date`'s week (negative when earlier).
pub fn week_index(origin: NaiveDate, date: NaiveDate) -> i64 {
    (week_start_of(date) - week_start_of(origin)).num_days() / 7
}

/// Monday `index` weeks after `origin`'s week.
///
/// Offsets beyond [`MAX_OFFSET_WEEKS`], or that leave the calendar, are
/// rejected.
pub fn week_date(origin: NaiveDate, index: i64) -> Result<WeekStart, TimelineError> {
    check_offset(index)?;
    Duration::try_weeks(index)
        .and_then(|delta| week_start_of(origin).checked_add_signed(delta))
        .ok_or(TimelineError::OffsetOutOfRange(index))
}

fn check_offset(weeks: i64) -> Result<(), TimelineError> {
    if (-MAX_OFFSET_WEEKS..=MAX_OFFSET_WEEKS).contains(&weeks) {
        Ok(())
    } else {
        Err(TimelineError::OffsetOutOfRange(weeks))
    }
}

/// Convert a horizontal drag in pixels to a whole-week offset.
pub fn drag_offset(pixel_delta: f64, week_width_px: f64) -> Result<i64, TimelineError> {
    if !(week_width_px.is_finite() && week_width_px > 0.0) || !pixel_delta.is_finite() {
        return Err(TimelineError::InvalidWeekWidth(week_width_px));
    }
    let weeks = (pixel_delta / week_width_px).round();
    if weeks.abs() > MAX_OFFSET_WEEKS as f64 {
        // Saturating cast; only used for the error message.
        return Err(TimelineError::OffsetOutOfRange(weeks as i64));
    }
    Ok(weeks as i64)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Half-open week range `[start, start + weeks)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSpan {
    pub start: i64,
    pub weeks: i64,
}

impl WeekSpan {
    pub fn new(start: i64, weeks: i64) -> Self {
        Self {
            start,
            weeks: weeks.max(MIN_STAGE_WEEKS),
        }
    }

    /// First week after the span.
    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.weeks)
    }

    pub fn overlaps(&self, other: &WeekSpan) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// The slice of a project stage the timeline cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePlacement {
    pub stage_id: DbId,
    pub project_id: DbId,
    pub name: String,
    /// `None` while the stage sits in the unscheduled tray.
    pub start_date: Option<NaiveDate>,
    pub duration_weeks: i32,
    /// Non-applicable stages are never drawn and never block others.
    pub applicable: bool,
}

impl StagePlacement {
    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some()
    }

    /// Week span relative to `origin`, if scheduled.
    pub fn span(&self, origin: NaiveDate) -> Option<WeekSpan> {
        self.start_date
            .map(|d| WeekSpan::new(week_index(origin, d), i64::from(self.duration_weeks)))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimelineError {
    #[error("Stage {stage_id} would overlap stage {other_id}")]
    Overlap { stage_id: DbId, other_id: DbId },

    #[error("Stage {0} has no start date")]
    Unscheduled(DbId),

    #[error("Stage {0} is not part of this timeline")]
    UnknownStage(DbId),

    #[error("Stage duration must be between {MIN_STAGE_WEEKS} and {MAX_STAGE_WEEKS} weeks, got {0}")]
    InvalidDuration(i64),

    #[error("Week width must be a positive number of pixels, got {0}")]
    InvalidWeekWidth(f64),

    #[error("Offset of {0} weeks is outside the supported range of {MAX_OFFSET_WEEKS} weeks")]
    OffsetOutOfRange(i64),
}

// ---------------------------------------------------------------------------
// Overlap resolution
// ---------------------------------------------------------------------------

/// Occupied spans of applicable, scheduled siblings, sorted by start.
///
/// `exclude` removes the stage being moved so it never blocks itself.
pub fn occupied_spans(
    stages: &[StagePlacement],
    origin: NaiveDate,
    exclude: Option<DbId>,
) -> Vec<(DbId, WeekSpan)> {
    let mut spans: Vec<(DbId, WeekSpan)> = stages
        .iter()
        .filter(|s| s.applicable && Some(s.stage_id) != exclude)
        .filter_map(|s| s.span(origin).map(|span| (s.stage_id, span)))
        .collect();
    spans.sort_by_key(|(_, span)| span.start);
    spans
}

/// First occupied span that `span` collides with.
pub fn first_collision(span: &WeekSpan, occupied: &[(DbId, WeekSpan)]) -> Option<DbId> {
    occupied
        .iter()
        .find(|(_, other)| span.overlaps(other))
        .map(|(id, _)| *id)
}

pub fn is_free(span: &WeekSpan, occupied: &[(DbId, WeekSpan)]) -> bool {
    first_collision(span, occupied).is_none()
}

/// Start week closest to `target` where a `weeks`-long span fits.
///
/// Returns `target` itself when free. Otherwise the candidates are the slot
/// ending right before the first occupied span, the position inside each gap
/// that is closest to `target`, and the slot right after the last span. Ties
/// go to the earlier start.
pub fn nearest_free_start(target: i64, weeks: i64, occupied: &[(DbId, WeekSpan)]) -> i64 {
    let weeks = weeks.max(MIN_STAGE_WEEKS);
    if is_free(&WeekSpan::new(target, weeks), occupied) {
        return target;
    }

    let mut sorted: Vec<WeekSpan> = occupied.iter().map(|(_, s)| *s).collect();
    sorted.sort_by_key(|s| s.start);

    let mut candidates = Vec::with_capacity(sorted.len() + 1);
    if let Some(first) = sorted.first() {
        candidates.push(target.min(first.start - weeks));
    }

    let mut cursor = i64::MIN;
    for span in &sorted {
        if cursor != i64::MIN && span.start - cursor >= weeks {
            candidates.push(target.clamp(cursor, span.start - weeks));
        }
        cursor = cursor.max(span.end());
    }
    candidates.push(target.max(cursor));

    candidates
        .into_iter()
        .min_by_key(|c| ((c - target).abs(), *c))
        .unwrap_or(target)
}

fn find<'a>(stages: &'a [StagePlacement], stage_id: DbId) -> Result<&'a StagePlacement, TimelineError> {
    stages
        .iter()
        .find(|s| s.stage_id == stage_id)
        .ok_or(TimelineError::UnknownStage(stage_id))
}

fn check_duration(weeks: i64) -> Result<(), TimelineError> {
    if (MIN_STAGE_WEEKS..=MAX_STAGE_WEEKS).contains(&weeks) {
        Ok(())
    } else {
        Err(TimelineError::InvalidDuration(weeks))
    }
}

/// Move a scheduled stage by `offset` weeks.
///
/// `siblings` are the project's stages (the moved stage may be among them).
/// Moves that would overlap another stage are rejected rather than adjusted.
pub fn try_drag(
    stage_id: DbId,
    offset: i64,
    siblings: &[StagePlacement],
) -> Result<WeekStart, TimelineError> {
    check_offset(offset)?;
    let stage = find(siblings, stage_id)?;
    let current = stage.start_date.ok_or(TimelineError::Unscheduled(stage_id))?;
    let origin = week_start_of(current);
    let span = WeekSpan::new(offset, i64::from(stage.duration_weeks));
    let occupied = occupied_spans(siblings, origin, Some(stage_id));

    match first_collision(&span, &occupied) {
        Some(other_id) => Err(TimelineError::Overlap { stage_id, other_id }),
        None => week_date(origin, offset),
    }
}

/// Drop a stage at `target` (scheduled or coming from the tray), sliding it
/// to the nearest free week when the target is taken.
pub fn place_stage(
    stage_id: DbId,
    target: NaiveDate,
    siblings: &[StagePlacement],
) -> Result<WeekStart, TimelineError> {
    let stage = find(siblings, stage_id)?;
    let weeks = i64::from(stage.duration_weeks);
    check_duration(weeks)?;

    let origin = week_start_of(target);
    let occupied = occupied_spans(siblings, origin, Some(stage_id));
    let start = nearest_free_start(0, weeks, &occupied);
    week_date(origin, start)
}

/// Split stages into (scheduled, unscheduled tray), ignoring non-applicable
/// ones.
pub fn partition_stages(
    stages: &[StagePlacement],
) -> (Vec<&StagePlacement>, Vec<&StagePlacement>) {
    stages
        .iter()
        .filter(|s| s.applicable)
        .partition(|s| s.is_scheduled())
}

/// Drag an unscheduled stage from the tray onto the timeline.
pub fn schedule_from_tray(
    stage_id: DbId,
    target: NaiveDate,
    siblings: &[StagePlacement],
) -> Result<WeekStart, TimelineError> {
    let stage = find(siblings, stage_id)?;
    if stage.is_scheduled() {
        tracing::debug!(stage_id, "Stage already scheduled, treating tray drop as a move");
    }
    place_stage(stage_id, target, siblings)
}

// ---------------------------------------------------------------------------
// Optimistic edits
// ---------------------------------------------------------------------------

/// Undo token for an edit applied to a [`StageBoard`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    previous: StagePlacement,
}

impl PendingEdit {
    pub fn stage_id(&self) -> DbId {
        self.previous.stage_id
    }
}

/// Local copy of one project's stages that accepts edits immediately and can
/// roll them back if persisting fails.
#[derive(Debug, Clone, Default)]
pub struct StageBoard {
    stages: Vec<StagePlacement>,
}

impl StageBoard {
    pub fn new(stages: Vec<StagePlacement>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[StagePlacement] {
        &self.stages
    }

    pub fn get(&self, stage_id: DbId) -> Option<&StagePlacement> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    /// Apply a start-date/duration edit, refusing edits that would overlap
    /// another applicable stage.
    pub fn apply_edit(
        &mut self,
        stage_id: DbId,
        start_date: Option<NaiveDate>,
        duration_weeks: i32,
    ) -> Result<PendingEdit, TimelineError> {
        check_duration(i64::from(duration_weeks))?;
        let index = self
            .stages
            .iter()
            .position(|s| s.stage_id == stage_id)
            .ok_or(TimelineError::UnknownStage(stage_id))?;

        let start_date = start_date.map(week_start_of);
        if let (Some(start), true) = (start_date, self.stages[index].applicable) {
            let span = WeekSpan::new(0, i64::from(duration_weeks));
            let occupied = occupied_spans(&self.stages, start, Some(stage_id));
            if let Some(other_id) = first_collision(&span, &occupied) {
                return Err(TimelineError::Overlap { stage_id, other_id });
            }
        }

        let previous = self.stages[index].clone();
        self.stages[index].start_date = start_date;
        self.stages[index].duration_weeks = duration_weeks;
        Ok(PendingEdit { previous })
    }

    /// Restore the stage to its state before `edit`.
    pub fn rollback(&mut self, edit: PendingEdit) {
        if let Some(slot) = self
            .stages
            .iter_mut()
            .find(|s| s.stage_id == edit.previous.stage_id)
        {
            *slot = edit.previous;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
