//! Capacity and utilization: allocated hours over weekly capacity.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::timeline::week_start_of;
use crate::types::{DbId, WeekStart};

/// Longest range a single utilization report may cover.
pub const MAX_REPORT_WEEKS: usize = 104;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCapacity {
    pub person_id: DbId,
    pub name: String,
    pub weekly_capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedHours {
    pub person_id: DbId,
    pub week_start: WeekStart,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationRow {
    pub person_id: DbId,
    pub name: String,
    pub week_start: WeekStart,
    pub allocated_hours: f64,
    pub capacity: f64,
    /// `None` when the person has no capacity that week.
    pub utilization_pct: Option<f64>,
    pub over_allocated: bool,
}

/// Allocated hours as a percentage of capacity, to one decimal place.
pub fn utilization_pct(allocated: f64, capacity: f64) -> Option<f64> {
    if capacity <= 0.0 || !capacity.is_finite() {
        return None;
    }
    Some((allocated / capacity * 1000.0).round() / 10.0)
}

/// Mondays from the week of `from` through the week of `to`, inclusive,
/// capped at [`MAX_REPORT_WEEKS`].
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> Vec<WeekStart> {
    let mut week = week_start_of(from);
    let last = week_start_of(to);
    let mut weeks = Vec::new();
    while week <= last && weeks.len() < MAX_REPORT_WEEKS {
        weeks.push(week);
        week += Duration::weeks(1);
    }
    weeks
}

/// One row per person per week, summing every allocation in that week.
///
/// Allocation dates are snapped to their Monday, so a row stored mid-week
/// still counts toward the right column. People are reported in the order
/// given.
pub fn weekly_utilization(
    people: &[PersonCapacity],
    allocations: &[AllocatedHours],
    weeks: &[WeekStart],
) -> Vec<UtilizationRow> {
    let mut totals: HashMap<(DbId, WeekStart), f64> = HashMap::new();
    for a in allocations {
        *totals
            .entry((a.person_id, week_start_of(a.week_start)))
            .or_default() += a.hours;
    }

    people
        .iter()
        .flat_map(|person| {
            let totals = &totals;
            weeks.iter().map(move |week| {
                let allocated = totals
                    .get(&(person.person_id, *week))
                    .copied()
                    .unwrap_or(0.0);
                let pct = utilization_pct(allocated, person.weekly_capacity);
                UtilizationRow {
                    person_id: person.person_id,
                    name: person.name.clone(),
                    week_start: *week,
                    allocated_hours: allocated,
                    capacity: person.weekly_capacity,
                    utilization_pct: pct,
                    over_allocated: pct.is_some_and(|p| p > 100.0),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn percentage_rounding_and_zero_capacity() {
        assert_eq!(utilization_pct(30.0, 40.0), Some(75.0));
        assert_eq!(utilization_pct(10.0, 30.0), Some(33.3));
        assert_eq!(utilization_pct(10.0, 0.0), None);
    }

    #[test]
    fn weeks_are_inclusive_mondays() {
        let weeks = weeks_between(date(2025, 3, 12), date(2025, 3, 24));
        assert_eq!(weeks, vec![date(2025, 3, 10), date(2025, 3, 17), date(2025, 3, 24)]);
        assert!(weeks_between(date(2025, 3, 24), date(2025, 3, 1)).is_empty());
        assert_eq!(weeks_between(date(2020, 1, 1), date(2030, 1, 1)).len(), MAX_REPORT_WEEKS);
    }

    #[test]
    fn rows_sum_hours_per_week() {
        let people = vec![
            PersonCapacity { person_id: 1, name: "Alice".into(), weekly_capacity: 40.0 },
            PersonCapacity { person_id: 2, name: "Bob".into(), weekly_capacity: 0.0 },
        ];
        let allocations = vec![
            AllocatedHours { person_id: 1, week_start: date(2025, 3, 10), hours: 30.0 },
            AllocatedHours { person_id: 1, week_start: date(2025, 3, 12), hours: 20.0 },
            AllocatedHours { person_id: 2, week_start: date(2025, 3, 10), hours: 8.0 },
        ];
        let weeks = weeks_between(date(2025, 3, 10), date(2025, 3, 17));
        let rows = weekly_utilization(&people, &allocations, &weeks);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].allocated_hours, 50.0);
        assert_eq!(rows[0].utilization_pct, Some(125.0));
        assert!(rows[0].over_allocated);
        assert_eq!(rows[1].allocated_hours, 0.0);
        assert_eq!(rows[1].utilization_pct, Some(0.0));
        assert_eq!(rows[2].utilization_pct, None);
        assert!(!rows[2].over_allocated);
    }
}
