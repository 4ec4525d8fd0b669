//! Team roster entries extracted from an uploaded image of a team sheet.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::project::{is_placeholder, DEFAULT_WEEKLY_CAPACITY};

/// Upper bound on weekly capacity: every hour of the week.
pub const MAX_WEEKLY_CAPACITY: f64 = 168.0;

/// One person as returned by roster extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub weekly_capacity: Option<f64>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !is_placeholder(v))
}

/// Tidy an extracted roster before it is shown or saved.
///
/// Names are trimmed and collapsed to single spaces; entries without a name
/// are dropped, as are later duplicates (case-insensitive). Capacity
/// defaults to 40 and is clamped to `0..=168`.
pub fn normalize_roster(members: Vec<RosterMember>) -> Vec<RosterMember> {
    let mut seen = HashSet::new();
    members
        .into_iter()
        .filter_map(|m| {
            let name = m.name.split_whitespace().collect::<Vec<_>>().join(" ");
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                return None;
            }
            let capacity = m
                .weekly_capacity
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_WEEKLY_CAPACITY)
                .clamp(0.0, MAX_WEEKLY_CAPACITY);
            Some(RosterMember {
                name,
                role: clean(m.role),
                office: clean(m.office),
                weekly_capacity: Some(capacity),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, capacity: Option<f64>) -> RosterMember {
        RosterMember {
            name: name.to_string(),
            role: None,
            office: None,
            weekly_capacity: capacity,
        }
    }

    #[test]
    fn drops_blanks_and_duplicates() {
        let roster = normalize_roster(vec![
            member("  Ada   Lovelace ", None),
            member("   ", Some(20.0)),
            member("ada lovelace", Some(10.0)),
            member("Grace Hopper", Some(32.0)),
        ]);
        let names: Vec<_> = roster.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(roster[0].weekly_capacity, Some(40.0));
        assert_eq!(roster[1].weekly_capacity, Some(32.0));
    }

    #[test]
    fn capacity_is_clamped() {
        let roster = normalize_roster(vec![
            member("A", Some(-5.0)),
            member("B", Some(500.0)),
            member("C", Some(f64::NAN)),
        ]);
        let capacities: Vec<_> = roster.iter().map(|m| m.weekly_capacity).collect();
        assert_eq!(capacities, vec![Some(0.0), Some(168.0), Some(40.0)]);
    }

    #[test]
    fn placeholder_office_is_cleared() {
        let mut raw = member("Lin", None);
        raw.office = Some(" N/A ".into());
        raw.role = Some(" Architect ".into());
        let roster = normalize_roster(vec![raw]);
        assert_eq!(roster[0].office, None);
        assert_eq!(roster[0].role.as_deref(), Some("Architect"));
    }

    #[test]
    fn deserializes_with_missing_optionals() {
        let member: RosterMember = serde_json::from_str(r#"{"name":"Sam"}"#).unwrap();
        assert_eq!(member.weekly_capacity, None);
    }
}
