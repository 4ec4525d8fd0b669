//! Project-level normalisation: status synonyms, currency codes, placeholder
//! filtering, and synthesized project codes.
//!
//! These helpers back both the spreadsheet importer and the HTTP handlers, so
//! they live here with no dependency on the import pipeline itself.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Target profit percentage applied when a row leaves the field blank.
pub const DEFAULT_TARGET_PROFIT_PCT: f64 = 15.0;

/// Currency applied when a row leaves the field blank.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Prefix for synthesized project codes (`PROJ-001`, `PROJ-002`, ...).
pub const DEFAULT_CODE_PREFIX: &str = "PROJ";

/// Weekly capacity assumed for a person with no explicit value.
pub const DEFAULT_WEEKLY_CAPACITY: f64 = 40.0;

/// Inclusive bounds for target profit percentages.
pub const MIN_TARGET_PROFIT_PCT: f64 = 0.0;
pub const MAX_TARGET_PROFIT_PCT: f64 = 100.0;

/// Currencies accepted without a warning, before office currencies are added.
pub const COMMON_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "AUD", "CAD", "NZD", "SGD", "HKD", "JPY", "CNY", "AED", "CHF",
    "SEK", "NOK", "DKK", "INR", "ZAR",
];

static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid regex"));

/// Matrix-style project codes such as `12.3` or `2024.07`.
static MATRIX_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("valid regex"));

/// Synthesized codes such as `PROJ-007`.
static GENERATED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{2,8}-\d{3,}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Canonical project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    #[default]
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        Self::Planning,
        Self::Active,
        Self::OnHold,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Canonical display label, also the persisted value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Active => "Active",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Parse a status leniently.
    ///
    /// Case, surrounding whitespace, hyphens and underscores are ignored, and
    /// common spreadsheet synonyms are folded onto the canonical status:
    /// `"WIP"` becomes [`ProjectStatus::Active`], `"On-Hold"` becomes
    /// [`ProjectStatus::OnHold`].
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let status = match key.as_str() {
            "active" | "wip" | "in progress" | "ongoing" | "live" | "open" | "current" => {
                Self::Active
            }
            "on hold" | "onhold" | "hold" | "paused" | "suspended" => Self::OnHold,
            "completed" | "complete" | "done" | "finished" | "closed" => Self::Completed,
            "cancelled" | "canceled" | "dropped" | "lost" | "abandoned" => Self::Cancelled,
            "planning" | "planned" | "proposal" | "pipeline" | "tentative" | "prospect"
            | "pending" => Self::Planning,
            _ => return None,
        };
        Some(status)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| format!("Unknown project status: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Currency / placeholders / codes
// ---------------------------------------------------------------------------

/// Normalise a currency code to upper-case ISO-4217 form.
///
/// Returns `None` unless the trimmed value is exactly three ASCII letters.
pub fn normalize_currency(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    CURRENCY_RE.is_match(&upper).then_some(upper)
}

/// Values spreadsheet authors use to mean "nothing here".
const PLACEHOLDERS: &[&str] = &[
    "",
    "-",
    "--",
    "n/a",
    "na",
    "none",
    "null",
    "tbd",
    "tbc",
    "unknown",
    "country",
    "select country",
    "select office",
    "office",
];

/// Whether a cell value is a placeholder that should be treated as absent.
pub fn is_placeholder(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

/// Whether a value looks like a matrix project code (`x.y`).
pub fn is_project_code(raw: &str) -> bool {
    MATRIX_CODE_RE.is_match(raw.trim())
}

/// Whether a value looks like a synthesized code (`ABCD-123`).
pub fn is_generated_code(raw: &str) -> bool {
    GENERATED_CODE_RE.is_match(raw.trim())
}

/// Produces unique `PREFIX-NNN` codes for rows that arrive without one.
///
/// The counter only moves forward within one generator, so codes issued in a
/// single import batch are strictly increasing. Codes already present in the
/// `taken` set are skipped.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    prefix: String,
    next: u32,
    taken: HashSet<String>,
}

impl CodeGenerator {
    pub fn new(prefix: &str, taken: impl IntoIterator<Item = String>) -> Self {
        let prefix = prefix.trim().to_uppercase();
        Self {
            prefix: if prefix.is_empty() {
                DEFAULT_CODE_PREFIX.to_string()
            } else {
                prefix
            },
            next: 1,
            taken: taken.into_iter().map(|c| c.to_uppercase()).collect(),
        }
    }

    /// Mark a code as used (e.g. one supplied by a later row in the batch).
    pub fn reserve(&mut self, code: &str) {
        self.taken.insert(code.trim().to_uppercase());
    }

    /// Issue the next free code.
    pub fn next_code(&mut self) -> String {
        loop {
            let candidate = format!("{}-{:03}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
