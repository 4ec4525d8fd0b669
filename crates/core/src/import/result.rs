//! Accumulated outcome of a bulk import.

use serde::{Deserialize, Serialize};

/// Errors, warnings and suggestions collected across a whole import and
/// shown to the user once it finishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    /// `true` when no errors were recorded.
    pub success: bool,
    /// Rows (or matrix cells) actually persisted.
    pub success_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ImportResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a suggestion, ignoring exact duplicates.
    pub fn suggestion(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.suggestions.contains(&message) {
            self.suggestions.push(message);
        }
    }

    /// Append another result's messages and counts.
    pub fn merge(&mut self, other: ImportResult) {
        self.success_count += other.success_count;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        for s in other.suggestions {
            self.suggestion(s);
        }
    }

    /// Seal the result, deriving the success flag from the error list.
    pub fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

/// Progress notification emitted after each processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
}

impl ImportProgress {
    /// Whole-number completion percentage (100 for an empty batch).
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }
}
