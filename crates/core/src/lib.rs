//! Pure domain logic for the studio resource planner.
//!
//! Nothing in this crate touches the database or the network. Spreadsheet
//! bytes come in, validated drafts and placements come out; persistence and
//! remote AI calls are reached through the traits in [`import`].

pub mod error;
pub mod import;
pub mod project;
pub mod roster;
pub mod spreadsheet;
pub mod template;
pub mod timeline;
pub mod types;
pub mod utilization;
