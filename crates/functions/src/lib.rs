//! Client for the planner's remote serverless functions.
//!
//! Provides the HTTP wrapper, the wire types each function speaks, and the
//! [`studioplan_core::import::ColumnAnalyzer`] implementation backed by the
//! remote structure classifier.

pub mod api;
pub mod messages;

pub use api::{encode_image, FunctionsApi, FunctionsError};
