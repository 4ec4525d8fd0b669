//! Spreadsheet ingestion: an in-memory grid, byte readers for the accepted
//! upload formats, and orientation/layout detection.

pub mod grid;
pub mod layout;
pub mod reader;

pub use grid::{Cell, Sheet};
pub use layout::{detect_layout, detect_orientation, orient, Layout, Orientation};
pub use reader::{read_workbook, SpreadsheetError, SUPPORTED_EXTENSIONS};
