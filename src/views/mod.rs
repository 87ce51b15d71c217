//! Shaping stored documents for display: tables, line charts and CSV.

pub mod chart;
pub mod csv;
pub mod table;

pub use chart::{Figure, Trace, line_chart, resolve_y};
pub use table::Table;
