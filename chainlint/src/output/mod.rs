//! Report rendering: colored text tables, JSON, and scan progress.

/// Progress spinner helpers.
pub mod progress;
/// Full text/JSON report entry points.
pub mod reports;
/// Header and summary pills.
pub mod summary;
/// Finding/parse-error tables.
pub mod tables;

pub use reports::{print_json, print_report};
