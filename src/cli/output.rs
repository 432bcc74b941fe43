//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use owo_colors::OwoColorize;

use crate::domain::{CacheStatus, Coverage, DayCoverage};

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(56));
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<14} {value}");
}

/// Colorized day-coverage label for tables.
#[must_use]
pub fn coverage_label(status: DayCoverage) -> String {
    match status {
        DayCoverage::Complete => "complete".green().to_string(),
        DayCoverage::Partial => "partial".yellow().to_string(),
        DayCoverage::Missing => "missing".red().to_string(),
    }
}

/// Colorized response-coverage label.
#[must_use]
pub fn response_coverage_label(coverage: Coverage) -> String {
    match coverage {
        Coverage::Complete => "complete".green().to_string(),
        Coverage::Partial => "partial — contains missing intervals".yellow().to_string(),
    }
}

/// Human label for how the cache served a query.
#[must_use]
pub fn cache_label(status: CacheStatus) -> &'static str {
    match status {
        CacheStatus::Hit => "hit",
        CacheStatus::Miss => "miss",
        CacheStatus::InFlightJoined => "joined in-flight computation",
    }
}
