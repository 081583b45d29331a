//! Shared utilities.

pub mod path;

/// Format a count with its noun: `1 stylesheet`, `3 stylesheets`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
