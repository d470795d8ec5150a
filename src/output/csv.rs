//! CSV output formatting for batch reports.

use super::terminal::format_field;
use crate::processing::{BatchReport, Conflict, InvalidEntry};
use itertools::Itertools;

const HEADER: &str = r#"   "i",   "j",                 "first",                "second",                  "type", "severity",  "overlap_size",  "pct", "reason""#;

/// Render the report as CSV: one row per conflict, then one per invalid entry.
pub fn render_csv(report: &BatchReport) -> String {
    log::info!(
        "#Start render_csv() conflicts={} invalid={}",
        report.conflicts.len(),
        report.invalid_entries.len()
    );
    let mut rows = std::iter::once(HEADER.to_string())
        .chain(report.conflicts.iter().map(conflict_row))
        .chain(report.invalid_entries.iter().map(invalid_row));
    format!("{}\n", rows.join("\n"))
}

fn conflict_row(conflict: &Conflict) -> String {
    let (i, j) = conflict.index_pair;
    let metrics = &conflict.result.metrics;
    format!(
        "{i},{j},{first},{second},{kind},{severity},{size},{pct},{reason}",
        i = format_field(i, 6),
        j = format_field(j, 6),
        first = format_field(conflict.first, 24),
        second = format_field(conflict.second, 24),
        kind = format_field(conflict.result.kind, 24),
        severity = format_field(conflict.result.severity, 11),
        size = format_field(
            metrics
                .overlap_size
                .map(|c| c.approx())
                .unwrap_or_else(|| "0".to_string()),
            15
        ),
        pct = format_field(metrics.percentage_of_smaller, 7),
        reason = format_field(escape_quotes(&conflict.result.reason), 0),
    )
}

fn invalid_row(entry: &InvalidEntry) -> String {
    format!(
        "{i},{j},{first},{second},{kind},{severity},{size},{pct},{reason}",
        i = format_field(entry.index, 6),
        j = format_field("", 6),
        first = format_field(escape_quotes(&entry.input), 24),
        second = format_field("", 24),
        kind = format_field("INVALID", 24),
        severity = format_field("", 11),
        size = format_field("", 15),
        pct = format_field("", 7),
        reason = format_field(escape_quotes(&entry.error.to_string()), 0),
    )
}

// excel expects embedded quotes doubled
fn escape_quotes(input: &str) -> String {
    input.replace('"', "\"\"")
}
