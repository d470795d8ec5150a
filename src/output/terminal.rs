//! Terminal output utilities.
//!
//! Provides field formatting helpers and a colored summary of a batch report.

use crate::processing::{BatchReport, Severity};
use colored::{ColoredString, Colorize};

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Severity tag colored by rank.
pub fn severity_tag(severity: Severity) -> ColoredString {
    let tag = format!("[{severity}]");
    match severity {
        Severity::Critical => tag.on_red(),
        Severity::High => tag.red(),
        Severity::Medium => tag.yellow(),
        Severity::Low => tag.blue(),
        Severity::None => tag.green(),
    }
}

/// Render a human readable report.
pub fn render_terminal(report: &BatchReport) -> String {
    let stats = &report.statistics;
    let mut lines: Vec<String> = Vec::new();

    for entry in &report.invalid_entries {
        lines.push(format!(
            "{} #{} '{}': {}",
            "INVALID".on_red(),
            entry.index,
            entry.input,
            entry.error
        ));
    }
    for conflict in &report.conflicts {
        let (i, j) = conflict.index_pair;
        lines.push(format!(
            "{tag} #{i} {first} <-> #{j} {second}: {kind} {pct}% - {reason}",
            tag = severity_tag(conflict.result.severity),
            first = conflict.first,
            second = conflict.second,
            kind = conflict.result.kind,
            pct = conflict.result.metrics.percentage_of_smaller,
            reason = conflict.result.reason,
        ));
    }
    if report.cancelled {
        lines.push(format!("{}", "Analysis cancelled, results are partial".on_yellow()));
    }
    let health = format!("{}", stats.health_score);
    let health = match stats.health_score {
        80.. => health.green(),
        50..=79 => health.yellow(),
        _ => health.red(),
    };
    lines.push(format!(
        "# {total} entries, {valid} valid, {invalid} invalid, {conflicts} conflicts (worst {worst}), health {health}",
        total = stats.total,
        valid = stats.valid_count,
        invalid = stats.invalid_count,
        conflicts = stats.conflict_count,
        worst = stats.worst_severity,
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
