//! Pairwise overlap analysis over a list of candidate prefixes.
//!
//! Every entry is parsed on its own; bad entries are recorded against their
//! index and left out of the comparison matrix. All `C(n,2)` pairs of valid
//! entries are classified and the overlapping ones kept as conflicts.

use super::overlap::{classify, OverlapResult, Severity};
use crate::error::EngineError;
use crate::models::{parse_network, NetworkRange};
use itertools::Itertools;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// An entry that parsed into a network range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidEntry {
    pub index: usize,
    pub input: String,
    pub range: NetworkRange,
}

/// An entry that failed to parse, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidEntry {
    pub index: usize,
    pub input: String,
    pub error: EngineError,
}

/// An overlapping pair of valid entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    /// Input indexes of the pair, lower index first.
    pub index_pair: (usize, usize),
    pub first: NetworkRange,
    pub second: NetworkRange,
    pub result: OverlapResult,
}

/// Conflict counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStatistics {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub conflict_count: usize,
    /// Pairs actually compared (less than `C(valid, 2)` when cancelled).
    pub comparisons: usize,
    pub by_severity: SeverityCounts,
    pub worst_severity: Severity,
    /// `max(0, 100 - 10 * invalid - 15 * conflicts)`.
    pub health_score: u32,
    /// `valid / total`.
    pub validation_rate: f64,
    /// `conflicts / valid`.
    pub conflict_rate: f64,
}

/// Transient report scoped to one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub valid_entries: Vec<ValidEntry>,
    pub invalid_entries: Vec<InvalidEntry>,
    /// Ordered by severity (worst first), then by index pair.
    pub conflicts: Vec<Conflict>,
    pub statistics: BatchStatistics,
    /// Set when the cancel flag stopped the pair loop early.
    pub cancelled: bool,
}

/// Analyze a batch with the plain codec and classifier.
pub fn analyze<S: AsRef<str>>(entries: &[S]) -> BatchReport {
    analyze_with(entries, parse_network, |a, b| classify(a, b), None)
}

/// Analyze a batch with caller supplied range resolution and comparison.
///
/// `cancel` is checked before every pair comparison.
pub fn analyze_with<S, R, C>(
    entries: &[S],
    mut resolve: R,
    mut compare: C,
    cancel: Option<&AtomicBool>,
) -> BatchReport
where
    S: AsRef<str>,
    R: FnMut(&str) -> Result<NetworkRange, EngineError>,
    C: FnMut(&NetworkRange, &NetworkRange) -> Result<OverlapResult, EngineError>,
{
    log::info!("#Start analyze() with {} entries", entries.len());

    let mut valid_entries = Vec::new();
    let mut invalid_entries = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let input = entry.as_ref();
        match resolve(input) {
            Ok(range) => valid_entries.push(ValidEntry {
                index,
                input: input.to_string(),
                range,
            }),
            Err(error) => {
                log::warn!("Entry {index} '{input}' is invalid: {error}");
                invalid_entries.push(InvalidEntry {
                    index,
                    input: input.to_string(),
                    error,
                });
            }
        }
    }

    let mut conflicts = Vec::new();
    let mut comparisons = 0;
    let mut cancelled = false;
    for (a, b) in valid_entries.iter().tuple_combinations() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            log::warn!("Batch cancelled after {comparisons} comparisons");
            cancelled = true;
            break;
        }
        comparisons += 1;
        match compare(&a.range, &b.range) {
            Ok(result) if result.has_overlap => conflicts.push(Conflict {
                index_pair: (a.index, b.index),
                first: a.range,
                second: b.range,
                result,
            }),
            Ok(_) => {}
            Err(e) => log::warn!(
                "Skipping pair ({}, {}) that failed to compare: {e}",
                a.index,
                b.index
            ),
        }
    }

    conflicts.sort_by(|x, y| {
        y.result
            .severity
            .cmp(&x.result.severity)
            .then_with(|| x.index_pair.cmp(&y.index_pair))
    });

    let statistics = summarize(
        entries.len(),
        valid_entries.len(),
        invalid_entries.len(),
        &conflicts,
        comparisons,
    );
    log::info!(
        "# End analyze() valid={} invalid={} conflicts={} health={}",
        statistics.valid_count,
        statistics.invalid_count,
        statistics.conflict_count,
        statistics.health_score
    );

    BatchReport {
        valid_entries,
        invalid_entries,
        conflicts,
        statistics,
        cancelled,
    }
}

fn summarize(
    total: usize,
    valid_count: usize,
    invalid_count: usize,
    conflicts: &[Conflict],
    comparisons: usize,
) -> BatchStatistics {
    let mut by_severity = SeverityCounts::default();
    for conflict in conflicts {
        by_severity.record(conflict.result.severity);
    }
    let worst_severity = conflicts
        .iter()
        .map(|c| c.result.severity)
        .max()
        .unwrap_or(Severity::None);

    let conflict_count = conflicts.len();
    let penalty = 10 * invalid_count as i64 + 15 * conflict_count as i64;
    let health_score = (100 - penalty).max(0) as u32;

    BatchStatistics {
        total,
        valid_count,
        invalid_count,
        conflict_count,
        comparisons,
        by_severity,
        worst_severity,
        health_score,
        validation_rate: ratio(valid_count, total),
        conflict_rate: ratio(conflict_count, valid_count),
    }
}

/// `num / den` rounded to 4 decimals, 0 for an empty denominator.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        return 0.0;
    }
    (num as f64 / den as f64 * 10_000.0).round() / 10_000.0
}

/// Pull a list of strings out of untyped JSON input.
pub fn entries_from_value(value: &serde_json::Value) -> Result<Vec<String>, EngineError> {
    let items = value
        .as_array()
        .ok_or_else(|| EngineError::input("expected a list of CIDR strings"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| EngineError::input(format!("entry {i} is not a string: {item}")))
        })
        .collect()
}
