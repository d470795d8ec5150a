//! Overlap processing logic.
//!
//! This module contains the analysis built on top of [`crate::models`]:
//! - [`overlap`] - Classification of two ranges
//! - [`suggest`] - Finding a non-conflicting neighbour block
//! - [`batch`] - Pairwise analysis over a list of prefixes

mod batch;
mod overlap;
mod suggest;

// Re-export public functions
pub use batch::{
    analyze, analyze_with, entries_from_value, BatchReport, BatchStatistics, Conflict,
    InvalidEntry, SeverityCounts, ValidEntry,
};
pub use overlap::{
    classify, classify_with_precision, OverlapMetrics, OverlapResult, OverlapType, Severity,
    DEFAULT_PRECISION, MAX_PRECISION,
};
pub use suggest::suggest;
