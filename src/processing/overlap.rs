//! Overlap classification between two address ranges.
//!
//! Decides whether two ranges intersect, how (identical, containment,
//! partial) and how close disjoint ranges are, and attaches a severity used
//! for worst-case ranking in batch reports.

use crate::error::EngineError;
use crate::models::{Address128, AddressBounds, AddressCount};
use serde::{Serialize, Serializer};
use std::fmt;

/// Decimal places kept on `percentage_of_smaller` unless configured otherwise.
pub const DEFAULT_PRECISION: u32 = 2;

/// Upper bound on configurable precision.
pub const MAX_PRECISION: u32 = 6;

/// How two ranges relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapType {
    Identical,
    FirstContainsSecond,
    SecondContainsFirst,
    Partial,
    Adjacent,
    NoOverlap,
}

impl OverlapType {
    pub fn has_overlap(&self) -> bool {
        !matches!(self, OverlapType::Adjacent | OverlapType::NoOverlap)
    }

    pub fn severity(&self) -> Severity {
        match self {
            OverlapType::Identical => Severity::Critical,
            OverlapType::FirstContainsSecond | OverlapType::SecondContainsFirst => Severity::High,
            OverlapType::Partial => Severity::Medium,
            OverlapType::Adjacent => Severity::Low,
            OverlapType::NoOverlap => Severity::None,
        }
    }
}

impl fmt::Display for OverlapType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OverlapType::Identical => "IDENTICAL",
            OverlapType::FirstContainsSecond => "FIRST_CONTAINS_SECOND",
            OverlapType::SecondContainsFirst => "SECOND_CONTAINS_FIRST",
            OverlapType::Partial => "PARTIAL",
            OverlapType::Adjacent => "ADJACENT",
            OverlapType::NoOverlap => "NO_OVERLAP",
        };
        f.write_str(name)
    }
}

/// Qualitative rank of a finding; variant order is the ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Severity {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::None => "NONE",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// Quantitative side of an [`OverlapResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapMetrics {
    pub overlap_start: Option<Address128>,
    pub overlap_end: Option<Address128>,
    /// Number of shared addresses.
    pub overlap_size: Option<AddressCount>,
    /// Shared addresses as a percentage of the smaller range.
    pub percentage_of_smaller: f64,
    pub adjacent: bool,
    /// Addresses strictly between two disjoint ranges.
    #[serde(serialize_with = "serialize_opt_decimal")]
    pub distance: Option<u128>,
}

/// Classification of one ordered pair of ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapResult {
    pub has_overlap: bool,
    #[serde(rename = "type")]
    pub kind: OverlapType,
    pub severity: Severity,
    pub reason: String,
    pub metrics: OverlapMetrics,
}

fn serialize_opt_decimal<S>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

/// Classify two ranges with the default 2 decimal percentage precision.
///
/// # Examples
/// ```
/// use ipv6_overlap_engine::models::parse_network;
/// use ipv6_overlap_engine::processing::{classify, OverlapType};
/// let a = parse_network("2001:db8::/32").unwrap();
/// let b = parse_network("2001:db8:1::/48").unwrap();
/// assert_eq!(classify(&a, &b).unwrap().kind, OverlapType::FirstContainsSecond);
/// ```
pub fn classify<A, B>(a: &A, b: &B) -> Result<OverlapResult, EngineError>
where
    A: AddressBounds + ?Sized,
    B: AddressBounds + ?Sized,
{
    classify_with_precision(a, b, DEFAULT_PRECISION)
}

pub fn classify_with_precision<A, B>(
    a: &A,
    b: &B,
    precision: u32,
) -> Result<OverlapResult, EngineError>
where
    A: AddressBounds + ?Sized,
    B: AddressBounds + ?Sized,
{
    let (a0, a1) = checked_bounds(a)?;
    let (b0, b1) = checked_bounds(b)?;

    let result = if a0 <= b1 && b0 <= a1 {
        overlapping(a, b, precision.min(MAX_PRECISION))
    } else {
        disjoint(a, b)
    };
    log::debug!(
        "classify({a}, {b}) -> {kind} {severity}",
        kind = result.kind,
        severity = result.severity
    );
    Ok(result)
}

fn checked_bounds<R: AddressBounds + ?Sized>(
    range: &R,
) -> Result<(Address128, Address128), EngineError> {
    let (first, last) = (range.first(), range.last());
    if first > last {
        return Err(EngineError::input(format!(
            "invalid range {range}: start is above end"
        )));
    }
    Ok((first, last))
}

fn disjoint<A, B>(a: &A, b: &B) -> OverlapResult
where
    A: AddressBounds + ?Sized,
    B: AddressBounds + ?Sized,
{
    // strictly ordered, so the subtraction cannot underflow
    let gap = if a.last() < b.first() {
        b.first().value() - a.last().value() - 1
    } else {
        a.first().value() - b.last().value() - 1
    };
    let adjacent = gap == 0;
    let kind = if adjacent {
        OverlapType::Adjacent
    } else {
        OverlapType::NoOverlap
    };
    let reason = if adjacent {
        format!("{a} and {b} are adjacent with no gap")
    } else {
        format!("{a} and {b} do not overlap ({gap} addresses apart)")
    };
    OverlapResult {
        has_overlap: false,
        kind,
        severity: kind.severity(),
        reason,
        metrics: OverlapMetrics {
            overlap_start: None,
            overlap_end: None,
            overlap_size: None,
            percentage_of_smaller: 0.0,
            adjacent,
            distance: Some(gap),
        },
    }
}

fn overlapping<A, B>(a: &A, b: &B, precision: u32) -> OverlapResult
where
    A: AddressBounds + ?Sized,
    B: AddressBounds + ?Sized,
{
    let (a0, a1, b0, b1) = (a.first(), a.last(), b.first(), b.last());
    let kind = if a0 == b0 && a1 == b1 {
        OverlapType::Identical
    } else if a0 <= b0 && a1 >= b1 {
        OverlapType::FirstContainsSecond
    } else if b0 <= a0 && b1 >= a1 {
        OverlapType::SecondContainsFirst
    } else {
        OverlapType::Partial
    };

    let start = a0.max(b0);
    let end = a1.min(b1);
    let size = AddressCount::from_span(end.value() - start.value());
    let smaller = a.count().min(b.count());
    let percentage = match kind {
        OverlapType::Partial => partial_percentage(size, smaller, precision),
        _ => 100.0,
    };

    let reason = match kind {
        OverlapType::Identical => format!("{a} and {b} cover the identical address range"),
        OverlapType::FirstContainsSecond => format!("{a} fully contains {b}"),
        OverlapType::SecondContainsFirst => format!("{b} fully contains {a}"),
        _ => format!("{a} and {b} partially overlap ({size} shared addresses)"),
    };

    OverlapResult {
        has_overlap: true,
        kind,
        severity: kind.severity(),
        reason,
        metrics: OverlapMetrics {
            overlap_start: Some(start),
            overlap_end: Some(end),
            overlap_size: Some(size),
            percentage_of_smaller: percentage,
            adjacent: false,
            distance: None,
        },
    }
}

/// Percentage of the smaller range covered by a partial overlap.
///
/// Only containment reports 100, so a partial overlap that rounds up to 100
/// is held one step below it.
fn partial_percentage(size: AddressCount, smaller: AddressCount, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let raw = size.as_f64() * 100.0 / smaller.as_f64();
    let rounded = (raw * factor).round() / factor;
    if rounded >= 100.0 {
        100.0 - 1.0 / factor
    } else {
        rounded
    }
}
