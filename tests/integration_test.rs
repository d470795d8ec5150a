//! Integration tests for ipv6-overlap-engine
//!
//! These tests drive the public engine API end to end.

use ipv6_overlap_engine::models::{compress, expand, parse_network, to_integer};
use ipv6_overlap_engine::output::{render_csv, render_terminal};
use ipv6_overlap_engine::processing::{classify, OverlapType, Severity};
use ipv6_overlap_engine::{read_prefix_lines, Engine, EngineError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn sample_prefixes() -> Vec<String> {
    let input = std::fs::read_to_string("tests/data/prefixes_01.txt")
        .expect("Failed to read prefix fixture");
    read_prefix_lines(&input)
}

#[test]
fn test_full_workflow_with_fixture() {
    let entries = sample_prefixes();
    assert_eq!(entries.len(), 10, "Expected 10 prefixes in fixture");

    let engine = Engine::default();
    let report = engine.analyze_batch(entries.as_slice());

    assert_eq!(report.valid_entries.len(), 8);
    assert_eq!(report.invalid_entries.len(), 2);
    assert_eq!(report.invalid_entries[0].index, 8);
    assert!(matches!(report.invalid_entries[0].error, EngineError::Format(_)));
    assert_eq!(report.invalid_entries[1].index, 9);
    assert!(matches!(report.invalid_entries[1].error, EngineError::Range(_)));

    // the /32 holds four blocks, the first /48 two, the /64 the /80
    assert_eq!(report.statistics.conflict_count, 7);
    assert_eq!(report.statistics.by_severity.high, 7);
    assert_eq!(report.statistics.worst_severity, Severity::High);
    assert_eq!(report.statistics.health_score, 0);
    assert_eq!(report.statistics.comparisons, 28);
    assert!(report
        .conflicts
        .iter()
        .all(|c| c.index_pair.0 < c.index_pair.1));
}

#[test]
fn test_documented_examples() {
    let engine = Engine::default();

    let r = engine
        .check_overlap("2001:db8:a::1/64", "2001:db8:b::/48")
        .unwrap();
    assert!(!r.has_overlap);

    let r = engine.check_overlap("2001:db8::/32", "2001:db8::/32").unwrap();
    assert_eq!(r.kind, OverlapType::Identical);
    assert_eq!(r.severity, Severity::Critical);

    let r = engine
        .check_overlap("2001:db8::/32", "2001:db8:1::/48")
        .unwrap();
    assert_eq!(r.kind, OverlapType::FirstContainsSecond);

    let suggestion = engine
        .suggest_alternative("2001:db8:a::/64", "2001:db8:a::/64")
        .unwrap()
        .expect("Expected a suggestion");
    assert_eq!(suggestion, "2001:db8:a:1::/64");
    assert!(!engine
        .check_overlap(&suggestion, "2001:db8:a::/64")
        .unwrap()
        .has_overlap);

    let report = engine.analyze_batch(&["2001:db8::1/64", "not-an-ip", "2001:db8::2/64"]);
    assert_eq!(report.invalid_entries.len(), 1);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.statistics.health_score, 100 - 10 - 15);
}

#[test]
fn test_codec_round_trip() {
    for text in ["2001:db8::1", "::", "fe80::1:0:0:1", "1:0:0:2::3", "ff02::1:ff00:1"] {
        let expanded = expand(text).unwrap();
        assert_eq!(expand(&expanded).unwrap(), expanded);
        assert_eq!(compress(&expanded).unwrap(), text);
        assert_eq!(to_integer(&expanded).unwrap(), to_integer(text).unwrap());
    }
}

#[test]
fn test_containment_symmetry() {
    let pairs = [
        ("2001:db8::/32", "2001:db8:ffff::/48"),
        ("::/0", "fe80::/10"),
        ("fd00::/8", "fd00::1/128"),
    ];
    for (outer, inner) in pairs {
        let a = parse_network(outer).unwrap();
        let b = parse_network(inner).unwrap();
        let ab = classify(&a, &b).unwrap();
        let ba = classify(&b, &a).unwrap();
        assert_eq!(ab.kind, OverlapType::FirstContainsSecond);
        assert_eq!(ba.kind, OverlapType::SecondContainsFirst);
        assert_eq!(ab.metrics.overlap_size, ba.metrics.overlap_size);
        assert_eq!(ab.metrics.percentage_of_smaller, 100.0);
    }
}

#[test]
fn test_cancel_from_another_thread() {
    let engine = Arc::new(Engine::default());
    let cancel = Arc::new(AtomicBool::new(false));
    cancel.store(true, Ordering::SeqCst);

    let entries: Vec<String> = (0..50).map(|i| format!("2001:db8:{i:x}::/48")).collect();
    let handle = {
        let engine = Arc::clone(&engine);
        let cancel = Arc::clone(&cancel);
        std::thread::spawn(move || engine.analyze_batch_cancellable(entries.as_slice(), &cancel))
    };
    let report = handle.join().expect("analysis thread panicked");
    assert!(report.cancelled);
    assert_eq!(report.valid_entries.len(), 50);
    assert_eq!(report.statistics.comparisons, 0);
}

#[test]
fn test_rendering() {
    let engine = Engine::default();
    let report = engine.analyze_batch(sample_prefixes().as_slice());

    let csv = render_csv(&report);
    assert_eq!(csv.lines().count(), 1 + 7 + 2);

    colored::control::set_override(false);
    let text = render_terminal(&report);
    assert!(text.contains("10 entries, 8 valid, 2 invalid, 7 conflicts (worst HIGH)"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["statistics"]["health_score"], 0);
    assert_eq!(json["invalid_entries"][0]["error"]["kind"], "Format");
}

#[test]
fn test_validate_and_cache_stats() {
    let engine = Engine::default();
    let report = engine.validate("[2001:db8::1]/64");
    assert!(report.valid);
    assert_eq!(report.compressed.as_deref(), Some("2001:db8::1"));
    let again = engine.validate("[2001:db8::1]/64");
    assert_eq!(report, again);

    let stats = engine.cache_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 1);
    engine.clear_cache();
    assert_eq!(engine.cache_stats().size, 0);
}
