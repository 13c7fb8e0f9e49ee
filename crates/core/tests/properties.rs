//! Cross-cutting properties of the analysis and export.

mod common;

use common::Script;
use sweep_core::analysis::Analysis;
use sweep_core::region::Region;
use sweep_core::registry::{FunctionRegistry, MemoryRegistry};

fn busy_script() -> Script {
    Script::new()
        .call(0x00, 5, 0x10)
        .call(0x05, 5, 0x30)
        .push_imm(0x0A, 5, 0x60)
        .insn(0x10, 1)
        .jcc(0x11, 2, 0x16)
        .insn(0x13, 2)
        .insn(0x16, 1)
        .ret(0x17)
        .insn(0x30, 2)
        .ret(0x32)
        .jmp_mem(0x60, 6)
        .ret(0x66)
}

fn busy_analysis() -> Analysis {
    Analysis::from_region(Region::from_bytes(0x00, &[0u8; 0x100]))
}

#[test]
fn analyze_is_deterministic_and_idempotent() {
    let script = busy_script();
    let analysis = busy_analysis();

    let first = analysis.analyze(&script);
    let second = analysis.analyze(&script);
    assert_eq!(first, second);

    // A fresh session over the same bytes agrees as well.
    let other = busy_analysis().analyze(&script);
    assert_eq!(first, other);
}

#[test]
fn resolved_ends_stay_inside_the_candidate_bound() {
    let script = busy_script();
    let analysis = busy_analysis();
    let set = analysis.analyze(&script);

    assert!(set.len() >= 2);
    for index in 0..set.len() {
        let candidate = set.get(index).unwrap();
        let bound = set.bound(index, analysis.region().end());
        if let Some(end) = candidate.end {
            assert!(candidate.start <= end, "start {:#x} end {:#x}", candidate.start, end);
            assert!(end < bound, "end {:#x} bound {:#x}", end, bound);
        }
    }
}

#[test]
fn candidates_are_sorted_and_unique() {
    let script = busy_script();
    let set = busy_analysis().analyze(&script);

    let starts: Vec<u64> = set.iter().map(|c| c.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(starts, sorted);
}

#[test]
fn export_installs_exactly_the_resolved_candidates() {
    let script = busy_script();
    let analysis = busy_analysis();
    let set = analysis.analyze(&script);

    let mut registry = MemoryRegistry::new();
    analysis.export_boundaries(&set, &mut registry).unwrap();

    let expected: Vec<(u64, u64)> =
        set.resolved().map(|c| (c.start, c.end.unwrap())).collect();
    let got: Vec<(u64, u64)> = registry.ranges().iter().map(|r| (r.start, r.end)).collect();
    assert_eq!(got, expected);
    assert!(registry.ranges().iter().all(|r| r.heuristic));

    // No overlaps between recorded ranges.
    for pair in registry.ranges().windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
}

#[test]
fn export_twice_yields_the_same_registry_state() {
    let script = busy_script();
    let analysis = busy_analysis();
    let set = analysis.analyze(&script);

    let mut registry = MemoryRegistry::new();
    analysis.export_boundaries(&set, &mut registry).unwrap();
    let after_first = registry.ranges().to_vec();

    analysis.export_boundaries(&set, &mut registry).unwrap();
    assert_eq!(registry.ranges(), after_first.as_slice());
}

#[test]
fn export_clears_stale_ranges_inside_the_region() {
    let script = busy_script();
    let analysis = busy_analysis();
    let set = analysis.analyze(&script);

    let mut registry = MemoryRegistry::new();
    // Stale range inside the region, plus one outside that must survive.
    registry.add_range(0x40, 0x48, true).unwrap();
    registry.add_range(0x2000, 0x2010, false).unwrap();

    analysis.export_boundaries(&set, &mut registry).unwrap();

    assert!(registry.ranges().iter().all(|r| r.start != 0x40));
    assert!(registry.ranges().iter().any(|r| r.start == 0x2000));
}

#[test]
fn empty_region_yields_empty_set() {
    let script = Script::new();
    let analysis = Analysis::from_region(Region::from_bytes(0x00, &[0u8; 0x20]));
    let set = analysis.analyze(&script);
    assert!(set.is_empty());

    let mut registry = MemoryRegistry::new();
    analysis.export_boundaries(&set, &mut registry).unwrap();
    assert!(registry.ranges().is_empty());
}

#[test]
fn candidate_sets_serialize_for_reports() {
    let set = busy_analysis().analyze(&busy_script());
    let json = serde_json::to_string(&set).unwrap();
    let back: sweep_core::model::CandidateSet = serde_json::from_str(&json).unwrap();
    assert_eq!(set, back);
}

#[test]
fn import_stub_exclusion_holds_even_with_a_following_return() {
    let script = busy_script();
    let set = busy_analysis().analyze(&script);

    // 0x60 starts with jmp [mem]; the ret at 0x66 must not resolve it.
    let stub = set.iter().find(|c| c.start == 0x60).unwrap();
    assert_eq!(stub.end, None);
}
