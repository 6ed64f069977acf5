use std::collections::HashSet;

use super::*;

#[test]
fn test_first_call_is_zero_regardless_of_magnitude() {
    let mut tracker: DeltaTracker = DeltaTracker::new();
    assert_eq!(tracker.next("disk0", i64::MAX), 0);
    assert_eq!(tracker.baseline("disk0"), Some(i64::MAX));
}

#[test]
fn test_growth_after_baseline() {
    let mut tracker: DeltaTracker = DeltaTracker::new();
    tracker.next("en0", 4096);
    assert_eq!(tracker.next("en0", 4196), 100);
    assert_eq!(tracker.next("en0", 4196), 0);
}

#[test]
fn test_reset_clamps_and_rebaselines() {
    let mut tracker: DeltaTracker = DeltaTracker::new();
    let deltas: Vec<i64> = [1000, 1500, 1200, 1300].iter().map(|value| tracker.next("en0", *value)).collect();

    assert_eq!(deltas, vec![0, 500, 0, 100]);
}

#[test]
fn test_keys_are_independent() {
    let mut tracker: DeltaTracker = DeltaTracker::new();
    tracker.next("en0", 10);
    tracker.next("en1", 1000);

    assert_eq!(tracker.next("en0", 20), 10);
    assert_eq!(tracker.next("en1", 1001), 1);
    assert_eq!(tracker.len(), 2);
}

#[test]
fn test_evict_missing_keys() {
    let mut tracker: DeltaTracker = DeltaTracker::new();
    tracker.next("disk0", 10);
    tracker.next("disk2", 10);

    let live: HashSet<&str> = ["disk0"].into_iter().collect();
    tracker.evict_missing(&live);

    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.baseline("disk2"), None);

    // a drive that comes back starts over from a fresh baseline
    assert_eq!(tracker.next("disk2", 5000), 0);
    assert_eq!(tracker.next("disk0", 15), 5);
}

#[test]
fn test_duplex_tracks_both_directions() {
    let mut tracker: DuplexTracker = DuplexTracker::new();
    assert_eq!(tracker.next("en0", 100, 200), (0, 0));
    assert_eq!(tracker.next("en0", 150, 180), (50, 0));
    assert_eq!(tracker.next("en0", 160, 280), (10, 100));
}

#[test]
fn test_duplex_saturates_huge_counters() {
    let mut tracker: DuplexTracker = DuplexTracker::new();
    tracker.next("disk0", u64::MAX, 0);
    assert_eq!(tracker.next("disk0", u64::MAX, 1), (0, 1));
}

#[test]
fn test_duplex_eviction() {
    let mut tracker: DuplexTracker = DuplexTracker::new();
    tracker.next("disk0", 1, 1);
    tracker.next("disk3", 1, 1);

    tracker.evict_missing(&HashSet::<&str>::new());
    assert!(tracker.is_empty());
}
