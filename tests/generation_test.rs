//! Stale-load discard semantics: only the newest dispatched load may attach,
//! and nothing may attach after dispose.

use verseview::viewer::LoadTracker;

#[test]
fn single_load_completes() {
    let mut tracker = LoadTracker::new();
    let generation = tracker.begin();
    assert!(tracker.is_current(generation));
}

#[test]
fn rapid_switches_keep_only_the_last_request() {
    let mut tracker = LoadTracker::new();
    // user clicks through three models before any load finishes
    let first = tracker.begin();
    let second = tracker.begin();
    let third = tracker.begin();

    // completions arrive out of dispatch order
    assert!(!tracker.is_current(second));
    assert!(!tracker.is_current(first));
    assert!(tracker.is_current(third));
}

#[test]
fn completion_after_dispose_is_discarded() {
    let mut tracker = LoadTracker::new();
    let in_flight = tracker.begin();
    tracker.dispose();
    assert!(!tracker.is_current(in_flight));
}

#[test]
fn dispose_is_permanent() {
    let mut tracker = LoadTracker::new();
    tracker.dispose();
    let generation = tracker.begin();
    assert!(!tracker.is_current(generation));
}

#[test]
fn generations_are_monotonic() {
    let mut tracker = LoadTracker::new();
    let mut previous = tracker.begin();
    for _ in 0..100 {
        let next = tracker.begin();
        assert!(next > previous);
        previous = next;
    }
}
