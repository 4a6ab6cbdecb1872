//! Moment timing through a context with scripted ticks

use easy_logger::core::{SystemStopwatch, TickSource};
use easy_logger::{EasyLogError, LogContext};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Replays a fixed tick sequence, repeating the last tick once exhausted
struct ScriptedTicks {
    ticks: Vec<i64>,
    next: AtomicUsize,
}

impl TickSource for ScriptedTicks {
    fn now_ticks(&self) -> i64 {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.ticks.get(i).or(self.ticks.last()).copied().unwrap_or_default()
    }
}

fn scripted(ticks: &[i64]) -> LogContext {
    LogContext::with_sources(
        ScriptedTicks {
            ticks: ticks.to_vec(),
            next: AtomicUsize::new(0),
        },
        Arc::new(SystemStopwatch::new()),
    )
}

#[test]
fn three_marks_on_one_key() {
    let context = scripted(&[100, 150, 400]);
    for _ in 0..3 {
        context.mark_moment(Some("A"));
    }

    assert_eq!(context.get_moments("A", None).unwrap(), vec![100, 150, 400]);
    assert_eq!(context.get_intervals("A", None).unwrap(), vec![50, 250]);
    assert_eq!(context.get_intervals("A", Some(&[2])).unwrap(), vec![250]);
}

#[test]
fn index_zero_has_no_interval() {
    let context = scripted(&[100, 150, 400]);
    for _ in 0..3 {
        context.mark_moment(Some("A"));
    }
    assert!(context.get_intervals("A", Some(&[0])).unwrap().is_empty());
    assert_eq!(context.get_intervals("A", Some(&[0, 1, 7])).unwrap(), vec![50]);
}

#[test]
fn predicate_sees_tick_and_index() {
    let context = scripted(&[10, 20, 30, 40]);
    for _ in 0..4 {
        context.mark_moment(Some("A"));
    }
    let even_index = |_tick: i64, index: usize| index % 2 == 0;
    assert_eq!(context.get_moments("A", Some(&even_index)).unwrap(), vec![10, 30]);
    let late = |tick: i64, _index: usize| tick > 25;
    assert_eq!(context.get_moments("A", Some(&late)).unwrap(), vec![30, 40]);
}

#[test]
fn unknown_key_is_empty_and_blank_key_is_rejected() {
    let context = scripted(&[1]);
    assert!(context.get_moments("never-marked", None).unwrap().is_empty());
    assert!(context.get_intervals("never-marked", None).unwrap().is_empty());
    assert!(matches!(
        context.get_moments_by_indexes("  ", None),
        Err(EasyLogError::InvalidArgument(_))
    ));
}

#[test]
fn omitted_key_uses_the_call_site() {
    let context = scripted(&[5, 6]);
    let line = line!() + 1;
    context.mark_moment(None);

    let key = format!("{}: L{}", file!(), line);
    assert!(context.moment_keys().contains(&key), "{:?}", context.moment_keys());
    assert_eq!(context.get_moments(&key, None).unwrap(), vec![5]);
}

#[test]
fn blank_key_is_marked_under_the_call_site() {
    let context = scripted(&[7]);
    let line = line!() + 1;
    context.mark_moment(Some(" "));

    let key = format!("{}: L{}", file!(), line);
    assert!(!context.moment_keys().contains(" "));
    assert_eq!(context.get_moments(&key, None).unwrap(), vec![7]);
}

proptest! {
    #[test]
    fn positions_grow_by_one(count in 1usize..40) {
        let context = scripted(&[0]);
        for expected in 1..=count {
            prop_assert_eq!(context.mark_moment(Some("k")), expected);
        }
        prop_assert_eq!(context.get_moments("k", None).unwrap().len(), count);
    }

    #[test]
    fn intervals_are_consecutive_differences(
        mut ticks in prop::collection::vec(0i64..1_000_000, 1..30)
    ) {
        ticks.sort_unstable();
        let context = scripted(&ticks);
        for _ in 0..ticks.len() {
            context.mark_moment(Some("k"));
        }
        let moments = context.get_moments("k", None).unwrap();
        prop_assert_eq!(&moments, &ticks);

        let intervals = context.get_intervals("k", None).unwrap();
        let expected: Vec<i64> = moments.windows(2).map(|w| w[1] - w[0]).collect();
        prop_assert_eq!(intervals, expected);

        for i in 1..moments.len() {
            let at = context.get_moments_by_indexes("k", Some(&[i])).unwrap()[0];
            let before = context.get_moments_by_indexes("k", Some(&[i - 1])).unwrap()[0];
            prop_assert_eq!(context.get_intervals("k", Some(&[i])).unwrap(), vec![at - before]);
        }
    }
}
