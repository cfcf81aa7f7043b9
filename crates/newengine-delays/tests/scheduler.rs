use std::cell::{Cell, RefCell};
use std::rc::Rc;

use newengine_delays::{Delay, DelayError, DelayKindId, DelayScheduler, DelaysConfig};
use proptest::prelude::*;

fn hit_counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    (hits, move || h.set(h.get() + 1))
}

fn schedule_noop(sched: &DelayScheduler, kind: DelayKindId) -> Result<(), DelayError> {
    let delay = match kind {
        DelayKindId::NextFrame => Delay::NextFrame { frames: 10 },
        DelayKindId::ForFrames => Delay::ForFrames { frames: 10 },
        DelayKindId::InSeconds => Delay::InSeconds { seconds: 10.0 },
        DelayKindId::ForSeconds => Delay::ForSeconds { seconds: 10.0 },
    };
    sched.schedule(delay, Some(Box::new(|| {})), false).map(|_| ())
}

#[test]
fn exhaustion_drops_only_the_overflowing_request() {
    let sched = DelayScheduler::new(DelaysConfig::uniform(4));

    for kind in DelayKindId::ALL {
        for _ in 0..4 {
            schedule_noop(&sched, kind).unwrap();
        }
        let err = schedule_noop(&sched, kind).unwrap_err();
        assert_eq!(err, DelayError::PoolExhausted { kind, capacity: 4 });
        assert_eq!(sched.active_count(kind), 4);
    }
    assert_eq!(sched.total_active(), 16);
}

#[test]
fn exhausted_pool_does_not_affect_existing_delays() {
    let sched = DelayScheduler::new(DelaysConfig::uniform(2));
    let (a, fa) = hit_counter();
    let (b, fb) = hit_counter();
    let (c, fc) = hit_counter();

    sched.run_in_next_frame(fa, 1, false).unwrap();
    sched.run_in_next_frame(fb, 1, false).unwrap();
    assert!(sched.run_in_next_frame(fc, 1, false).is_err());

    sched.advance(0.016);
    assert_eq!((a.get(), b.get(), c.get()), (1, 1, 0));
}

#[test]
fn next_frame_fires_after_exact_frame_count() {
    let sched = DelayScheduler::default();
    let (one, f1) = hit_counter();
    let (five, f5) = hit_counter();

    sched.run_in_next_frame(f1, 1, false).unwrap();
    sched.run_in_next_frame(f5, 5, false).unwrap();

    sched.advance(0.016);
    assert_eq!(one.get(), 1);

    for _ in 2..=4 {
        sched.advance(0.016);
        assert_eq!(five.get(), 0);
    }
    sched.advance(0.016);
    assert_eq!(five.get(), 1);

    sched.advance(0.016);
    assert_eq!((one.get(), five.get()), (1, 1));
    assert_eq!(sched.total_active(), 0);
}

#[test]
fn frame_kinds_ignore_dt() {
    let sched = DelayScheduler::default();
    let (hits, f) = hit_counter();
    sched.run_in_next_frame(f, 2, false).unwrap();

    sched.advance(100.0);
    assert_eq!(hits.get(), 0);
    sched.advance(0.0);
    assert_eq!(hits.get(), 1);
}

#[test]
fn for_frames_invokes_once_per_advance() {
    let sched = DelayScheduler::default();
    let (hits, f) = hit_counter();
    let h = sched.run_for_frames(f, 3, false).unwrap();

    for expected in 1..=3 {
        sched.advance(0.5);
        assert_eq!(hits.get(), expected);
    }
    assert!(!sched.is_scheduled(h));

    sched.advance(0.5);
    assert_eq!(hits.get(), 3);
}

#[test]
fn in_seconds_waits_for_accumulated_dt() {
    let sched = DelayScheduler::default();
    let (hits, f) = hit_counter();
    sched.run_in_seconds(f, 2.0, false).unwrap();

    for _ in 0..3 {
        sched.advance(0.5);
    }
    assert_eq!(hits.get(), 0);

    sched.advance(0.75);
    assert_eq!(hits.get(), 1);
    assert_eq!(sched.active_count(DelayKindId::InSeconds), 0);
}

#[test]
fn for_seconds_includes_crossing_advance() {
    let sched = DelayScheduler::default();
    let (hits, f) = hit_counter();
    sched.run_for_seconds(f, 1.0, false).unwrap();

    sched.advance(0.25);
    sched.advance(0.25);
    sched.advance(0.25);
    assert_eq!(hits.get(), 3);
    assert_eq!(sched.active_count(DelayKindId::ForSeconds), 1);

    sched.advance(0.5);
    assert_eq!(hits.get(), 4);
    assert_eq!(sched.active_count(DelayKindId::ForSeconds), 0);
}

#[test]
fn zero_durations_fire_on_next_advance() {
    let sched = DelayScheduler::default();
    let (frames, ff) = hit_counter();
    let (secs, fs) = hit_counter();

    sched.run_in_next_frame(ff, 0, false).unwrap();
    sched.run_in_seconds(fs, 0.0, false).unwrap();

    sched.advance(0.0);
    assert_eq!((frames.get(), secs.get()), (1, 1));
}

#[test]
fn non_positive_for_frames_still_invokes_once() {
    let sched = DelayScheduler::default();
    let (hits, f) = hit_counter();
    sched.run_for_frames(f, -3, false).unwrap();

    sched.advance(0.0);
    sched.advance(0.0);
    assert_eq!(hits.get(), 1);
}

#[test]
fn context_change_resets_only_non_persistent() {
    let sched = DelayScheduler::default();

    let scene: Vec<_> = (0..4).map(|_| hit_counter()).collect();
    let global: Vec<_> = (0..4).map(|_| hit_counter()).collect();
    let global_hits: Vec<Rc<Cell<u32>>> = global.iter().map(|(h, _)| h.clone()).collect();

    for (persist, counters) in [(false, scene), (true, global)] {
        let mut it = counters.into_iter().map(|(_, f)| f);
        sched.run_in_next_frame(it.next().unwrap(), 2, persist).unwrap();
        sched.run_for_frames(it.next().unwrap(), 2, persist).unwrap();
        sched.run_in_seconds(it.next().unwrap(), 1.0, persist).unwrap();
        sched.run_for_seconds(it.next().unwrap(), 1.0, persist).unwrap();
    }
    assert_eq!(sched.total_active(), 8);

    assert_eq!(sched.on_context_changed(), 4);
    assert_eq!(sched.total_active(), 4);

    sched.advance(0.5);
    sched.advance(0.5);

    let counts: Vec<u32> = global_hits.iter().map(|h| h.get()).collect();
    assert_eq!(counts, vec![1, 2, 1, 2]);
    assert_eq!(sched.total_active(), 0);
}

#[test]
fn reset_slot_never_runs_stale_callback() {
    let sched = DelayScheduler::new(DelaysConfig::uniform(1));
    let (stale, fs) = hit_counter();
    let (fresh, ff) = hit_counter();

    let old = sched.run_for_frames(fs, 5, false).unwrap();
    sched.on_context_changed();
    assert!(!sched.is_scheduled(old));

    sched.advance(0.0);
    assert_eq!(stale.get(), 0);

    let new = sched.run_for_frames(ff, 1, false).unwrap();
    assert_eq!(new.index, old.index);
    sched.advance(0.0);
    assert_eq!((stale.get(), fresh.get()), (0, 1));
}

#[test]
fn callback_scheduled_during_advance_waits_for_next_pass() {
    let sched = Rc::new(DelayScheduler::default());
    let log = Rc::new(RefCell::new(Vec::new()));

    let (s, l) = (sched.clone(), log.clone());
    sched
        .run_in_next_frame(
            move || {
                l.borrow_mut().push("outer");
                let l = l.clone();
                s.run_for_frames(move || l.borrow_mut().push("inner"), 2, false)
                    .unwrap();
            },
            1,
            false,
        )
        .unwrap();

    sched.advance(0.0);
    assert_eq!(*log.borrow(), vec!["outer"]);

    sched.advance(0.0);
    sched.advance(0.0);
    sched.advance(0.0);
    assert_eq!(*log.borrow(), vec!["outer", "inner", "inner"]);
}

#[test]
fn callback_can_reset_context_mid_advance() {
    let sched = Rc::new(DelayScheduler::default());
    let (victim, fv) = hit_counter();
    let (survivor, fsv) = hit_counter();

    let s = sched.clone();
    sched
        .run_in_next_frame(
            move || {
                s.on_context_changed();
            },
            1,
            true,
        )
        .unwrap();
    sched.run_for_frames(fv, 3, false).unwrap();
    sched.run_for_frames(fsv, 3, true).unwrap();

    sched.advance(0.0);
    // The next-frame pool is swept first, so the reset lands before the for-frames sweep.
    assert_eq!(victim.get(), 0);
    assert_eq!(survivor.get(), 1);
    assert_eq!(sched.active_count(DelayKindId::ForFrames), 1);
}

#[test]
fn repeating_callback_reset_by_itself_is_released() {
    let sched = Rc::new(DelayScheduler::default());
    let hits = Rc::new(Cell::new(0));

    let (s, h) = (sched.clone(), hits.clone());
    let handle = sched
        .run_for_seconds(
            move || {
                h.set(h.get() + 1);
                s.on_context_changed();
            },
            10.0,
            false,
        )
        .unwrap();

    sched.advance(0.1);
    assert_eq!(hits.get(), 1);
    assert!(!sched.is_scheduled(handle));

    sched.advance(0.1);
    assert_eq!(hits.get(), 1);
}

/// Schedules a follow-up next-frame delay when the owning callback is dropped.
struct RearmOnDrop {
    sched: Rc<DelayScheduler>,
    hits: Rc<Cell<u32>>,
}

impl Drop for RearmOnDrop {
    fn drop(&mut self) {
        let h = self.hits.clone();
        self.sched.next_frame(move || h.set(h.get() + 1)).unwrap();
    }
}

fn rearm_on_drop(sched: &Rc<DelayScheduler>) -> (Rc<Cell<u32>>, RearmOnDrop) {
    let hits = Rc::new(Cell::new(0));
    let guard = RearmOnDrop { sched: sched.clone(), hits: hits.clone() };
    (hits, guard)
}

#[test]
fn destructor_may_schedule_during_context_change() {
    let sched = Rc::new(DelayScheduler::new(DelaysConfig::uniform(2)));
    let (rearmed, guard) = rearm_on_drop(&sched);
    sched
        .run_in_seconds(
            move || {
                let _keep = &guard;
            },
            10.0,
            false,
        )
        .unwrap();

    assert_eq!(sched.on_context_changed(), 1);
    assert_eq!(sched.active_count(DelayKindId::InSeconds), 0);
    assert_eq!(sched.active_count(DelayKindId::NextFrame), 1);

    sched.advance(0.0);
    assert_eq!(rearmed.get(), 1);
}

#[test]
fn destructor_may_schedule_after_fire_once_expiry() {
    let sched = Rc::new(DelayScheduler::default());
    let (rearmed, guard) = rearm_on_drop(&sched);
    let (fired, mut f) = hit_counter();
    sched
        .run_in_next_frame(
            move || {
                let _keep = &guard;
                f();
            },
            1,
            false,
        )
        .unwrap();

    assert_eq!(sched.advance(0.0), 1);
    assert_eq!(fired.get(), 1);
    assert_eq!(rearmed.get(), 0);
    assert_eq!(sched.active_count(DelayKindId::NextFrame), 1);

    assert_eq!(sched.advance(0.0), 1);
    assert_eq!(rearmed.get(), 1);
    assert_eq!(sched.total_active(), 0);
}

#[test]
fn destructor_may_schedule_during_shutdown() {
    let sched = Rc::new(DelayScheduler::default());
    let (rearmed, guard) = rearm_on_drop(&sched);
    sched
        .run_for_frames(
            move || {
                let _keep = &guard;
            },
            100,
            true,
        )
        .unwrap();

    assert_eq!(sched.shutdown(), 1);
    assert_eq!(sched.active_count(DelayKindId::ForFrames), 0);
    assert_eq!(sched.active_count(DelayKindId::NextFrame), 1);

    sched.advance(0.0);
    assert_eq!(rearmed.get(), 1);
}

proptest! {
    #[test]
    fn capacity_bounds_every_kind(cap in 0usize..64, extra in 1usize..8) {
        let sched = DelayScheduler::new(DelaysConfig::uniform(cap));
        for kind in DelayKindId::ALL {
            let accepted = (0..cap + extra)
                .filter(|_| schedule_noop(&sched, kind).is_ok())
                .count();
            prop_assert_eq!(accepted, cap);
            prop_assert_eq!(sched.active_count(kind), cap);
        }
    }

    #[test]
    fn for_frames_fires_max_of_one_and_n(frames in -10i32..40) {
        let sched = DelayScheduler::default();
        let (hits, f) = hit_counter();
        sched.run_for_frames(f, frames, false).unwrap();

        for _ in 0..50 {
            sched.advance(0.016);
        }
        prop_assert_eq!(hits.get() as i32, frames.max(1));
    }

    #[test]
    fn next_frame_fires_exactly_once_at_frame_n(frames in -10i32..40) {
        let sched = DelayScheduler::default();
        let (hits, f) = hit_counter();
        sched.run_in_next_frame(f, frames, false).unwrap();

        let due = frames.max(1);
        for tick in 1..=50 {
            sched.advance(0.0);
            prop_assert_eq!(hits.get(), u32::from(tick >= due));
        }
    }
}
